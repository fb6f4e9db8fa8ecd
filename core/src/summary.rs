//! Monthly income/expense summary for one division.

use crate::{error::KanriResult, store::LedgerStore, types::TaxBucket};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SALES_TOTAL_LABEL: &str = "入金合計";
pub const VARIABLE_TOTAL_LABEL: &str = "合計（変動費）";
pub const FIXED_TOTAL_LABEL: &str = "合計（固定費）";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAmount {
    pub label:  String,
    pub amount: f64,
}

impl LineAmount {
    fn new(label: &str, amount: f64) -> Self {
        Self { label: label.to_string(), amount }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    /// One line per tax bucket, in bucket order.
    pub buckets: Vec<LineAmount>,
    pub total:   f64,
}

impl SalesSummary {
    /// Bucket lines followed by the 入金合計 line.
    pub fn lines(&self) -> Vec<LineAmount> {
        let mut lines = self.buckets.clone();
        lines.push(LineAmount::new(SALES_TOTAL_LABEL, self.total));
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub variable:       Vec<LineAmount>,
    pub variable_total: f64,
    pub fixed:          Vec<LineAmount>,
    pub fixed_total:    f64,
}

impl ExpenseSummary {
    pub fn variable_lines(&self) -> Vec<LineAmount> {
        let mut lines = self.variable.clone();
        lines.push(LineAmount::new(VARIABLE_TOTAL_LABEL, self.variable_total));
        lines
    }

    pub fn fixed_lines(&self) -> Vec<LineAmount> {
        let mut lines = self.fixed.clone();
        lines.push(LineAmount::new(FIXED_TOTAL_LABEL, self.fixed_total));
        lines
    }
}

/// Per-bucket sales. `None` when nothing was received this month.
pub fn summarize_sales(totals: &BTreeMap<String, f64>) -> Option<SalesSummary> {
    let buckets: Vec<LineAmount> = TaxBucket::ALL
        .iter()
        .map(|b| LineAmount::new(b.key(), totals.get(b.key()).copied().unwrap_or(0.0)))
        .collect();
    let total: f64 = buckets.iter().map(|l| l.amount).sum();
    if total > 0.0 {
        Some(SalesSummary { buckets, total })
    } else {
        None
    }
}

/// Expenses split into variable and fixed categories, each in registration
/// order. Categories without a total are left out. `None` when there are
/// no totals at all.
pub fn summarize_expenses(
    totals: &BTreeMap<String, f64>,
    variable_categories: &[String],
    fixed_categories: &[String],
) -> Option<ExpenseSummary> {
    if totals.is_empty() {
        return None;
    }
    let pick = |categories: &[String]| -> Vec<LineAmount> {
        categories
            .iter()
            .filter_map(|c| totals.get(c).map(|v| LineAmount::new(c, *v)))
            .collect()
    };
    let variable = pick(variable_categories);
    let fixed = pick(fixed_categories);
    Some(ExpenseSummary {
        variable_total: variable.iter().map(|l| l.amount).sum(),
        fixed_total: fixed.iter().map(|l| l.amount).sum(),
        variable,
        fixed,
    })
}

pub fn month_sales_summary(
    store: &LedgerStore,
    year: i32,
    month: u32,
    division: &str,
) -> KanriResult<Option<SalesSummary>> {
    let totals = store.sales_totals_for_month(year, month, division)?;
    Ok(summarize_sales(&totals))
}

pub fn month_expense_summary(
    store: &LedgerStore,
    year: i32,
    month: u32,
    division: &str,
) -> KanriResult<Option<ExpenseSummary>> {
    let totals = store.expense_totals_for_month(year, month, division)?;
    let variable = store.variable_expense_categories()?;
    let fixed = store.fixed_expense_categories()?;
    Ok(summarize_expenses(&totals, &variable, &fixed))
}
