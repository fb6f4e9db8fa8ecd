//! Trend analysis: monthly sales and per-category expense series for a
//! period, with target amounts derived from each month's sales.
//!
//! Only months that actually have totals produce points. Every division is
//! fetched in one pass and split in memory; the all-divisions label sums
//! them.

use crate::{
    error::KanriResult,
    fetcher::{AggregateFetcher, AggregateKind, AggregateSource},
    fiscal::{DateRange, FiscalCalendar},
    store::CategoryAggregate,
    targets::TargetRatio,
    types::{DivisionScope, MonthKey},
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodOption {
    /// 今期
    CurrentTerm,
    /// 先期
    PreviousTerm,
    Custom(DateRange),
}

/// Date range for a period choice as of `today`.
pub fn resolve_period(option: PeriodOption, calendar: &FiscalCalendar, today: NaiveDate) -> DateRange {
    match option {
        PeriodOption::CurrentTerm => calendar.current_period(today),
        PeriodOption::PreviousTerm => calendar.previous_period(today),
        PeriodOption::Custom(range) => range,
    }
}

/// Calendar years to request for `range`, from the year before it opens.
pub fn fetch_years(range: &DateRange) -> Vec<i32> {
    (range.start.year() - 1..=range.end.year()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub month: MonthKey,
    /// `YYYY / MM`
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTrend {
    pub category: String,
    pub actual:   Vec<SeriesPoint>,
    /// Same months as `actual`: that month's sales × target rate / 100.
    pub target:   Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionTrend {
    pub division:   String,
    pub sales:      Vec<SeriesPoint>,
    pub categories: Vec<CategoryTrend>,
}

impl DivisionTrend {
    pub fn category(&self, name: &str) -> Option<&CategoryTrend> {
        self.categories.iter().find(|c| c.category == name)
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.categories.is_empty()
    }
}

fn point(month: MonthKey, value: f64) -> SeriesPoint {
    SeriesPoint { month, label: month.axis_label(), value }
}

fn in_scope<'r>(
    rows: &'r [CategoryAggregate],
    scope: &'r DivisionScope,
    range: &'r DateRange,
) -> impl Iterator<Item = &'r CategoryAggregate> + 'r {
    rows.iter().filter(move |r| {
        let division_ok = match scope.filter() {
            Some(name) => r.division == name,
            None => true,
        };
        division_ok && range.contains_month(r.month_key())
    })
}

/// Build one division's trend from raw rows covering every division.
///
/// `categories` gives the display order; categories without rows in the
/// period are skipped. Without a target, target amounts are zero.
pub fn division_trend(
    division: &str,
    scope: &DivisionScope,
    range: &DateRange,
    sales_rows: &[CategoryAggregate],
    expense_rows: &[CategoryAggregate],
    categories: &[String],
    target: Option<&TargetRatio>,
) -> DivisionTrend {
    let mut monthly_sales: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for row in in_scope(sales_rows, scope, range) {
        *monthly_sales.entry(row.month_key()).or_insert(0.0) += row.amount;
    }

    let mut by_category: BTreeMap<&str, BTreeMap<MonthKey, f64>> = BTreeMap::new();
    for row in in_scope(expense_rows, scope, range) {
        *by_category
            .entry(row.key.as_str())
            .or_default()
            .entry(row.month_key())
            .or_insert(0.0) += row.amount;
    }

    let category_trends = categories
        .iter()
        .filter_map(|category| {
            let series = by_category.get(category.as_str())?;
            let rate = target
                .and_then(|t| t.category_rate(category))
                .unwrap_or(0.0)
                / 100.0;
            Some(CategoryTrend {
                category: category.clone(),
                actual: series.iter().map(|(m, v)| point(*m, *v)).collect(),
                target: series
                    .keys()
                    .map(|m| point(*m, monthly_sales.get(m).copied().unwrap_or(0.0) * rate))
                    .collect(),
            })
        })
        .collect();

    DivisionTrend {
        division: division.to_string(),
        sales: monthly_sales.into_iter().map(|(m, v)| point(m, v)).collect(),
        categories: category_trends,
    }
}

/// Reads the period's totals once and builds a trend per division.
pub struct TrendAnalyzer<'a, S: AggregateSource + ?Sized> {
    fetcher:   AggregateFetcher<'a, S>,
    all_label: String,
}

impl<'a, S: AggregateSource + ?Sized> TrendAnalyzer<'a, S> {
    pub fn new(source: &'a S, page_size: usize, all_label: &str) -> Self {
        Self {
            fetcher: AggregateFetcher::with_page_size(source, page_size),
            all_label: all_label.to_string(),
        }
    }

    /// One trend per entry of `divisions`, in that order.
    pub fn trends(
        &self,
        range: &DateRange,
        divisions: &[String],
        categories: &[String],
    ) -> KanriResult<Vec<DivisionTrend>> {
        if range.start > range.end {
            return Err(anyhow::anyhow!("period starts {} after it ends {}", range.start, range.end).into());
        }
        let years = fetch_years(range);
        let sales = self.fetcher.fetch_totals(AggregateKind::Sales, &years, &DivisionScope::All);
        let expenses = self.fetcher.fetch_totals(AggregateKind::Expense, &years, &DivisionScope::All);

        let trends: Vec<DivisionTrend> = divisions
            .iter()
            .map(|division| {
                let scope = DivisionScope::from_name(division, &self.all_label);
                let target = self.fetcher.fetch_target_ratio(division);
                division_trend(division, &scope, range, &sales, &expenses, categories, target.as_ref())
            })
            .collect();

        log::info!(
            "trends {}..{}: {} divisions from {} sales and {} expense rows",
            range.start,
            range.end,
            trends.len(),
            sales.len(),
            expenses.len()
        );
        Ok(trends)
    }
}
