//! P&L builder: folds monthly aggregates into the fixed-schema
//! profit-and-loss table.
//!
//! Each month is computed independently from its sales buckets and expense
//! categories; the 合計 column is the sum over the term's months.
//! Row order is the `PlLine::BASE` constant; ratio rows are spliced in
//! afterwards by `ratios::insert_ratio_rows`.

use crate::{
    fetcher::AggregateMap,
    types::{CostCategory, MonthKey, TaxBucket},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Divisor isolating tax embedded in standard-rate (10%) amounts.
pub const STANDARD_TAX_DIVISOR: f64 = 1.10;
/// Divisor isolating tax embedded in reduced-rate (8%) amounts.
pub const REDUCED_TAX_DIVISOR: f64 = 1.08;
/// Effective corporate tax rate applied to positive operating profit.
pub const CORPORATE_TAX_RATE: f64 = 0.3358;

pub const TOTAL_LABEL: &str = "合計";

/// Every row the P&L table can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlLine {
    Sales10,
    Sales8,
    OtherSales10,
    OtherSales8,
    GrossRevenue,
    CostOfGoods,
    GrossProfit,
    Labor,
    Utilities,
    Misc,
    Extraordinary,
    OtherFixed,
    Rent,
    Advertising,
    LoanInterest,
    OperatingProfit,
    ConsumptionTax,
    CorporateTax,
    LoanPrincipal,
    RetainedEarnings,
    // Ratio rows
    CostRatio,
    LaborRatio,
    FlRatio,
    UtilitiesRatio,
    MiscRatio,
    OtherFixedRatio,
    RentRatio,
    FlrRatio,
    OperatingMargin,
}

impl PlLine {
    /// Absolute rows in display order, before ratio rows are inserted.
    pub const BASE: [PlLine; 20] = [
        PlLine::Sales10,
        PlLine::Sales8,
        PlLine::OtherSales10,
        PlLine::OtherSales8,
        PlLine::GrossRevenue,
        PlLine::CostOfGoods,
        PlLine::GrossProfit,
        PlLine::Labor,
        PlLine::Utilities,
        PlLine::Misc,
        PlLine::Extraordinary,
        PlLine::OtherFixed,
        PlLine::Rent,
        PlLine::Advertising,
        PlLine::LoanInterest,
        PlLine::OperatingProfit,
        PlLine::ConsumptionTax,
        PlLine::CorporateTax,
        PlLine::LoanPrincipal,
        PlLine::RetainedEarnings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlLine::Sales10          => "売上（税率10%）",
            PlLine::Sales8           => "売上（税率8%）",
            PlLine::OtherSales10     => "その他売上（税率10%）",
            PlLine::OtherSales8      => "その他売上（税率8%）",
            PlLine::GrossRevenue     => "総売上",
            PlLine::CostOfGoods      => "原価",
            PlLine::GrossProfit      => "売上総利益",
            PlLine::Labor            => "人件費",
            PlLine::Utilities        => "水道光熱費",
            PlLine::Misc             => "消耗品費・その他諸経費",
            PlLine::Extraordinary    => "臨時諸経費",
            PlLine::OtherFixed       => "その他固定費",
            PlLine::Rent             => "家賃",
            PlLine::Advertising      => "広告費",
            PlLine::LoanInterest     => "融資返済利息",
            PlLine::OperatingProfit  => "営業利益",
            PlLine::ConsumptionTax   => "消費税額",
            PlLine::CorporateTax     => "法人税額",
            PlLine::LoanPrincipal    => "融資返済元金",
            PlLine::RetainedEarnings => "内部留保",
            PlLine::CostRatio        => "原価率",
            PlLine::LaborRatio       => "人件費率",
            PlLine::FlRatio          => "FL比率",
            PlLine::UtilitiesRatio   => "水道光熱費率",
            PlLine::MiscRatio        => "消耗品・その他諸経費率",
            PlLine::OtherFixedRatio  => "その他固定費率",
            PlLine::RentRatio        => "家賃率",
            PlLine::FlrRatio         => "FLR比率",
            PlLine::OperatingMargin  => "営業利益率",
        }
    }

    /// Ratio rows hold a fraction of 総売上 rather than an amount.
    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            PlLine::CostRatio
                | PlLine::LaborRatio
                | PlLine::FlRatio
                | PlLine::UtilitiesRatio
                | PlLine::MiscRatio
                | PlLine::OtherFixedRatio
                | PlLine::RentRatio
                | PlLine::FlrRatio
                | PlLine::OperatingMargin
        )
    }
}

/// Raw inputs for one month, read from the aggregate lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyInputs {
    pub sales10:        f64,
    pub sales8:         f64,
    pub other_sales10:  f64,
    pub other_sales8:   f64,
    pub cost_of_goods:  f64,
    pub labor:          f64,
    pub utilities:      f64,
    pub misc:           f64,
    pub extraordinary:  f64,
    pub other_fixed:    f64,
    pub rent:           f64,
    pub advertising:    f64,
    pub loan_interest:  f64,
    pub loan_principal: f64,
}

impl MonthlyInputs {
    pub fn from_aggregates(month: MonthKey, sales: &AggregateMap, expenses: &AggregateMap) -> Self {
        let s = |b: TaxBucket| sales.get(month, b.key());
        let e = |c: CostCategory| expenses.get(month, c.key());
        Self {
            sales10:        s(TaxBucket::Standard10),
            sales8:         s(TaxBucket::Standard8),
            other_sales10:  s(TaxBucket::Other10),
            other_sales8:   s(TaxBucket::Other8),
            cost_of_goods:  e(CostCategory::CostOfGoods),
            labor:          e(CostCategory::Labor),
            utilities:      e(CostCategory::Utilities),
            misc:           e(CostCategory::Misc),
            extraordinary:  e(CostCategory::Extraordinary),
            other_fixed:    e(CostCategory::OtherFixed),
            rent:           e(CostCategory::Rent),
            advertising:    e(CostCategory::Advertising),
            loan_interest:  e(CostCategory::LoanInterest),
            loan_principal: e(CostCategory::LoanPrincipal),
        }
    }

    /// Expenses carrying standard-rate tax that the consumption-tax
    /// calculation credits back.
    fn standard_rate_expenses(&self) -> f64 {
        self.utilities + self.misc + self.extraordinary + self.other_fixed + self.rent + self.advertising
    }
}

/// Inputs plus every derived figure for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFigures {
    pub inputs:            MonthlyInputs,
    pub gross_revenue:     f64,
    pub gross_profit:      f64,
    pub operating_profit:  f64,
    pub consumption_tax:   f64,
    pub corporate_tax:     f64,
    pub retained_earnings: f64,
}

impl MonthlyFigures {
    pub fn value(&self, line: PlLine) -> Option<f64> {
        let i = &self.inputs;
        let v = match line {
            PlLine::Sales10          => i.sales10,
            PlLine::Sales8           => i.sales8,
            PlLine::OtherSales10     => i.other_sales10,
            PlLine::OtherSales8      => i.other_sales8,
            PlLine::GrossRevenue     => self.gross_revenue,
            PlLine::CostOfGoods      => i.cost_of_goods,
            PlLine::GrossProfit      => self.gross_profit,
            PlLine::Labor            => i.labor,
            PlLine::Utilities        => i.utilities,
            PlLine::Misc             => i.misc,
            PlLine::Extraordinary    => i.extraordinary,
            PlLine::OtherFixed       => i.other_fixed,
            PlLine::Rent             => i.rent,
            PlLine::Advertising      => i.advertising,
            PlLine::LoanInterest     => i.loan_interest,
            PlLine::OperatingProfit  => self.operating_profit,
            PlLine::ConsumptionTax   => self.consumption_tax,
            PlLine::CorporateTax     => self.corporate_tax,
            PlLine::LoanPrincipal    => i.loan_principal,
            PlLine::RetainedEarnings => self.retained_earnings,
            _ => return None,
        };
        Some(v)
    }
}

pub fn gross_revenue(i: &MonthlyInputs) -> f64 {
    i.sales10 + i.sales8 + i.other_sales10 + i.other_sales8
}

/// Tax embedded in a tax-inclusive amount.
fn embedded_tax(amount: f64, divisor: f64) -> f64 {
    amount - amount / divisor
}

/// Tax collected on sales minus tax paid on cost of goods (reduced rate)
/// and on standard-rate expenses.
pub fn consumption_tax(i: &MonthlyInputs) -> f64 {
    embedded_tax(i.sales10 + i.other_sales10, STANDARD_TAX_DIVISOR)
        + embedded_tax(i.sales8 + i.other_sales8, REDUCED_TAX_DIVISOR)
        - embedded_tax(i.cost_of_goods, REDUCED_TAX_DIVISOR)
        - embedded_tax(i.standard_rate_expenses(), STANDARD_TAX_DIVISOR)
}

pub fn corporate_tax(operating_profit: f64) -> f64 {
    if operating_profit > 0.0 {
        operating_profit * CORPORATE_TAX_RATE
    } else {
        0.0
    }
}

pub fn compute_month(inputs: MonthlyInputs) -> MonthlyFigures {
    let i = &inputs;
    let gross_revenue = gross_revenue(i);
    let gross_profit = gross_revenue - i.cost_of_goods;
    let operating_profit = gross_profit
        - i.labor
        - i.utilities
        - i.misc
        - i.extraordinary
        - i.other_fixed
        - i.rent
        - i.advertising
        - i.loan_interest;
    let consumption_tax = consumption_tax(i);
    let corporate_tax = corporate_tax(operating_profit);
    let retained_earnings = operating_profit - consumption_tax - corporate_tax - i.loan_principal;

    MonthlyFigures {
        inputs,
        gross_revenue,
        gross_profit,
        operating_profit,
        consumption_tax,
        corporate_tax,
        retained_earnings,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlRow {
    pub line:   PlLine,
    pub label:  String,
    pub values: BTreeMap<MonthKey, f64>,
    pub total:  f64,
}

impl PlRow {
    pub fn new(line: PlLine, values: BTreeMap<MonthKey, f64>, total: f64) -> Self {
        Self {
            line,
            label: line.label().to_string(),
            values,
            total,
        }
    }

    pub fn value(&self, month: MonthKey) -> f64 {
        self.values.get(&month).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlTable {
    pub months: Vec<MonthKey>,
    pub rows:   Vec<PlRow>,
}

impl PlTable {
    pub fn row(&self, line: PlLine) -> Option<&PlRow> {
        self.rows.iter().find(|r| r.line == line)
    }

    pub fn position(&self, line: PlLine) -> Option<usize> {
        self.rows.iter().position(|r| r.line == line)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// True when any absolute row carries a non-zero amount.
    pub fn has_data(&self) -> bool {
        self.rows
            .iter()
            .filter(|r| !r.line.is_ratio())
            .any(|r| r.values.values().any(|v| *v != 0.0))
    }
}

/// Build the absolute rows for `months`. Missing aggregates read as zero,
/// so empty input yields an all-zero table.
pub fn build_pl_rows(months: &[MonthKey], sales: &AggregateMap, expenses: &AggregateMap) -> PlTable {
    let figures: Vec<(MonthKey, MonthlyFigures)> = months
        .iter()
        .map(|m| (*m, compute_month(MonthlyInputs::from_aggregates(*m, sales, expenses))))
        .collect();

    let rows = PlLine::BASE
        .iter()
        .map(|line| {
            let values: BTreeMap<MonthKey, f64> = figures
                .iter()
                .map(|(m, f)| (*m, f.value(*line).unwrap_or(0.0)))
                .collect();
            let total = values.values().sum();
            PlRow::new(*line, values, total)
        })
        .collect();

    PlTable {
        months: months.to_vec(),
        rows,
    }
}
