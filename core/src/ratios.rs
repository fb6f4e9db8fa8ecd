//! Ratio rows: percentage-of-revenue lines spliced into the P&L table.

use crate::pnl::{PlLine, PlRow, PlTable};
use std::collections::BTreeMap;

/// A ratio row: the sum of `numerators` over 総売上, placed directly after
/// `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioRule {
    pub line:       PlLine,
    pub numerators: &'static [PlLine],
    pub anchor:     PlLine,
}

/// Applied in this order; FL and FLR anchor on ratio rows inserted earlier.
pub const RATIO_ROWS: [RatioRule; 9] = [
    RatioRule { line: PlLine::CostRatio,       numerators: &[PlLine::CostOfGoods],                               anchor: PlLine::CostOfGoods },
    RatioRule { line: PlLine::LaborRatio,      numerators: &[PlLine::Labor],                                     anchor: PlLine::Labor },
    RatioRule { line: PlLine::FlRatio,         numerators: &[PlLine::CostOfGoods, PlLine::Labor],                anchor: PlLine::LaborRatio },
    RatioRule { line: PlLine::UtilitiesRatio,  numerators: &[PlLine::Utilities],                                 anchor: PlLine::Utilities },
    RatioRule { line: PlLine::MiscRatio,       numerators: &[PlLine::Misc],                                      anchor: PlLine::Misc },
    RatioRule { line: PlLine::OtherFixedRatio, numerators: &[PlLine::OtherFixed],                                anchor: PlLine::OtherFixed },
    RatioRule { line: PlLine::RentRatio,       numerators: &[PlLine::Rent],                                      anchor: PlLine::Rent },
    RatioRule { line: PlLine::FlrRatio,        numerators: &[PlLine::CostOfGoods, PlLine::Labor, PlLine::Rent],  anchor: PlLine::RentRatio },
    RatioRule { line: PlLine::OperatingMargin, numerators: &[PlLine::OperatingProfit],                           anchor: PlLine::OperatingProfit },
];

/// `numerator / revenue`, or 0 when there is no revenue.
pub fn ratio(numerator: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        numerator / revenue
    }
}

/// Compute one ratio row from the table's absolute rows.
pub fn ratio_row(table: &PlTable, rule: &RatioRule) -> PlRow {
    let revenue = table.row(PlLine::GrossRevenue);
    let numerator_rows: Vec<&PlRow> = rule
        .numerators
        .iter()
        .filter_map(|line| table.row(*line))
        .collect();

    let values: BTreeMap<_, _> = table
        .months
        .iter()
        .map(|m| {
            let num: f64 = numerator_rows.iter().map(|r| r.value(*m)).sum();
            let rev = revenue.map(|r| r.value(*m)).unwrap_or(0.0);
            (*m, ratio(num, rev))
        })
        .collect();

    // 合計 is the ratio of the totals, not a sum of monthly ratios.
    let total_num: f64 = numerator_rows.iter().map(|r| r.total).sum();
    let total_rev = revenue.map(|r| r.total).unwrap_or(0.0);

    PlRow::new(rule.line, values, ratio(total_num, total_rev))
}

/// Splice every ratio row in `RATIO_ROWS` after its anchor.
pub fn insert_ratio_rows(table: &mut PlTable) {
    for rule in &RATIO_ROWS {
        let row = ratio_row(table, rule);
        match table.position(rule.anchor) {
            Some(i) => table.rows.insert(i + 1, row),
            None => {
                log::warn!(
                    "ratio row {} has no anchor {}, appending",
                    rule.line.label(),
                    rule.anchor.label()
                );
                table.rows.push(row);
            }
        }
    }
}
