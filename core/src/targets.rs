//! Target comparator: formats the P&L table for display and flags cells
//! that need attention: ratios above their division's target and negative
//! amounts.

use crate::{
    format::{format_cell, parse_percent, parse_yen},
    pnl::{PlLine, PlTable, TOTAL_LABEL},
    types::CostCategory,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-division target ratios, in percent. Zero means "no target".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRatio {
    pub division:         String,
    pub cost_rate:        f64,
    pub labor_rate:       f64,
    pub fl_rate:          f64,
    pub utility_rate:     f64,
    pub misc_rate:        f64,
    pub other_fixed_rate: f64,
    pub rent_rate:        f64,
    pub flr_rate:         f64,
    pub op_profit_rate:   f64,
}

impl TargetRatio {
    /// Target for a ratio row of the P&L table.
    pub fn threshold(&self, line: PlLine) -> Option<f64> {
        let rate = match line {
            PlLine::CostRatio       => self.cost_rate,
            PlLine::LaborRatio      => self.labor_rate,
            PlLine::FlRatio         => self.fl_rate,
            PlLine::UtilitiesRatio  => self.utility_rate,
            PlLine::MiscRatio       => self.misc_rate,
            PlLine::OtherFixedRatio => self.other_fixed_rate,
            PlLine::RentRatio       => self.rent_rate,
            PlLine::FlrRatio        => self.flr_rate,
            PlLine::OperatingMargin => self.op_profit_rate,
            _ => return None,
        };
        Some(rate)
    }

    /// Target for an expense category on the trend charts.
    pub fn category_rate(&self, category: &str) -> Option<f64> {
        if category == "営業利益" {
            return Some(self.op_profit_rate);
        }
        let rate = match CostCategory::from_key(category)? {
            CostCategory::CostOfGoods => self.cost_rate,
            CostCategory::Labor       => self.labor_rate,
            CostCategory::Utilities   => self.utility_rate,
            CostCategory::Misc        => self.misc_rate,
            CostCategory::OtherFixed  => self.other_fixed_rate,
            CostCategory::Rent        => self.rent_rate,
            _ => return None,
        };
        Some(rate)
    }
}

/// Ratio-row thresholds for the selected division. Empty when the division
/// has no targets, so nothing is flagged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds(HashMap<PlLine, f64>);

impl Thresholds {
    pub fn from_target(target: Option<&TargetRatio>) -> Self {
        let map = match target {
            Some(t) => crate::ratios::RATIO_ROWS
                .iter()
                .filter_map(|rule| t.threshold(rule.line).map(|v| (rule.line, v)))
                .collect(),
            None => HashMap::new(),
        };
        Self(map)
    }

    pub fn get(&self, line: PlLine) -> Option<f64> {
        self.0.get(&line).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Row-level emphasis used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowEmphasis {
    Plain,
    Highlight,
    Warning,
}

impl RowEmphasis {
    pub fn for_line(line: PlLine) -> Self {
        match line {
            PlLine::GrossRevenue => RowEmphasis::Highlight,
            PlLine::CostRatio
            | PlLine::LaborRatio
            | PlLine::FlRatio
            | PlLine::UtilitiesRatio
            | PlLine::MiscRatio
            | PlLine::OtherFixedRatio
            | PlLine::RentRatio
            | PlLine::FlrRatio => RowEmphasis::Warning,
            _ => RowEmphasis::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayCell {
    pub text:    String,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub line:     PlLine,
    pub label:    String,
    pub emphasis: RowEmphasis,
    pub total:    DisplayCell,
    pub cells:    Vec<DisplayCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTable {
    /// `合計` followed by the months as `YYYY-MM`.
    pub columns: Vec<String>,
    pub rows:    Vec<DisplayRow>,
}

impl DisplayTable {
    pub fn row(&self, line: PlLine) -> Option<&DisplayRow> {
        self.rows.iter().find(|r| r.line == line)
    }

    pub fn flagged_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| std::iter::once(&r.total).chain(r.cells.iter()))
            .filter(|c| c.flagged)
            .count()
    }
}

/// Whether a formatted cell should be highlighted.
///
/// Ratio rows compare the displayed percentage against a positive target;
/// amount rows flag negative values. The 合計 column follows the same rule.
pub fn cell_flagged(line: PlLine, text: &str, thresholds: &Thresholds) -> bool {
    if line.is_ratio() {
        match (parse_percent(text), thresholds.get(line)) {
            (Some(pct), Some(threshold)) => threshold > 0.0 && pct > threshold,
            _ => false,
        }
    } else {
        parse_yen(text).map(|amount| amount < 0.0).unwrap_or(false)
    }
}

fn display_cell(line: PlLine, value: Option<f64>, thresholds: &Thresholds) -> DisplayCell {
    let text = format_cell(line, value);
    let flagged = cell_flagged(line, &text, thresholds);
    DisplayCell { text, flagged }
}

/// Format every cell of `table` and flag it against `target`.
pub fn annotate(table: &PlTable, target: Option<&TargetRatio>) -> DisplayTable {
    let thresholds = Thresholds::from_target(target);

    let mut columns = vec![TOTAL_LABEL.to_string()];
    columns.extend(table.months.iter().map(|m| m.to_string()));

    let rows = table
        .rows
        .iter()
        .map(|row| DisplayRow {
            line: row.line,
            label: row.label.clone(),
            emphasis: RowEmphasis::for_line(row.line),
            total: display_cell(row.line, Some(row.total), &thresholds),
            cells: table
                .months
                .iter()
                .map(|m| display_cell(row.line, row.values.get(m).copied(), &thresholds))
                .collect(),
        })
        .collect();

    DisplayTable { columns, rows }
}
