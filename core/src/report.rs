//! Report engine: builds the monthly P&L for a fiscal term and division.
//!
//! PIPELINE (fixed, one direction):
//!   1. Fiscal calendar   → months and calendar years of the term
//!   2. Aggregate fetcher → sales and expense lookups (summed across
//!                          divisions for the all-divisions view)
//!   3. P&L builder       → absolute rows and 合計
//!   4. Ratio rows        → percentage-of-revenue rows spliced in
//!   5. Target comparator → formatted, flag-annotated display table
//!
//! RULES:
//!   - The engine only reads. Nothing here writes to the store.
//!   - No step fails: fetch errors become empty input and an all-zero table.

use crate::{
    config::KanriConfig,
    fetcher::{AggregateFetcher, AggregateKind, AggregateSource},
    fiscal::{months_in_term, term_years, FiscalCalendar, FiscalTerm},
    pnl::{build_pl_rows, PlTable},
    ratios::insert_ratio_rows,
    targets::{annotate, DisplayTable, TargetRatio},
    types::DivisionScope,
};
use serde::{Deserialize, Serialize};

/// Everything the presentation layer needs to render one P&L view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlReport {
    pub term:    FiscalTerm,
    pub scope:   DivisionScope,
    pub table:   PlTable,
    pub display: DisplayTable,
    pub target:  Option<TargetRatio>,
}

impl PlReport {
    /// False when every amount is zero; the renderer shows "no data".
    pub fn has_data(&self) -> bool {
        self.table.has_data()
    }
}

pub struct ReportEngine<'a, S: AggregateSource + ?Sized> {
    fetcher:    AggregateFetcher<'a, S>,
    calendar:   FiscalCalendar,
    all_label:  String,
}

impl<'a, S: AggregateSource + ?Sized> ReportEngine<'a, S> {
    pub fn new(source: &'a S, calendar: FiscalCalendar, page_size: usize, all_label: &str) -> Self {
        Self {
            fetcher: AggregateFetcher::with_page_size(source, page_size),
            calendar,
            all_label: all_label.to_string(),
        }
    }

    /// Build a fully wired engine from config.
    pub fn from_config(source: &'a S, config: &KanriConfig) -> crate::error::KanriResult<Self> {
        Ok(Self::new(
            source,
            FiscalCalendar::from_config(config)?,
            config.page_size,
            &config.all_divisions_label,
        ))
    }

    pub fn calendar(&self) -> &FiscalCalendar {
        &self.calendar
    }

    pub fn fetcher(&self) -> &AggregateFetcher<'a, S> {
        &self.fetcher
    }

    pub fn all_label(&self) -> &str {
        &self.all_label
    }

    /// Scope for a division name as picked in the UI.
    pub fn scope_for(&self, division: &str) -> DivisionScope {
        DivisionScope::from_name(division, &self.all_label)
    }

    /// Monthly P&L for `term` and `division`, ready for rendering.
    pub fn build_pl_table(&self, term: &FiscalTerm, division: &DivisionScope) -> PlReport {
        let months = months_in_term(term);
        let years = term_years(term);

        let sales = self.fetcher.fetch_map(AggregateKind::Sales, &years, division);
        let expenses = self.fetcher.fetch_map(AggregateKind::Expense, &years, division);

        let mut table = build_pl_rows(&months, &sales, &expenses);
        insert_ratio_rows(&mut table);

        let target_division = match division {
            DivisionScope::All => self.all_label.as_str(),
            DivisionScope::Single(name) => name.as_str(),
        };
        let target = self.fetcher.fetch_target_ratio(target_division);
        let display = annotate(&table, target.as_ref());

        log::info!(
            "{} {}: {} sales keys, {} expense keys, {} flagged cells",
            term.label,
            target_division,
            sales.len(),
            expenses.len(),
            display.flagged_count()
        );

        PlReport {
            term: term.clone(),
            scope: division.clone(),
            table,
            display,
            target,
        }
    }
}
