//! Aggregate fetcher: reads monthly totals from the store in pages and
//! folds them into lookups keyed by (month, tax bucket or category).
//!
//! RULES:
//!   - A failed fetch degrades to an empty result and is logged here.
//!     The P&L builder always receives well-formed input.
//!   - The all-divisions view MUST go through aggregate_across_divisions;
//!     divisional rows are stored separately.

use crate::{
    error::KanriResult,
    store::{CategoryAggregate, LedgerStore},
    targets::TargetRatio,
    types::{DivisionScope, MonthKey},
};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// The narrow read interface the report engine needs from the backing store.
pub trait AggregateSource {
    /// One page of sales totals (keyed by tax bucket), ordered by a stable id.
    fn sales_totals_page(
        &self,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>>;

    /// One page of expense totals (keyed by category), ordered by a stable id.
    fn expense_totals_page(
        &self,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>>;

    fn target_ratio(&self, division: &str) -> KanriResult<Option<TargetRatio>>;
}

impl AggregateSource for LedgerStore {
    fn sales_totals_page(
        &self,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>> {
        self.sales_totals_range(years, division, offset, limit)
    }

    fn expense_totals_page(
        &self,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>> {
        self.expense_totals_range(years, division, offset, limit)
    }

    fn target_ratio(&self, division: &str) -> KanriResult<Option<TargetRatio>> {
        self.expense_target(division)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sales,
    Expense,
}

impl AggregateKind {
    fn name(&self) -> &'static str {
        match self {
            AggregateKind::Sales   => "sales",
            AggregateKind::Expense => "expense",
        }
    }
}

/// Monthly totals keyed by (month, tax bucket or category). Missing keys
/// read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateMap {
    totals: HashMap<(MonthKey, String), f64>,
}

impl AggregateMap {
    pub fn get(&self, month: MonthKey, key: &str) -> f64 {
        self.totals
            .get(&(month, key.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of every key in `month`.
    pub fn month_total(&self, month: MonthKey) -> f64 {
        self.totals
            .iter()
            .filter(|((m, _), _)| *m == month)
            .map(|(_, v)| v)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    fn add(&mut self, month: MonthKey, key: &str, amount: f64) {
        *self.totals.entry((month, key.to_string())).or_insert(0.0) += amount;
    }

    fn set(&mut self, month: MonthKey, key: &str, amount: f64) -> Option<f64> {
        self.totals.insert((month, key.to_string()), amount)
    }
}

/// Sum rows from every division per (year, month, key).
pub fn aggregate_across_divisions(rows: &[CategoryAggregate]) -> AggregateMap {
    let mut map = AggregateMap::default();
    for row in rows {
        map.add(row.month_key(), &row.key, row.amount);
    }
    map
}

/// Index rows that all belong to one division. The store keeps one row per
/// key; if a duplicate slips through, the later row wins and it is logged.
pub fn index_division(rows: &[CategoryAggregate]) -> AggregateMap {
    let mut map = AggregateMap::default();
    for row in rows {
        if map.set(row.month_key(), &row.key, row.amount).is_some() {
            log::warn!(
                "duplicate aggregate for {} {} '{}' (id {}), keeping latest",
                row.month_key(),
                row.division,
                row.key,
                row.id
            );
        }
    }
    map
}

/// Request successive pages until one comes back short.
pub fn fetch_all_pages<T, F>(page_size: usize, mut fetch_page: F) -> KanriResult<Vec<T>>
where
    F: FnMut(usize, usize) -> KanriResult<Vec<T>>,
{
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch_page(offset, page_size)?;
        let len = page.len();
        all.extend(page);
        if len < page_size {
            break;
        }
        offset += page_size;
    }
    Ok(all)
}

pub struct AggregateFetcher<'a, S: AggregateSource + ?Sized> {
    source:    &'a S,
    page_size: usize,
}

impl<'a, S: AggregateSource + ?Sized> AggregateFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(source: &'a S, page_size: usize) -> Self {
        Self { source, page_size }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Every aggregate row for `years` in `scope`. Empty on failure.
    pub fn fetch_totals(
        &self,
        kind: AggregateKind,
        years: &[i32],
        scope: &DivisionScope,
    ) -> Vec<CategoryAggregate> {
        let division = scope.filter();
        let result = fetch_all_pages(self.page_size, |offset, limit| {
            log::debug!(
                "fetching {} totals years={years:?} division={division:?} range={offset}..{}",
                kind.name(),
                offset + limit
            );
            match kind {
                AggregateKind::Sales => self.source.sales_totals_page(years, division, offset, limit),
                AggregateKind::Expense => {
                    self.source.expense_totals_page(years, division, offset, limit)
                }
            }
        });
        match result {
            Ok(rows) => rows,
            Err(e) => {
                log::error!(
                    "fetch {} totals failed (years={years:?}, division={division:?}): {e}",
                    kind.name()
                );
                Vec::new()
            }
        }
    }

    /// Fetch and fold into a lookup, summing across divisions for `All`.
    pub fn fetch_map(&self, kind: AggregateKind, years: &[i32], scope: &DivisionScope) -> AggregateMap {
        let rows = self.fetch_totals(kind, years, scope);
        match scope {
            DivisionScope::All => aggregate_across_divisions(&rows),
            DivisionScope::Single(_) => index_division(&rows),
        }
    }

    /// Target ratios for `division`. `None` when unset or on failure.
    pub fn fetch_target_ratio(&self, division: &str) -> Option<TargetRatio> {
        match self.source.target_ratio(division) {
            Ok(target) => target,
            Err(e) => {
                log::error!("fetch target ratio for '{division}' failed: {e}");
                None
            }
        }
    }
}
