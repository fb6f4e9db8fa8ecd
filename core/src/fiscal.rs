//! Fiscal calendar: turns "today" into the list of fiscal terms and the
//! months that belong to each.
//!
//! A term is twelve consecutive months starting on the configured start
//! month. Term 1 starts in `start_year`; each later term begins the month
//! after the previous one ends. Terms are recomputed on every request.

use crate::{
    config::KanriConfig,
    error::{KanriError, KanriResult},
    types::MonthKey,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MONTHS_PER_TERM: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalTerm {
    pub index: u32,
    pub label: String,
    pub start: MonthKey,
    pub end:   MonthKey,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end:   NaiveDate,
}

impl DateRange {
    pub fn contains_month(&self, month: MonthKey) -> bool {
        // A month is in range when its first day falls inside it.
        match NaiveDate::from_ymd_opt(month.year, month.month, 1) {
            Some(first) => first >= self.start && first <= self.end,
            None => false,
        }
    }

    /// Calendar years the range touches.
    pub fn years(&self) -> Vec<i32> {
        (self.start.year()..=self.end.year()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    pub start_year:  i32,
    pub start_month: u32,
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self { start_year: 2020, start_month: 8 }
    }
}

impl FiscalCalendar {
    pub fn new(start_year: i32, start_month: u32) -> KanriResult<Self> {
        MonthKey::new(start_year, start_month)?;
        Ok(Self { start_year, start_month })
    }

    pub fn from_config(config: &KanriConfig) -> KanriResult<Self> {
        Self::new(config.start_year, config.fiscal_start_month)
    }

    /// Number of terms that have started by `today`.
    pub fn term_count(&self, today: NaiveDate) -> u32 {
        let started_this_year = if today.month() >= self.start_month { 1 } else { 0 };
        let count = (today.year() - self.start_year) + started_this_year;
        count.max(0) as u32
    }

    /// Build term `index` (1-based). Does not check it has started.
    pub fn term(&self, index: u32) -> FiscalTerm {
        let start = MonthKey {
            year:  self.start_year + index as i32 - 1,
            month: self.start_month,
        };
        let end = (1..MONTHS_PER_TERM).fold(start, |m, _| m.succ());
        FiscalTerm {
            index,
            label: format!("{index}期目"),
            start,
            end,
        }
    }

    /// Every term from 1 up to the one in progress on `today`.
    pub fn list_terms(&self, today: NaiveDate) -> Vec<FiscalTerm> {
        (1..=self.term_count(today)).map(|i| self.term(i)).collect()
    }

    /// Look up a started term by index.
    pub fn started_term(&self, index: u32, today: NaiveDate) -> KanriResult<FiscalTerm> {
        if index == 0 || index > self.term_count(today) {
            return Err(KanriError::TermNotFound { index });
        }
        Ok(self.term(index))
    }

    /// The term in progress on `today`, if term 1 has begun.
    pub fn latest_term(&self, today: NaiveDate) -> Option<FiscalTerm> {
        match self.term_count(today) {
            0 => None,
            n => Some(self.term(n)),
        }
    }

    /// Date range of the fiscal year containing `today` (今期).
    pub fn current_period(&self, today: NaiveDate) -> DateRange {
        let start_year = if today.month() >= self.start_month {
            today.year()
        } else {
            today.year() - 1
        };
        self.period_starting(start_year)
    }

    /// Date range of the fiscal year before the current one (先期).
    pub fn previous_period(&self, today: NaiveDate) -> DateRange {
        let current = self.current_period(today);
        self.period_starting(current.start.year() - 1)
    }

    fn period_starting(&self, year: i32) -> DateRange {
        let start = MonthKey { year, month: self.start_month };
        let end = (1..MONTHS_PER_TERM).fold(start, |m, _| m.succ());
        DateRange {
            start: first_day(start),
            end:   last_day(end),
        }
    }
}

/// The twelve months of `term`, in chronological order.
pub fn months_in_term(term: &FiscalTerm) -> Vec<MonthKey> {
    let mut months = Vec::with_capacity(MONTHS_PER_TERM);
    let mut m = term.start;
    while m <= term.end {
        months.push(m);
        m = m.succ();
    }
    months
}

/// Distinct calendar years covered by `term`, ascending.
pub fn term_years(term: &FiscalTerm) -> Vec<i32> {
    let mut years: Vec<i32> = months_in_term(term).iter().map(|m| m.year).collect();
    years.dedup();
    years
}

/// Month preselected in the month picker: last month if it belongs to the
/// term, otherwise the term's final month.
pub fn default_month(today: NaiveDate, months: &[MonthKey]) -> Option<MonthKey> {
    let previous = month_of(today).pred();
    if months.contains(&previous) {
        Some(previous)
    } else {
        months.last().copied()
    }
}

pub fn month_of(date: NaiveDate) -> MonthKey {
    MonthKey { year: date.year(), month: date.month() }
}

fn first_day(m: MonthKey) -> NaiveDate {
    NaiveDate::from_ymd_opt(m.year, m.month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_day(m: MonthKey) -> NaiveDate {
    first_day(m.succ()).pred_opt().unwrap_or(NaiveDate::MAX)
}
