//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The report engine reads through the AggregateSource trait and never
//! executes SQL directly.

use crate::{
    error::KanriResult,
    types::{MonthKey, RecordId},
};
use rusqlite::{types::Value, Connection};
use serde::{Deserialize, Serialize};

mod categories;
mod divisions;
mod entries;
mod reference;
mod targets;
mod totals;

pub struct LedgerStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

/// Outcome of an insert guarded by a duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    Duplicate,
}

/// One pre-aggregated monthly total: a sales total keyed by tax bucket or
/// an expense total keyed by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    pub id:       RecordId,
    pub year:     i32,
    pub month:    u32,
    pub division: String,
    /// Tax bucket for sales, expense category for expenses.
    pub key:      String,
    pub amount:   f64,
}

impl CategoryAggregate {
    pub fn month_key(&self) -> MonthKey {
        MonthKey { year: self.year, month: self.month }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub id:   RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id:         RecordId,
    pub name:       String,
    pub sort_order: i64,
    pub is_fixed:   bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesEntry {
    pub id:              Option<RecordId>,
    pub year:            i32,
    pub month:           u32,
    pub partner:         String,
    pub detail:          String,
    pub expected_amount: f64,
    pub received_amount: f64,
    pub payment:         String,
    pub invoice_issued:  bool,
    pub division:        String,
    /// Tax bucket key. Entries without one count as standard 10%.
    pub tax_rate:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub id:       Option<RecordId>,
    pub year:     i32,
    pub month:    u32,
    pub partner:  String,
    pub account:  String,
    pub detail:   String,
    pub payment:  String,
    pub cost:     f64,
    pub category: String,
    pub division: String,
}

/// A recurring expense copied into a month on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub id:       Option<RecordId>,
    pub partner:  String,
    pub account:  String,
    pub detail:   String,
    pub payment:  String,
    pub cost:     f64,
    pub division: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountItem {
    pub id:   RecordId,
    pub name: String,
}

/// Partner prefilled into new expense rows for a category and division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultPartner {
    pub id:       Option<RecordId>,
    pub category: String,
    pub partner:  String,
    pub account:  String,
    pub detail:   String,
    pub payment:  String,
    pub division: String,
}

/// Recurring income line prefilled into the sales grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id:              Option<RecordId>,
    pub division:        String,
    pub partner:         String,
    pub expected_amount: f64,
    pub received_amount: f64,
    pub payment:         String,
    pub detail:          String,
    pub tax_rate:        String,
}

impl LedgerStore {
    pub fn open(path: &str) -> KanriResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> KanriResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> KanriResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_reference.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_entries.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_totals.sql"))?;
        Ok(())
    }
}

/// `?, ?, ?` placeholder list plus bound values for a `year IN (...)` filter.
fn year_filter(years: &[i32]) -> (String, Vec<Value>) {
    let placeholders = vec!["?"; years.len()].join(", ");
    let values = years.iter().map(|y| Value::Integer(i64::from(*y))).collect();
    (placeholders, values)
}

fn now_stamp() -> String {
    chrono::Local::now().to_rfc3339()
}
