//! Shared primitive types used across the engine and the store.

use crate::error::{KanriError, KanriResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row id assigned by the store.
pub type RecordId = i64;

/// A calendar month. Orders chronologically; serializes as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthKey {
    pub year:  i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> KanriResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(KanriError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    /// The following calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// The preceding calendar month.
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// Chart axis label, e.g. `2024 / 03`.
    pub fn axis_label(&self) -> String {
        format!("{} / {:02}", self.year, self.month)
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> KanriResult<Self> {
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = y
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("bad year in '{s}': {e}"))?;
        let month: u32 = m
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("bad month in '{s}': {e}"))?;
        Self::new(year, month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl From<MonthKey> for String {
    fn from(m: MonthKey) -> Self {
        m.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = KanriError;

    fn try_from(s: String) -> KanriResult<Self> {
        MonthKey::parse(&s)
    }
}

/// Which divisions a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "name", rename_all = "snake_case")]
pub enum DivisionScope {
    /// The synthetic "all divisions" aggregate.
    All,
    Single(String),
}

impl DivisionScope {
    /// Map a division name to a scope; the configured all-divisions label
    /// selects `All`.
    pub fn from_name(name: &str, all_label: &str) -> Self {
        if name == all_label {
            DivisionScope::All
        } else {
            DivisionScope::Single(name.to_string())
        }
    }

    /// Division filter handed to the store. `None` means no filter.
    pub fn filter(&self) -> Option<&str> {
        match self {
            DivisionScope::All => None,
            DivisionScope::Single(name) => Some(name.as_str()),
        }
    }
}

/// Tax bucket a sale is booked under. Stored by its Japanese key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxBucket {
    Standard10,
    Standard8,
    Other10,
    Other8,
}

impl TaxBucket {
    pub const ALL: [TaxBucket; 4] = [
        TaxBucket::Standard10,
        TaxBucket::Standard8,
        TaxBucket::Other10,
        TaxBucket::Other8,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TaxBucket::Standard10 => "売上10%",
            TaxBucket::Standard8  => "売上8%",
            TaxBucket::Other10    => "その他売上10%",
            TaxBucket::Other8     => "その他売上8%",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }
}

/// Expense categories the P&L reads. Other categories may exist in the
/// store; the P&L ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    CostOfGoods,
    Labor,
    Utilities,
    Misc,
    Extraordinary,
    OtherFixed,
    Rent,
    Advertising,
    LoanInterest,
    LoanPrincipal,
}

impl CostCategory {
    pub const ALL: [CostCategory; 10] = [
        CostCategory::CostOfGoods,
        CostCategory::Labor,
        CostCategory::Utilities,
        CostCategory::Misc,
        CostCategory::Extraordinary,
        CostCategory::OtherFixed,
        CostCategory::Rent,
        CostCategory::Advertising,
        CostCategory::LoanInterest,
        CostCategory::LoanPrincipal,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CostCategory::CostOfGoods   => "原価（仕入れ高）",
            CostCategory::Labor         => "人件費",
            CostCategory::Utilities     => "水道光熱費",
            CostCategory::Misc          => "消耗品費・その他諸経費",
            CostCategory::Extraordinary => "臨時諸経費",
            CostCategory::OtherFixed    => "その他固定費",
            CostCategory::Rent          => "家賃",
            CostCategory::Advertising   => "広告費",
            CostCategory::LoanInterest  => "融資返済利息",
            CostCategory::LoanPrincipal => "融資返済元金",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}
