//! kanri-core: monthly management accounting for a multi-division business.
//!
//! The store keeps entries and their monthly totals; the report engine reads
//! the totals back as a fiscal-term P&L with ratio rows and target flags.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod fiscal;
pub mod format;
pub mod pnl;
pub mod ratios;
pub mod report;
pub mod store;
pub mod summary;
pub mod targets;
pub mod trends;
pub mod types;
