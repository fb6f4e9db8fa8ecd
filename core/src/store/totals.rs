//! Monthly aggregate tables: paged reads for the report engine and the
//! delete-then-insert write path that keeps them in step with the entries.

use super::{now_stamp, year_filter, CategoryAggregate, LedgerStore};
use crate::{error::KanriResult, types::TaxBucket};
use rusqlite::{params, params_from_iter, types::Value};
use std::collections::BTreeMap;

impl LedgerStore {
    // ── Paged reads ───────────────────────────────────────────────

    /// One page of sales totals for `years`, ordered by id.
    pub fn sales_totals_range(
        &self,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>> {
        self.aggregate_range(
            "SELECT id, year, month, top_category, tax_rate, total_amount FROM all_sales_total",
            years,
            division,
            offset,
            limit,
        )
    }

    /// One page of expense totals for `years`, ordered by id.
    pub fn expense_totals_range(
        &self,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>> {
        self.aggregate_range(
            "SELECT id, year, month, top_category, second_category, total_cost FROM all_expense_total",
            years,
            division,
            offset,
            limit,
        )
    }

    fn aggregate_range(
        &self,
        select: &str,
        years: &[i32],
        division: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> KanriResult<Vec<CategoryAggregate>> {
        if years.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let (placeholders, mut values) = year_filter(years);
        let mut sql = format!("{select} WHERE year IN ({placeholders})");
        if let Some(div) = division {
            sql.push_str(" AND top_category = ?");
            values.push(Value::Text(div.to_string()));
        }
        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(CategoryAggregate {
                id: row.get(0)?,
                year: row.get(1)?,
                month: row.get(2)?,
                division: row.get(3)?,
                key: row.get(4)?,
                amount: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Single-month reads ────────────────────────────────────────

    /// Sales totals of one month and division, keyed by tax bucket.
    pub fn sales_totals_for_month(
        &self,
        year: i32,
        month: u32,
        division: &str,
    ) -> KanriResult<BTreeMap<String, f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT tax_rate, SUM(total_amount) FROM all_sales_total
             WHERE year = ?1 AND month = ?2 AND top_category = ?3
             GROUP BY tax_rate",
        )?;
        let rows = stmt.query_map(params![year, month, division], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        rows.collect::<Result<BTreeMap<_, _>, _>>().map_err(Into::into)
    }

    /// Expense totals of one month and division, keyed by category.
    pub fn expense_totals_for_month(
        &self,
        year: i32,
        month: u32,
        division: &str,
    ) -> KanriResult<BTreeMap<String, f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT second_category, SUM(total_cost) FROM all_expense_total
             WHERE year = ?1 AND month = ?2 AND top_category = ?3
             GROUP BY second_category",
        )?;
        let rows = stmt.query_map(params![year, month, division], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        rows.collect::<Result<BTreeMap<_, _>, _>>().map_err(Into::into)
    }

    // ── Write path ────────────────────────────────────────────────

    /// Replace the sales totals of one month and division with the
    /// received amounts of its entries, grouped by tax bucket.
    pub fn refresh_sales_totals(&self, year: i32, month: u32, division: &str) -> KanriResult<()> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT tax_rate, received_amount FROM all_sales
                 WHERE year = ?1 AND month = ?2 AND top_category = ?3",
            )?;
            let rows = stmt.query_map(params![year, month, division], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, f64>(1)?))
            })?;
            for row in rows {
                let (tax_rate, amount) = row?;
                let key = tax_rate
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| TaxBucket::Standard10.key().to_string());
                *totals.entry(key).or_insert(0.0) += amount;
            }
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM all_sales_total WHERE year = ?1 AND month = ?2 AND top_category = ?3",
            params![year, month, division],
        )?;
        let stamp = now_stamp();
        for (tax_rate, total) in &totals {
            tx.execute(
                "INSERT INTO all_sales_total (year, month, top_category, tax_rate, total_amount, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![year, month, division, tax_rate, total, stamp],
            )?;
        }
        tx.commit()?;
        log::debug!(
            "sales totals refreshed: {year}-{month:02} {division} ({} buckets)",
            totals.len()
        );
        Ok(())
    }

    /// Replace every expense total of one month and division.
    pub fn refresh_expense_totals(&self, year: i32, month: u32, division: &str) -> KanriResult<()> {
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT second_category, cost FROM all_expense
                 WHERE year = ?1 AND month = ?2 AND top_category = ?3",
            )?;
            let rows = stmt.query_map(params![year, month, division], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?;
            for row in rows {
                let (category, cost) = row?;
                *totals.entry(category).or_insert(0.0) += cost;
            }
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM all_expense_total WHERE year = ?1 AND month = ?2 AND top_category = ?3",
            params![year, month, division],
        )?;
        let stamp = now_stamp();
        for (category, total) in &totals {
            tx.execute(
                "INSERT INTO all_expense_total (year, month, top_category, second_category, total_cost, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![year, month, division, category, total, stamp],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace the total of a single expense category. A category with no
    /// remaining entries loses its total row.
    pub fn refresh_expense_total(
        &self,
        year: i32,
        month: u32,
        category: &str,
        division: &str,
    ) -> KanriResult<()> {
        let (count, total): (i64, f64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(cost), 0) FROM all_expense
             WHERE year = ?1 AND month = ?2 AND second_category = ?3 AND top_category = ?4",
            params![year, month, category, division],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM all_expense_total
             WHERE year = ?1 AND month = ?2 AND second_category = ?3 AND top_category = ?4",
            params![year, month, category, division],
        )?;
        if count > 0 {
            tx.execute(
                "INSERT INTO all_expense_total (year, month, top_category, second_category, total_cost, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![year, month, division, category, total, now_stamp()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Write a sales total directly. Used by imports and tests that bypass
    /// the entry tables.
    pub fn put_sales_total(
        &self,
        year: i32,
        month: u32,
        division: &str,
        tax_rate: &str,
        amount: f64,
    ) -> KanriResult<()> {
        self.conn.execute(
            "INSERT INTO all_sales_total (year, month, top_category, tax_rate, total_amount, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (year, month, top_category, tax_rate)
             DO UPDATE SET total_amount = excluded.total_amount, updated_at = excluded.updated_at",
            params![year, month, division, tax_rate, amount, now_stamp()],
        )?;
        Ok(())
    }

    /// Write an expense total directly.
    pub fn put_expense_total(
        &self,
        year: i32,
        month: u32,
        division: &str,
        category: &str,
        amount: f64,
    ) -> KanriResult<()> {
        self.conn.execute(
            "INSERT INTO all_expense_total (year, month, top_category, second_category, total_cost, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (year, month, top_category, second_category)
             DO UPDATE SET total_cost = excluded.total_cost, updated_at = excluded.updated_at",
            params![year, month, division, category, amount, now_stamp()],
        )?;
        Ok(())
    }
}
