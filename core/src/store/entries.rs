use super::{now_stamp, ExpenseEntry, FixedExpense, LedgerStore, SaveOutcome, SalesEntry};
use crate::{error::KanriResult, types::RecordId};
use rusqlite::params;
use std::collections::HashSet;

impl LedgerStore {
    // ── Sales entries ─────────────────────────────────────────────

    pub fn add_sales_entry(&self, e: &SalesEntry) -> KanriResult<RecordId> {
        self.conn.execute(
            "INSERT INTO all_sales (
                year, month, partner, detail, expected_amount, received_amount,
                payment, invoice_issued, top_category, tax_rate, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                e.year,
                e.month,
                &e.partner,
                &e.detail,
                e.expected_amount,
                e.received_amount,
                &e.payment,
                if e.invoice_issued { 1 } else { 0 },
                &e.division,
                &e.tax_rate,
                now_stamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn sales_entries(&self, year: i32, month: u32, division: &str) -> KanriResult<Vec<SalesEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, year, month, partner, detail, expected_amount, received_amount,
                    payment, invoice_issued, top_category, tax_rate
             FROM all_sales WHERE year = ?1 AND month = ?2 AND top_category = ?3
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![year, month, division], |row| {
            Ok(SalesEntry {
                id: Some(row.get(0)?),
                year: row.get(1)?,
                month: row.get(2)?,
                partner: row.get(3)?,
                detail: row.get(4)?,
                expected_amount: row.get(5)?,
                received_amount: row.get(6)?,
                payment: row.get(7)?,
                invoice_issued: row.get::<_, i32>(8)? != 0,
                division: row.get(9)?,
                tax_rate: row.get(10)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_sales_entry(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM all_sales WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Expense entries ───────────────────────────────────────────

    pub fn add_expense_entry(&self, e: &ExpenseEntry) -> KanriResult<RecordId> {
        self.conn.execute(
            "INSERT INTO all_expense (
                year, month, partner, account, detail, payment, cost,
                second_category, top_category, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                e.year,
                e.month,
                &e.partner,
                &e.account,
                &e.detail,
                &e.payment,
                e.cost,
                &e.category,
                &e.division,
                now_stamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn expense_entries(&self, year: i32, month: u32, division: &str) -> KanriResult<Vec<ExpenseEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, year, month, partner, account, detail, payment, cost,
                    second_category, top_category
             FROM all_expense WHERE year = ?1 AND month = ?2 AND top_category = ?3
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![year, month, division], |row| {
            Ok(ExpenseEntry {
                id: Some(row.get(0)?),
                year: row.get(1)?,
                month: row.get(2)?,
                partner: row.get(3)?,
                account: row.get(4)?,
                detail: row.get(5)?,
                payment: row.get(6)?,
                cost: row.get(7)?,
                category: row.get(8)?,
                division: row.get(9)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_expense_entry(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM all_expense WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Fixed-expense templates ───────────────────────────────────

    pub fn fixed_expenses(&self) -> KanriResult<Vec<FixedExpense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, partner, account, detail, payment, cost, top_category, second_category
             FROM fixed_categories ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FixedExpense {
                id: Some(row.get(0)?),
                partner: row.get(1)?,
                account: row.get(2)?,
                detail: row.get(3)?,
                payment: row.get(4)?,
                cost: row.get(5)?,
                division: row.get(6)?,
                category: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Register a template. Partner, account, detail and division together
    /// must be unique.
    pub fn save_fixed_expense(&self, f: &FixedExpense) -> KanriResult<SaveOutcome> {
        let existing: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fixed_categories
             WHERE partner = ?1 AND account = ?2 AND detail = ?3 AND top_category = ?4",
            params![&f.partner, &f.account, &f.detail, &f.division],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(SaveOutcome::Duplicate);
        }
        self.conn.execute(
            "INSERT INTO fixed_categories (
                partner, account, detail, payment, cost, top_category, second_category, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &f.partner,
                &f.account,
                &f.detail,
                &f.payment,
                f.cost,
                &f.division,
                &f.category,
                now_stamp(),
            ],
        )?;
        Ok(SaveOutcome::Saved)
    }

    pub fn delete_fixed_expense(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM fixed_categories WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Copy the division's templates into the month as expense entries,
    /// skipping any already present (same partner, account, detail, cost).
    /// Returns the number of entries inserted.
    pub fn apply_fixed_expenses(&self, year: i32, month: u32, division: &str) -> KanriResult<usize> {
        let templates: Vec<FixedExpense> = self
            .fixed_expenses()?
            .into_iter()
            .filter(|f| f.division == division)
            .collect();

        let existing: HashSet<(String, String, String, u64)> = self
            .expense_entries(year, month, division)?
            .into_iter()
            .map(|e| (e.partner, e.account, e.detail, e.cost.to_bits()))
            .collect();

        let mut inserted = 0;
        for t in templates {
            let key = (t.partner.clone(), t.account.clone(), t.detail.clone(), t.cost.to_bits());
            if existing.contains(&key) {
                continue;
            }
            self.add_expense_entry(&ExpenseEntry {
                id: None,
                year,
                month,
                partner: t.partner,
                account: t.account,
                detail: t.detail,
                payment: t.payment,
                cost: t.cost,
                category: t.category,
                division: t.division,
            })?;
            inserted += 1;
        }
        if inserted > 0 {
            log::info!("fixed expenses: {inserted} entries applied to {year}-{month:02} {division}");
        }
        Ok(inserted)
    }
}
