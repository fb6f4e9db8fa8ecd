//! Account items, default partners and income sources.

use super::{now_stamp, AccountItem, DefaultPartner, IncomeSource, LedgerStore, SaveOutcome};
use crate::{error::KanriResult, types::RecordId};
use rusqlite::{params, Row};

fn partner_from_row(row: &Row<'_>) -> rusqlite::Result<DefaultPartner> {
    Ok(DefaultPartner {
        id: Some(row.get(0)?),
        category: row.get(1)?,
        partner: row.get(2)?,
        account: row.get(3)?,
        detail: row.get(4)?,
        payment: row.get(5)?,
        division: row.get(6)?,
    })
}

impl LedgerStore {
    // ── Account items ─────────────────────────────────────────────

    pub fn account_items(&self) -> KanriResult<Vec<AccountItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM account_items ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(AccountItem {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn save_account_item(&self, name: &str) -> KanriResult<SaveOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO account_items (name) VALUES (?1)",
            params![name],
        )?;
        Ok(if changed == 0 { SaveOutcome::Duplicate } else { SaveOutcome::Saved })
    }

    pub fn delete_account_item(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM account_items WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Default partners ──────────────────────────────────────────

    pub fn default_partners(&self) -> KanriResult<Vec<DefaultPartner>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, second_category, partner, account, detail, payment, top_category
             FROM default_partners ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], partner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn default_partners_for(&self, category: &str, division: &str) -> KanriResult<Vec<DefaultPartner>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, second_category, partner, account, detail, payment, top_category
             FROM default_partners WHERE second_category = ?1 AND top_category = ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![category, division], partner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Register a default partner; an identical row is a duplicate.
    pub fn save_default_partner(&self, p: &DefaultPartner) -> KanriResult<SaveOutcome> {
        let existing: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM default_partners
             WHERE second_category = ?1 AND partner = ?2 AND account = ?3
               AND detail = ?4 AND payment = ?5 AND top_category = ?6",
            params![&p.category, &p.partner, &p.account, &p.detail, &p.payment, &p.division],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(SaveOutcome::Duplicate);
        }
        self.conn.execute(
            "INSERT INTO default_partners (
                second_category, partner, account, detail, payment, top_category, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &p.category,
                &p.partner,
                &p.account,
                &p.detail,
                &p.payment,
                &p.division,
                now_stamp(),
            ],
        )?;
        Ok(SaveOutcome::Saved)
    }

    pub fn update_default_partner(&self, id: RecordId, p: &DefaultPartner) -> KanriResult<()> {
        self.conn.execute(
            "UPDATE default_partners SET
                second_category = ?1, partner = ?2, account = ?3, detail = ?4,
                payment = ?5, top_category = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                &p.category,
                &p.partner,
                &p.account,
                &p.detail,
                &p.payment,
                &p.division,
                now_stamp(),
                id,
            ],
        )?;
        Ok(())
    }

    pub fn delete_default_partner(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM default_partners WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Income sources ────────────────────────────────────────────

    pub fn income_sources(&self) -> KanriResult<Vec<IncomeSource>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, top_category, partner, expected_amount, received_amount,
                    payment, detail, tax_rate
             FROM income_sources ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(IncomeSource {
                id: Some(row.get(0)?),
                division: row.get(1)?,
                partner: row.get(2)?,
                expected_amount: row.get(3)?,
                received_amount: row.get(4)?,
                payment: row.get(5)?,
                detail: row.get(6)?,
                tax_rate: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn add_income_source(&self, s: &IncomeSource) -> KanriResult<RecordId> {
        self.conn.execute(
            "INSERT INTO income_sources (
                top_category, partner, expected_amount, received_amount,
                payment, detail, tax_rate, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &s.division,
                &s.partner,
                s.expected_amount,
                s.received_amount,
                &s.payment,
                &s.detail,
                &s.tax_rate,
                now_stamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_income_source(&self, id: RecordId, s: &IncomeSource) -> KanriResult<()> {
        self.conn.execute(
            "UPDATE income_sources SET
                top_category = ?1, partner = ?2, expected_amount = ?3, received_amount = ?4,
                payment = ?5, detail = ?6, tax_rate = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                &s.division,
                &s.partner,
                s.expected_amount,
                s.received_amount,
                &s.payment,
                &s.detail,
                &s.tax_rate,
                now_stamp(),
                id,
            ],
        )?;
        Ok(())
    }

    pub fn delete_income_source(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM income_sources WHERE id = ?1", params![id])?;
        Ok(())
    }
}
