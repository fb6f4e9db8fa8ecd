use super::{Division, LedgerStore, SaveOutcome};
use crate::{
    error::{KanriError, KanriResult},
    types::RecordId,
};
use rusqlite::params;

impl LedgerStore {
    // ── Divisions ─────────────────────────────────────────────────

    pub fn divisions(&self) -> KanriResult<Vec<Division>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM divisions ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Division {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Division names in registration order.
    pub fn division_names(&self) -> KanriResult<Vec<String>> {
        Ok(self.divisions()?.into_iter().map(|d| d.name).collect())
    }

    pub fn add_division(&self, name: &str) -> KanriResult<SaveOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO divisions (name) VALUES (?1)",
            params![name],
        )?;
        Ok(if changed == 0 { SaveOutcome::Duplicate } else { SaveOutcome::Saved })
    }

    pub fn rename_division(&self, id: RecordId, new_name: &str) -> KanriResult<()> {
        let changed = self.conn.execute(
            "UPDATE divisions SET name = ?1 WHERE id = ?2",
            params![new_name, id],
        )?;
        if changed == 0 {
            return Err(KanriError::DivisionNotFound { name: format!("#{id}") });
        }
        Ok(())
    }

    /// Look up a division by name.
    pub fn division_by_name(&self, name: &str) -> KanriResult<Division> {
        self.divisions()?
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| KanriError::DivisionNotFound { name: name.to_string() })
    }

    pub fn delete_division(&self, id: RecordId) -> KanriResult<()> {
        self.conn
            .execute("DELETE FROM divisions WHERE id = ?1", params![id])?;
        Ok(())
    }
}
