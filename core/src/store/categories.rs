use super::{ExpenseCategory, LedgerStore, SaveOutcome};
use crate::error::KanriResult;
use rusqlite::{params, OptionalExtension};

impl LedgerStore {
    // ── Expense categories ────────────────────────────────────────

    /// All categories in display order.
    pub fn expense_categories(&self) -> KanriResult<Vec<ExpenseCategory>> {
        self.categories_where("1 = 1")
    }

    /// Category names in display order.
    pub fn expense_category_names(&self) -> KanriResult<Vec<String>> {
        Ok(self.expense_categories()?.into_iter().map(|c| c.name).collect())
    }

    pub fn variable_expense_categories(&self) -> KanriResult<Vec<String>> {
        Ok(self
            .categories_where("is_fixed = 0")?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    pub fn fixed_expense_categories(&self) -> KanriResult<Vec<String>> {
        Ok(self
            .categories_where("is_fixed = 1")?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    fn categories_where(&self, condition: &str) -> KanriResult<Vec<ExpenseCategory>> {
        let sql = format!(
            "SELECT id, second_category, sort_order, is_fixed FROM expense_categories
             WHERE {condition} ORDER BY sort_order ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(ExpenseCategory {
                id: row.get(0)?,
                name: row.get(1)?,
                sort_order: row.get(2)?,
                is_fixed: row.get::<_, i32>(3)? != 0,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Append a category after the current last one.
    pub fn add_expense_category(&self, name: &str, is_fixed: bool) -> KanriResult<SaveOutcome> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM expense_categories WHERE second_category = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Ok(SaveOutcome::Duplicate);
        }

        let max_order: Option<i64> = self.conn.query_row(
            "SELECT MAX(sort_order) FROM expense_categories",
            [],
            |row| row.get(0),
        )?;
        let next_order = max_order.map(|m| m + 1).unwrap_or(0);

        self.conn.execute(
            "INSERT INTO expense_categories (second_category, sort_order, is_fixed)
             VALUES (?1, ?2, ?3)",
            params![name, next_order, if is_fixed { 1 } else { 0 }],
        )?;
        Ok(SaveOutcome::Saved)
    }

    pub fn delete_expense_category(&self, name: &str) -> KanriResult<()> {
        self.conn.execute(
            "DELETE FROM expense_categories WHERE second_category = ?1",
            params![name],
        )?;
        Ok(())
    }

    /// Rewrite sort order so categories appear in the order given.
    pub fn reorder_expense_categories(&self, names: &[String]) -> KanriResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (index, name) in names.iter().enumerate() {
            tx.execute(
                "UPDATE expense_categories SET sort_order = ?1 WHERE second_category = ?2",
                params![index as i64, name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
