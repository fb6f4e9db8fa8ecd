use super::{now_stamp, LedgerStore};
use crate::{error::KanriResult, targets::TargetRatio};
use rusqlite::{params, OptionalExtension, Row};

const TARGET_COLUMNS: &str = "top_category, cost_rate, labor_rate, fl_rate, utility_rate,
    misc_rate, other_fixed_rate, rent_rate, flr_rate, op_profit_rate";

fn target_from_row(row: &Row<'_>) -> rusqlite::Result<TargetRatio> {
    Ok(TargetRatio {
        division: row.get(0)?,
        cost_rate: row.get(1)?,
        labor_rate: row.get(2)?,
        fl_rate: row.get(3)?,
        utility_rate: row.get(4)?,
        misc_rate: row.get(5)?,
        other_fixed_rate: row.get(6)?,
        rent_rate: row.get(7)?,
        flr_rate: row.get(8)?,
        op_profit_rate: row.get(9)?,
    })
}

impl LedgerStore {
    // ── Target ratios ─────────────────────────────────────────────

    pub fn expense_target(&self, division: &str) -> KanriResult<Option<TargetRatio>> {
        let sql = format!(
            "SELECT {TARGET_COLUMNS} FROM expense_targets WHERE top_category = ?1 LIMIT 1"
        );
        let target = self
            .conn
            .query_row(&sql, params![division], target_from_row)
            .optional()?;
        Ok(target)
    }

    pub fn expense_targets(&self) -> KanriResult<Vec<TargetRatio>> {
        let sql = format!("SELECT {TARGET_COLUMNS} FROM expense_targets ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], target_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert the division's targets, or overwrite them if present.
    pub fn upsert_expense_target(&self, t: &TargetRatio) -> KanriResult<()> {
        self.conn.execute(
            "INSERT INTO expense_targets (
                top_category, cost_rate, labor_rate, fl_rate, utility_rate,
                misc_rate, other_fixed_rate, rent_rate, flr_rate, op_profit_rate, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT (top_category) DO UPDATE SET
                cost_rate        = excluded.cost_rate,
                labor_rate       = excluded.labor_rate,
                fl_rate          = excluded.fl_rate,
                utility_rate     = excluded.utility_rate,
                misc_rate        = excluded.misc_rate,
                other_fixed_rate = excluded.other_fixed_rate,
                rent_rate        = excluded.rent_rate,
                flr_rate         = excluded.flr_rate,
                op_profit_rate   = excluded.op_profit_rate,
                updated_at       = excluded.updated_at",
            params![
                &t.division,
                t.cost_rate,
                t.labor_rate,
                t.fl_rate,
                t.utility_rate,
                t.misc_rate,
                t.other_fixed_rate,
                t.rent_rate,
                t.flr_rate,
                t.op_profit_rate,
                now_stamp(),
            ],
        )?;
        Ok(())
    }
}
