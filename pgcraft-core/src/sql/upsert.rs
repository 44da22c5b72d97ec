//! Upsert (INSERT … ON CONFLICT) statement generation.

use super::insert::insert_base;
use super::update::update_base;
use super::SqlCtx;
use crate::convert::Table;

/// Build an upsert: the all-columns insert with an `ON CONFLICT` clause
/// over the primary keys updating every non-key column from `EXCLUDED`,
/// plus `RETURNING` when a sequence column exists.
pub fn build_upsert(ctx: &SqlCtx<'_>, table: &Table) -> Vec<String> {
    let mut lines = insert_base(ctx, table, true);
    let conflicts: Vec<String> = table
        .primary_keys
        .iter()
        .map(|pk| pk.sql_name.clone())
        .collect();
    lines.push(format!(" ON CONFLICT ({}) DO ", conflicts.join(", ")));
    let (_, update) = update_base(ctx, table, "EXCLUDED.");
    lines.push("UPDATE SET ".to_owned());
    lines.extend(update.into_iter().skip(1));
    if !table.manual {
        if let Some(seq) = table.sequence() {
            lines.push(format!(" RETURNING {}", ctx.colname(seq)));
        }
    }
    lines
}
