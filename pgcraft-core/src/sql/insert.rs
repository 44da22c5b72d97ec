//! INSERT statement generation.

use super::SqlCtx;
use crate::convert::Table;

/// Build the base insert. Sequence columns are skipped unless `all` is
/// set (the upsert path inserts every column).
pub(crate) fn insert_base(ctx: &SqlCtx<'_>, table: &Table, all: bool) -> Vec<String> {
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for field in &table.fields {
        if field.is_sequence && !all {
            continue;
        }
        vals.push(ctx.nth(cols.len()));
        cols.push(ctx.colname(field));
    }
    vec![
        format!("INSERT INTO {} (", ctx.qualified(&table.sql_name)),
        format!("{}) ", cols.join(", ")),
        format!("VALUES ({})", vals.join(", ")),
    ]
}

/// Build an insert statement. Tables with a sequence column read the
/// assigned key back via `RETURNING`; manual tables skip the round-trip.
pub fn build_insert(ctx: &SqlCtx<'_>, table: &Table) -> Vec<String> {
    let mut lines = insert_base(ctx, table, false);
    if !table.manual {
        if let Some(seq) = table.sequence() {
            lines.push(format!(" RETURNING {}", ctx.colname(seq)));
        }
    }
    lines
}
