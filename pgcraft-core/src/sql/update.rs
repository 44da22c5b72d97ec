//! UPDATE statement generation.

use super::SqlCtx;
use crate::convert::Table;

/// Build the SET clause. With an empty prefix the assignments take
/// numbered placeholders; with a prefix (`EXCLUDED.`) they reference the
/// prefixed column instead. Returns the number of placeholders consumed.
pub(crate) fn update_base(ctx: &SqlCtx<'_>, table: &Table, prefix: &str) -> (usize, Vec<String>) {
    let mut n = 0;
    let mut assignments = Vec::new();
    for field in &table.fields {
        if field.is_primary {
            continue;
        }
        let value = if prefix.is_empty() {
            ctx.nth(n)
        } else {
            format!("{prefix}{}", field.sql_name)
        };
        assignments.push(format!("{} = {}", ctx.colname(field), value));
        n += 1;
    }
    (
        n,
        vec![
            format!("UPDATE {} SET ", ctx.qualified(&table.sql_name)),
            format!("{} ", assignments.join(", ")),
        ],
    )
}

/// Build an update statement: non-primary-key columns first, primary keys
/// last in placeholder order.
pub fn build_update(ctx: &SqlCtx<'_>, table: &Table) -> Vec<String> {
    let (n, mut lines) = update_base(ctx, table, "");
    let clauses: Vec<String> = table
        .primary_keys
        .iter()
        .enumerate()
        .map(|(i, pk)| format!("{} = {}", ctx.colname(pk), ctx.nth(n + i)))
        .collect();
    lines.push(format!("WHERE {}", clauses.join(" AND ")));
    lines
}
