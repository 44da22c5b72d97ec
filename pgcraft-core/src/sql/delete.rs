//! DELETE statement generation.

use super::SqlCtx;
use crate::convert::Table;

/// Build a delete keyed on the primary keys, single or composite.
pub fn build_delete(ctx: &SqlCtx<'_>, table: &Table) -> Vec<String> {
    let clauses: Vec<String> = table
        .primary_keys
        .iter()
        .enumerate()
        .map(|(i, pk)| format!("{} = {}", ctx.colname(pk), ctx.nth(i)))
        .collect();
    vec![
        format!("DELETE FROM {} ", ctx.qualified(&table.sql_name)),
        format!("WHERE {}", clauses.join(" AND ")),
    ]
}
