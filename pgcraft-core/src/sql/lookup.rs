//! Index lookup statement generation.

use super::SqlCtx;
use crate::convert::Index;

/// Build a select over the owning table's full column list, filtered on
/// the index fields.
pub fn build_index_lookup(ctx: &SqlCtx<'_>, index: &Index) -> Vec<String> {
    let cols: Vec<String> = index
        .table
        .fields
        .iter()
        .map(|f| ctx.colname(f))
        .collect();
    let clauses: Vec<String> = index
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = {}", ctx.colname(f), ctx.nth(i)))
        .collect();
    vec![
        "SELECT ".to_owned(),
        format!("{} ", cols.join(", ")),
        format!("FROM {} ", ctx.qualified(&index.table.sql_name)),
        format!("WHERE {}", clauses.join(" AND ")),
    ]
}
