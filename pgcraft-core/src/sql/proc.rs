//! Stored routine call generation.

use super::SqlCtx;
use crate::convert::Proc;
use crate::schema::ProcKind;

/// Build the invocation for a stored routine: `CALL` for procedures,
/// `SELECT * FROM` for functions.
pub fn build_proc_call(ctx: &SqlCtx<'_>, proc: &Proc) -> Vec<String> {
    let params: Vec<String> = (0..proc.params.len()).map(|i| ctx.nth(i)).collect();
    let call = match proc.kind {
        ProcKind::Procedure => format!(
            "CALL {}({})",
            ctx.qualified(&proc.sql_name),
            params.join(", ")
        ),
        ProcKind::Function => format!(
            "SELECT * FROM {}({})",
            ctx.qualified(&proc.sql_name),
            params.join(", ")
        ),
    };
    vec![call]
}
