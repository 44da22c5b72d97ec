//! Partial renderers.
//!
//! One function per partial, assembling generated Rust source as text. The
//! emitted code targets sqlx/PostgreSQL and the pgcraft-row codec; it is
//! never compiled here.

use std::fmt::Write;

use crate::convert::{Enum, Field, ForeignKey, Index, Proc, Query, Table};
use crate::schema::ProcKind;

use super::funcs::{eval, Funcs};

/// The generated-file marker comment.
pub const GENERATED_BY: &str = "// Code generated by pgcraft. DO NOT EDIT.";

/// Render the per-file header: marker comment, feature gates, lint
/// allowances, sibling-module import and any injected text.
pub fn render_header(f: &Funcs<'_>) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_BY);
    out.push('\n');
    for tag in &f.cfg.tags {
        let _ = writeln!(out, "#![cfg(feature = \"{tag}\")]");
    }
    out.push_str("#![allow(unused_imports, dead_code, clippy::all)]\n\n");
    if f.cfg.single.is_empty() {
        out.push_str("use super::*;\n");
    }
    for import in &f.cfg.imports {
        match import.split_once(' ') {
            Some((alias, path)) => {
                let _ = writeln!(out, "use {path} as {alias};");
            }
            None => {
                let _ = writeln!(out, "use {import};");
            }
        }
    }
    if !f.cfg.inject.is_empty() {
        out.push_str(&f.cfg.inject);
        if !f.cfg.inject.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// The shared plumbing partial: context handle, error type, statement
/// logger. Emitted once per run into the well-known destination.
pub fn render_db(f: &Funcs<'_>) -> String {
    eval(DB_PARTIAL, &[f.cfg.pkg()])
}

const DB_PARTIAL: &str = r#"/// Context carries request-scoped cancellation for the `%[1]` data access
/// layer.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every call holding this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Abort the current call when cancelled.
    pub fn ensure(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Why an insert was rejected before reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    AlreadyExists,
    MarkedForDeletion,
}

/// Why an update was rejected before reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    DoesNotExist,
    MarkedForDeletion,
}

/// Why an upsert was rejected before reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertError {
    MarkedForDeletion,
}

/// Error is the error type for all generated database operations.
#[derive(Debug)]
pub enum Error {
    /// A driver-level error, including the no-rows sentinel.
    Sqlx(sqlx::Error),
    /// The call was cancelled through its Context.
    Cancelled,
    /// The record state machine rejected an insert.
    Insert(InsertError),
    /// The record state machine rejected an update.
    Update(UpdateError),
    /// The record state machine rejected an upsert.
    Upsert(UpsertError),
    /// An enum column held a value outside the declared set.
    InvalidEnum(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sqlx(e) => write!(f, "driver error: {e}"),
            Error::Cancelled => f.write_str("operation cancelled"),
            Error::Insert(InsertError::AlreadyExists) => f.write_str("insert failed: already exists"),
            Error::Insert(InsertError::MarkedForDeletion) => {
                f.write_str("insert failed: marked for deletion")
            }
            Error::Update(UpdateError::DoesNotExist) => f.write_str("update failed: does not exist"),
            Error::Update(UpdateError::MarkedForDeletion) => {
                f.write_str("update failed: marked for deletion")
            }
            Error::Upsert(UpsertError::MarkedForDeletion) => {
                f.write_str("upsert failed: marked for deletion")
            }
            Error::InvalidEnum(v) => write!(f, "invalid enum value: {v:?}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sqlx(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Sqlx(e)
    }
}

type Logf = Box<dyn Fn(&str, &[&dyn std::fmt::Debug]) + Send + Sync>;

static LOGF: std::sync::RwLock<Option<Logf>> = std::sync::RwLock::new(None);

/// Replace the statement logger used by generated calls.
pub fn set_logf<F>(f: F)
where
    F: Fn(&str, &[&dyn std::fmt::Debug]) + Send + Sync + 'static,
{
    if let Ok(mut slot) = LOGF.write() {
        *slot = Some(Box::new(f));
    }
}

/// Log a statement and its arguments through the configured logger.
pub fn logf(sqlstr: &str, args: &[&dyn std::fmt::Debug]) {
    if let Ok(slot) = LOGF.read() {
        if let Some(f) = slot.as_ref() {
            f(sqlstr, args);
        }
    }
}
"#;

/// Whether the record type carries `_exists`/`_deleted` state (only CRUD
/// records do; PK-less typedefs stay plain).
fn has_state(table: &Table) -> bool {
    !table.primary_keys.is_empty() && table.kind != "query"
}

/// Render a record typedef, with CRUD methods when the table has a
/// primary key.
pub fn render_typedef(f: &Funcs<'_>, table: &Table) -> String {
    let name = &table.rust_name;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "/// {name} represents a row from '{}'.",
        f.schema(&table.sql_name)
    );
    out.push_str("#[derive(Debug, Clone, Default, PartialEq, pgcraft_row::Row)]\n");
    let _ = writeln!(out, "pub struct {name} {{");
    for (i, field) in table.fields.iter().enumerate() {
        out.push_str(&f.field_decl(field, i + 1, "    "));
    }
    if has_state(table) {
        out.push_str("    // record state, maintained by the generated methods\n");
        out.push_str("    pub(crate) _exists: bool,\n");
        out.push_str("    pub(crate) _deleted: bool,\n");
    }
    out.push_str("}\n");

    if !has_state(table) {
        return out;
    }

    let _ = writeln!(out, "\nimpl {name} {{");
    let _ = writeln!(
        out,
        "    /// Whether the {name} exists in the database.\n    pub fn exists(&self) -> bool {{\n        self._exists\n    }}\n"
    );
    let _ = writeln!(
        out,
        "    /// Whether the {name} has been marked for deletion.\n    pub fn deleted(&self) -> bool {{\n        self._deleted\n    }}"
    );

    render_insert(f, table, &mut out);
    if table.non_primary().is_empty() {
        out.push_str(
            "\n    // Update, save and upsert omitted: every column is part of the primary key.\n",
        );
    } else {
        render_update(f, table, &mut out);
        render_save(f, table, &mut out);
        render_upsert(f, table, &mut out);
    }
    render_delete(f, table, &mut out);

    out.push_str("}\n");
    out
}

/// Signature + body opener for a generated method.
fn method_open(f: &Funcs<'_>, out: &mut String, doc: &str, base: &str, receiver: &str) {
    let name = f.impl_name(base);
    let _ = writeln!(out, "\n    /// {doc}");
    let _ = writeln!(
        out,
        "    pub async fn {name}<'e, E: sqlx::PgExecutor<'e>>({receiver}, {}db: E) -> Result<(), Error> {{",
        f.ctx_param()
    );
}

/// Context-free delegating wrapper emitted in both-mode.
fn method_wrapper(f: &Funcs<'_>, out: &mut String, doc: &str, base: &str, receiver: &str) {
    if !f.both() {
        return;
    }
    let _ = writeln!(out, "\n    /// {doc} Uses a default context.");
    let _ = writeln!(
        out,
        "    pub async fn {base}<'e, E: sqlx::PgExecutor<'e>>({receiver}, db: E) -> Result<(), Error> {{\n        self.{base}_ctx(&Context::default(), db).await\n    }}"
    );
}

fn push_chain(out: &mut String, first: &str, binds: &[String], last: &str) {
    let _ = writeln!(out, "        {first}");
    for bind in binds {
        let _ = writeln!(out, "            {bind}");
    }
    let _ = writeln!(out, "            {last}");
    out.push_str("            .await?;\n");
}

fn render_insert(f: &Funcs<'_>, table: &Table, out: &mut String) {
    let name = &table.rust_name;
    let doc = format!("Insert the {name} into the database.");
    method_open(f, out, &doc, "insert", "&mut self");
    out.push_str("        match (self._exists, self._deleted) {\n");
    out.push_str("            (true, _) => return Err(Error::Insert(InsertError::AlreadyExists)),\n");
    out.push_str("            (_, true) => return Err(Error::Insert(InsertError::MarkedForDeletion)),\n");
    out.push_str("            _ => {}\n        }\n");
    if f.has_ctx() {
        out.push_str("        ctx.ensure()?;\n");
    }
    let _ = writeln!(out, "        {}", f.sqlstr("insert", table));
    let seq: Vec<&str> = table
        .fields
        .iter()
        .filter(|x| x.is_sequence)
        .map(|x| x.rust_name.as_str())
        .collect();
    let fields: Vec<&Field> = table.fields.iter().collect();
    let _ = writeln!(out, "        {}", f.logf("self.", &fields, &seq));
    let binds = f.insert_binds(table, "self.");
    match table.sequence() {
        Some(s) if !table.manual => {
            push_chain(
                out,
                &format!("self.{} = sqlx::query_scalar(sqlstr)", s.rust_name),
                &binds,
                ".fetch_one(db)",
            );
        }
        _ => {
            push_chain(out, "sqlx::query(sqlstr)", &binds, ".execute(db)");
        }
    }
    out.push_str("        self._exists = true;\n        Ok(())\n    }\n");
    method_wrapper(f, out, &doc, "insert", "&mut self");
}

fn render_update(f: &Funcs<'_>, table: &Table, out: &mut String) {
    let name = &table.rust_name;
    let doc = format!("Update the {name} in the database.");
    method_open(f, out, &doc, "update", "&self");
    out.push_str("        match (self._exists, self._deleted) {\n");
    out.push_str("            (false, _) => return Err(Error::Update(UpdateError::DoesNotExist)),\n");
    out.push_str("            (_, true) => return Err(Error::Update(UpdateError::MarkedForDeletion)),\n");
    out.push_str("            _ => {}\n        }\n");
    if f.has_ctx() {
        out.push_str("        ctx.ensure()?;\n");
    }
    let _ = writeln!(out, "        {}", f.sqlstr("update", table));
    let _ = writeln!(out, "        {}", f.logf_update(table));
    push_chain(
        out,
        "sqlx::query(sqlstr)",
        &f.update_binds(table, "self."),
        ".execute(db)",
    );
    out.push_str("        Ok(())\n    }\n");
    method_wrapper(f, out, &doc, "update", "&self");
}

fn render_save(f: &Funcs<'_>, table: &Table, out: &mut String) {
    let name = &table.rust_name;
    let doc = format!("Save the {name}: update when it exists, insert otherwise.");
    method_open(f, out, &doc, "save", "&mut self");
    let ctx = f.ctx_arg();
    let insert = f.impl_name("insert");
    let update = f.impl_name("update");
    let _ = writeln!(
        out,
        "        if self._exists {{\n            self.{update}({ctx}db).await\n        }} else {{\n            self.{insert}({ctx}db).await\n        }}\n    }}"
    );
    method_wrapper(f, out, &doc, "save", "&mut self");
}

fn render_upsert(f: &Funcs<'_>, table: &Table, out: &mut String) {
    let name = &table.rust_name;
    let doc = format!("Upsert the {name} over its primary key conflict.");
    method_open(f, out, &doc, "upsert", "&mut self");
    out.push_str("        if self._deleted {\n            return Err(Error::Upsert(UpsertError::MarkedForDeletion));\n        }\n");
    if f.has_ctx() {
        out.push_str("        ctx.ensure()?;\n");
    }
    let _ = writeln!(out, "        {}", f.sqlstr("upsert", table));
    let fields: Vec<&Field> = table.fields.iter().collect();
    let _ = writeln!(out, "        {}", f.logf("self.", &fields, &[]));
    let binds = f.binds("self.", &fields, &[]);
    match table.sequence() {
        Some(s) if !table.manual => {
            push_chain(
                out,
                &format!("self.{} = sqlx::query_scalar(sqlstr)", s.rust_name),
                &binds,
                ".fetch_one(db)",
            );
        }
        _ => {
            push_chain(out, "sqlx::query(sqlstr)", &binds, ".execute(db)");
        }
    }
    out.push_str("        self._exists = true;\n        Ok(())\n    }\n");
    method_wrapper(f, out, &doc, "upsert", "&mut self");
}

fn render_delete(f: &Funcs<'_>, table: &Table, out: &mut String) {
    let name = &table.rust_name;
    let doc = format!("Delete the {name} from the database.");
    method_open(f, out, &doc, "delete", "&mut self");
    out.push_str("        match (self._exists, self._deleted) {\n");
    out.push_str("            (false, _) => return Ok(()),\n");
    out.push_str("            (_, true) => return Ok(()),\n");
    out.push_str("            _ => {}\n        }\n");
    if f.has_ctx() {
        out.push_str("        ctx.ensure()?;\n");
    }
    let _ = writeln!(out, "        {}", f.sqlstr("delete", table));
    let _ = writeln!(out, "        {}", f.logf_pkeys(table));
    let pk_fields: Vec<&Field> = table.primary_keys.iter().collect();
    push_chain(
        out,
        "sqlx::query(sqlstr)",
        &f.binds("self.", &pk_fields, &[]),
        ".execute(db)",
    );
    out.push_str("        self._deleted = true;\n        Ok(())\n    }\n");
    method_wrapper(f, out, &doc, "delete", "&mut self");
}

/// Construct a record from a fetched row by ordinal.
fn row_construction(table: &Table, indent: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{indent}{} {{", table.rust_name);
    for (i, field) in table.fields.iter().enumerate() {
        let _ = writeln!(out, "{indent}    {}: row.try_get({i})?,", field.rust_name);
    }
    if has_state(table) {
        let _ = writeln!(out, "{indent}    _exists: true,");
        let _ = writeln!(out, "{indent}    _deleted: false,");
    }
    let _ = writeln!(out, "{indent}}}");
    out
}

/// Render an index lookup function: one record for unique indexes, a
/// vector otherwise. A unique lookup miss surfaces the driver's no-rows
/// sentinel through `Error::Sqlx`.
pub fn render_index(f: &Funcs<'_>, index: &Index) -> String {
    let table = &index.table;
    let name = &table.rust_name;
    let fields: Vec<&Field> = index.fields.iter().collect();
    let params = f.params(&fields, true);
    let ret = if index.is_unique {
        name.clone()
    } else {
        format!("Vec<{name}>")
    };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "/// {} retrieves {} from '{}' as [`{name}`].",
        index.func_name,
        if index.is_unique { "a row" } else { "rows" },
        f.schema(&table.sql_name)
    );
    let _ = writeln!(out, "///\n/// Generated from index '{}'.", index.sql_name);
    let impl_name = f.impl_name(&index.func_name);
    let _ = writeln!(
        out,
        "pub async fn {impl_name}<'e, E: sqlx::PgExecutor<'e>>({}db: E, {params}) -> Result<{ret}, Error> {{",
        f.ctx_param()
    );
    if f.has_ctx() {
        out.push_str("    ctx.ensure()?;\n");
    }
    let _ = writeln!(out, "    {}", f.sqlstr_index(index));
    let _ = writeln!(out, "    {}", f.logf("", &fields, &[]));
    let binds = f.binds("", &fields, &[]);
    if index.is_unique {
        out.push_str("    let row = sqlx::query(sqlstr)\n");
        for bind in &binds {
            let _ = writeln!(out, "        {bind}");
        }
        out.push_str("        .fetch_one(db)\n        .await?;\n");
        let _ = writeln!(
            out,
            "    Ok({})",
            row_construction(table, "    ").trim_start().trim_end()
        );
    } else {
        out.push_str("    let rows = sqlx::query(sqlstr)\n");
        for bind in &binds {
            let _ = writeln!(out, "        {bind}");
        }
        out.push_str("        .fetch_all(db)\n        .await?;\n");
        out.push_str("    let mut res = Vec::with_capacity(rows.len());\n");
        out.push_str("    for row in rows {\n");
        let _ = writeln!(out, "        res.push({});", row_construction(table, "        ").trim_start().trim_end());
        out.push_str("    }\n    Ok(res)\n");
    }
    out.push_str("}\n");

    if f.both() {
        let args = f.params(&fields, false);
        let _ = writeln!(
            out,
            "\n/// {} with a default context.\npub async fn {}<'e, E: sqlx::PgExecutor<'e>>(db: E, {params}) -> Result<{ret}, Error> {{\n    {impl_name}(&Context::default(), db, {args}).await\n}}",
            index.func_name, index.func_name
        );
    }
    out
}

/// Render a foreign key accessor method delegating to the referenced
/// table's lookup function, coercing field types where they differ.
pub fn render_foreign_key(f: &Funcs<'_>, fk: &ForeignKey) -> String {
    let mut args = Vec::with_capacity(fk.fields.len());
    for (field, ref_field) in fk.fields.iter().zip(fk.ref_fields.iter()) {
        let mut expr = format!("self.{}", field.rust_name);
        if field.ty == "String" {
            expr.push_str(".clone()");
        }
        if field.ty != ref_field.ty {
            expr = format!("{}::from({expr})", ref_field.ty);
        }
        args.push(expr);
    }

    let impl_name = f.impl_name(&fk.method_name);
    let ref_impl = f.impl_name(&fk.ref_func);
    let mut out = String::new();
    let _ = writeln!(out, "impl {} {{", fk.table.rust_name);
    let _ = writeln!(
        out,
        "    /// {} returns the [`{}`] referenced by this {}'s {} ({}).",
        fk.method_name,
        fk.ref_table,
        fk.table.rust_name,
        fk.fields
            .iter()
            .map(|x| x.sql_name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        fk.sql_name
    );
    let _ = writeln!(
        out,
        "    pub async fn {impl_name}<'e, E: sqlx::PgExecutor<'e>>(&self, {}db: E) -> Result<{}, Error> {{",
        f.ctx_param(),
        fk.ref_table
    );
    let _ = writeln!(
        out,
        "        {ref_impl}({}db, {}).await",
        f.ctx_arg(),
        args.join(", ")
    );
    out.push_str("    }\n");

    if f.both() {
        let _ = writeln!(
            out,
            "\n    /// {} with a default context.\n    pub async fn {}<'e, E: sqlx::PgExecutor<'e>>(&self, db: E) -> Result<{}, Error> {{\n        self.{impl_name}(&Context::default(), db).await\n    }}",
            fk.method_name, fk.method_name, fk.ref_table
        );
    }
    out.push_str("}\n");
    out
}

/// Render a database enum as a Rust enum with Display/FromStr and codec
/// impls. The first value is the type's default.
pub fn render_enum(f: &Funcs<'_>, e: &Enum) -> String {
    let name = &e.rust_name;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "/// {name} is the '{}' enum type from schema '{}'.",
        e.sql_name, f.cfg.schema
    );
    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
    let _ = writeln!(out, "pub enum {name} {{");
    for value in &e.values {
        let _ = writeln!(out, "    /// '{}'", value.sql_name);
        match value.const_value {
            Some(n) => {
                let _ = writeln!(out, "    {} = {n},", value.rust_name);
            }
            None => {
                let _ = writeln!(out, "    {},", value.rust_name);
            }
        }
    }
    out.push_str("}\n\n");

    let _ = writeln!(out, "impl {name} {{");
    out.push_str("    /// The SQL spelling of the value.\n");
    out.push_str("    pub fn as_str(&self) -> &'static str {\n        match self {\n");
    for value in &e.values {
        let _ = writeln!(
            out,
            "            {name}::{} => \"{}\",",
            value.rust_name, value.sql_name
        );
    }
    out.push_str("        }\n    }\n}\n\n");

    if let Some(first) = e.values.first() {
        let _ = writeln!(
            out,
            "impl Default for {name} {{\n    fn default() -> Self {{\n        {name}::{}\n    }}\n}}\n",
            first.rust_name
        );
    }

    let _ = writeln!(
        out,
        "impl std::fmt::Display for {name} {{\n    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{\n        f.write_str(self.as_str())\n    }}\n}}\n"
    );

    let _ = writeln!(out, "impl std::str::FromStr for {name} {{");
    out.push_str("    type Err = Error;\n\n");
    out.push_str("    fn from_str(s: &str) -> Result<Self, Self::Err> {\n        match s {\n");
    for value in &e.values {
        let _ = writeln!(
            out,
            "            \"{}\" => Ok({name}::{}),",
            value.sql_name, value.rust_name
        );
    }
    out.push_str("            other => Err(Error::InvalidEnum(other.to_owned())),\n");
    out.push_str("        }\n    }\n}\n\n");

    // Participate in the row codec as a text value.
    let _ = writeln!(
        out,
        "impl pgcraft_row::FromRowText for {name} {{\n    fn from_row_text(s: &str) -> pgcraft_row::RowResult<Self> {{\n        s.parse()\n            .map_err(|_| pgcraft_row::Error::mismatch(s, \"{name}\", \"invalid enum value\"))\n    }}\n}}\n"
    );
    let _ = writeln!(
        out,
        "impl pgcraft_row::ToRowText for {name} {{\n    fn to_row_text(&self) -> pgcraft_row::RowResult<String> {{\n        Ok(pgcraft_row::writer::escape(self.as_str()))\n    }}\n\n    fn is_zero(&self) -> bool {{\n        *self == Self::default()\n    }}\n}}"
    );
    out
}

/// Render an overload group of stored routines.
pub fn render_procs(f: &Funcs<'_>, procs: &[Proc]) -> String {
    let mut out = String::new();
    for (i, proc) in procs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_proc(f, proc, &mut out);
    }
    out
}

fn render_proc(f: &Funcs<'_>, proc: &Proc, out: &mut String) {
    let kind = match proc.kind {
        ProcKind::Function => "stored function",
        ProcKind::Procedure => "stored procedure",
    };
    let params: Vec<&Field> = proc.params.iter().collect();
    let param_list = f.params(&params, true);
    let sep = if param_list.is_empty() { "" } else { ", " };

    let ret = if proc.void || proc.returns.is_empty() {
        "()".to_owned()
    } else if proc.returns.len() == 1 {
        proc.returns[0].ty.clone()
    } else {
        format!(
            "({})",
            proc.returns
                .iter()
                .map(|r| r.ty.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    let _ = writeln!(
        out,
        "/// {} invokes the {kind} '{}'.",
        proc.fn_name(),
        f.schema(&proc.sql_name)
    );
    if !proc.signature.is_empty() {
        let _ = writeln!(out, "///\n/// Signature: `{}`.", proc.signature);
    }
    let impl_name = f.impl_name(proc.fn_name());
    let _ = writeln!(
        out,
        "pub async fn {impl_name}<'e, E: sqlx::PgExecutor<'e>>({}db: E{sep}{param_list}) -> Result<{ret}, Error> {{",
        f.ctx_param()
    );
    if f.has_ctx() {
        out.push_str("    ctx.ensure()?;\n");
    }
    let _ = writeln!(out, "    {}", f.sqlstr_proc(proc));
    let _ = writeln!(out, "    {}", f.logf("", &params, &[]));
    let binds = f.binds("", &params, &[]);
    if proc.void || proc.returns.is_empty() {
        out.push_str("    sqlx::query(sqlstr)\n");
        for bind in &binds {
            let _ = writeln!(out, "        {bind}");
        }
        out.push_str("        .execute(db)\n        .await?;\n    Ok(())\n");
    } else {
        out.push_str("    let row = sqlx::query(sqlstr)\n");
        for bind in &binds {
            let _ = writeln!(out, "        {bind}");
        }
        out.push_str("        .fetch_one(db)\n        .await?;\n");
        if proc.returns.len() == 1 {
            out.push_str("    Ok(row.try_get(0)?)\n");
        } else {
            let gets: Vec<String> = (0..proc.returns.len())
                .map(|i| format!("row.try_get({i})?"))
                .collect();
            let _ = writeln!(out, "    Ok(({}))", gets.join(", "));
        }
    }
    out.push_str("}\n");

    if f.both() {
        let args = f.params(&params, false);
        let arg_sep = if args.is_empty() { "" } else { ", " };
        let _ = writeln!(
            out,
            "\n/// {} with a default context.\npub async fn {}<'e, E: sqlx::PgExecutor<'e>>(db: E{sep}{param_list}) -> Result<{ret}, Error> {{\n    {impl_name}(&Context::default(), db{arg_sep}{args}).await\n}}",
            proc.fn_name(),
            proc.fn_name()
        );
    }
}

/// Render a custom query function.
pub fn render_query(f: &Funcs<'_>, q: &Query) -> String {
    let table = &q.table;
    let params: Vec<&crate::convert::QueryParam> = q.params.iter().collect();
    let bound: Vec<&crate::convert::QueryParam> =
        params.iter().filter(|p| !p.interpolate).copied().collect();
    let param_list = params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let sep = if param_list.is_empty() { "" } else { ", " };

    let ret = if q.exec {
        "sqlx::postgres::PgQueryResult".to_owned()
    } else if q.flat {
        format!(
            "({})",
            table
                .fields
                .iter()
                .map(|x| x.ty.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    } else if q.one {
        table.rust_name.clone()
    } else {
        format!("Vec<{}>", table.rust_name)
    };

    let mut out = String::new();
    for comment in &q.comments {
        let _ = writeln!(out, "/// {comment}");
    }
    if q.comments.is_empty() {
        let _ = writeln!(out, "/// {} runs a custom query.", q.fn_name);
    }
    let impl_name = f.impl_name(&q.fn_name);
    let _ = writeln!(
        out,
        "pub async fn {impl_name}<'e, E: sqlx::PgExecutor<'e>>({}db: E{sep}{param_list}) -> Result<{ret}, Error> {{",
        f.ctx_param()
    );
    if f.has_ctx() {
        out.push_str("    ctx.ensure()?;\n");
    }

    // Interpolated parameters are spliced with format!; bound parameters
    // keep their placeholders.
    let interpolated = q.interpolate || params.iter().any(|p| p.interpolate);
    if interpolated {
        let mut text = q.query.join(" ");
        for p in &params {
            text = text.replace(&format!("%%{}%%", p.name), &format!("{{{}}}", p.name));
        }
        let text = text.replace('\\', "\\\\").replace('"', "\\\"");
        let _ = writeln!(out, "    let sqlstr = format!(\"{text}\");");
        let logf_args: Vec<String> = bound.iter().map(|p| format!("&{}", p.name)).collect();
        let _ = writeln!(out, "    logf(&sqlstr, &[{}]);", logf_args.join(", "));
        out.push_str("    let query = sqlx::query(&sqlstr)");
    } else {
        out.push_str("    let sqlstr = concat!(\n");
        for (i, line) in q.query.iter().enumerate() {
            let escaped = line.replace('\\', "\\\\").replace('"', "\\\"");
            let trailing = if i + 1 < q.query.len() { " " } else { "" };
            let _ = writeln!(out, "        \"{escaped}{trailing}\",");
        }
        out.push_str("    );\n");
        let logf_args: Vec<String> = bound.iter().map(|p| format!("&{}", p.name)).collect();
        let _ = writeln!(out, "    logf(sqlstr, &[{}]);", logf_args.join(", "));
        out.push_str("    let query = sqlx::query(sqlstr)");
    }
    for p in &bound {
        let _ = write!(out, "\n        .bind(&{})", p.name);
    }
    out.push_str(";\n");

    if q.exec {
        out.push_str("    Ok(query.execute(db).await?)\n");
    } else if q.flat {
        out.push_str("    let row = query.fetch_one(db).await?;\n");
        let gets: Vec<String> = (0..table.fields.len())
            .map(|i| format!("row.try_get({i})?"))
            .collect();
        let _ = writeln!(out, "    Ok(({}))", gets.join(", "));
    } else if q.one {
        out.push_str("    let row = query.fetch_one(db).await?;\n");
        let _ = writeln!(
            out,
            "    Ok({})",
            row_construction(table, "    ").trim_start().trim_end()
        );
    } else {
        out.push_str("    let rows = query.fetch_all(db).await?;\n");
        out.push_str("    let mut res = Vec::with_capacity(rows.len());\n");
        out.push_str("    for row in rows {\n");
        let _ = writeln!(
            out,
            "        res.push({});",
            row_construction(table, "        ").trim_start().trim_end()
        );
        out.push_str("    }\n    Ok(res)\n");
    }
    out.push_str("}\n");
    out
}
