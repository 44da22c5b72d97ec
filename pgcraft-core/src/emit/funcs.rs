//! Helpers shared by the partial renderers.
//!
//! [`Funcs`] is the closed helper API the partials are written against:
//! naming, signatures, bind lists, logging calls, field declarations, SQL
//! string literals and the positional substitution helper.

use crate::config::{Config, ContextMode};
use crate::convert::{Field, Index, Proc, Table};
use crate::names::{is_reserved, NameMapper};
use crate::sql;
use crate::sql::SqlCtx;

pub struct Funcs<'a> {
    pub cfg: &'a Config,
    pub names: &'a NameMapper,
    pub sql: SqlCtx<'a>,
}

impl<'a> Funcs<'a> {
    pub fn new(cfg: &'a Config, names: &'a NameMapper) -> Self {
        Self {
            cfg,
            names,
            sql: SqlCtx::from_config(cfg),
        }
    }

    // -- context handling ---------------------------------------------------

    /// Whether the primary implementation takes a context handle.
    pub fn has_ctx(&self) -> bool {
        self.cfg.context != ContextMode::Disable
    }

    /// Whether context-free delegating variants are also emitted.
    pub fn both(&self) -> bool {
        self.cfg.context == ContextMode::Both
    }

    /// The name of the primary implementation for `base`; in both-mode the
    /// context variant carries a `_ctx` suffix and the plain name becomes
    /// the delegating wrapper.
    pub fn impl_name(&self, base: &str) -> String {
        if self.both() {
            format!("{base}_ctx")
        } else {
            base.to_owned()
        }
    }

    /// Leading context parameter for generated signatures.
    pub fn ctx_param(&self) -> &'static str {
        if self.has_ctx() {
            "ctx: &Context, "
        } else {
            ""
        }
    }

    /// Leading context argument for generated calls.
    pub fn ctx_arg(&self) -> &'static str {
        if self.has_ctx() {
            "ctx, "
        } else {
            ""
        }
    }

    // -- names and parameters -----------------------------------------------

    /// Comma-joined field references with a prefix: `self.a, self.b`.
    pub fn names(&self, prefix: &str, fields: &[&Field]) -> String {
        fields
            .iter()
            .map(|f| format!("{prefix}{}", f.rust_name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Like [`Self::names`], with some fields ignored by name.
    pub fn names_ignore(&self, prefix: &str, fields: &[&Field], ignore: &[&str]) -> String {
        let kept: Vec<&Field> = fields
            .iter()
            .filter(|f| !ignore.contains(&f.rust_name.as_str()))
            .copied()
            .collect();
        self.names(prefix, &kept)
    }

    /// A parameter list, typed (`isbn: String`) or bare (`isbn`).
    pub fn params(&self, fields: &[&Field], named: bool) -> String {
        fields
            .iter()
            .map(|f| {
                if named {
                    format!("{}: {}", f.rust_name, f.ty)
                } else {
                    f.rust_name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma-joined zero literals.
    pub fn zero(&self, fields: &[&Field]) -> String {
        fields
            .iter()
            .map(|f| f.zero.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Deterministic short identifier for a record type.
    pub fn short(&self, table: &Table) -> String {
        self.names.short(&table.rust_name)
    }

    /// Reserved-identifier predicate, exposed to the partials.
    pub fn check_name(&self, name: &str) -> bool {
        is_reserved(name)
    }

    // -- db calls -----------------------------------------------------------

    /// `.bind(…)` chain segments for the given field references.
    pub fn binds(&self, prefix: &str, fields: &[&Field], ignore: &[&str]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| !ignore.contains(&f.rust_name.as_str()))
            .map(|f| format!(".bind(&{prefix}{})", f.rust_name))
            .collect()
    }

    /// Bind segments for an insert: every column minus the sequence.
    pub fn insert_binds(&self, table: &Table, prefix: &str) -> Vec<String> {
        let seq: Vec<&str> = table
            .fields
            .iter()
            .filter(|f| f.is_sequence)
            .map(|f| f.rust_name.as_str())
            .collect();
        let fields: Vec<&Field> = table.fields.iter().collect();
        self.binds(prefix, &fields, &seq)
    }

    /// Bind segments for an update: non-key columns then primary keys.
    pub fn update_binds(&self, table: &Table, prefix: &str) -> Vec<String> {
        let pks: Vec<&str> = table
            .primary_keys
            .iter()
            .map(|f| f.rust_name.as_str())
            .collect();
        let fields: Vec<&Field> = table.fields.iter().collect();
        let mut binds = self.binds(prefix, &fields, &pks);
        let pk_fields: Vec<&Field> = table.primary_keys.iter().collect();
        binds.extend(self.binds(prefix, &pk_fields, &[]));
        binds
    }

    // -- logging ------------------------------------------------------------

    /// A `logf(sqlstr, …)` call over the given field references.
    pub fn logf(&self, prefix: &str, fields: &[&Field], ignore: &[&str]) -> String {
        let args: Vec<String> = fields
            .iter()
            .filter(|f| !ignore.contains(&f.rust_name.as_str()))
            .map(|f| format!("&{prefix}{}", f.rust_name))
            .collect();
        format!("logf(sqlstr, &[{}]);", args.join(", "))
    }

    /// `logf` over the primary keys only.
    pub fn logf_pkeys(&self, table: &Table) -> String {
        let prefix = "self.";
        let pks: Vec<&Field> = table.primary_keys.iter().collect();
        self.logf(prefix, &pks, &[])
    }

    /// `logf` for an update: non-key columns then primary keys.
    pub fn logf_update(&self, table: &Table) -> String {
        let mut args: Vec<String> = table
            .fields
            .iter()
            .filter(|f| !f.is_primary)
            .map(|f| format!("&self.{}", f.rust_name))
            .collect();
        args.extend(
            table
                .primary_keys
                .iter()
                .map(|f| format!("&self.{}", f.rust_name)),
        );
        format!("logf(sqlstr, &[{}]);", args.join(", "))
    }

    // -- fields -------------------------------------------------------------

    /// Render one struct field declaration, with its attribute from the
    /// field-tag template and the SQL name as a trailing comment.
    pub fn field_decl(&self, field: &Field, ordinal: usize, indent: &str) -> String {
        let mut out = String::new();
        if !self.cfg.field_tag.is_empty() {
            let tag = eval(
                &self.cfg.field_tag,
                &[&field.sql_name, &field.rust_name, &ordinal.to_string()],
            );
            out.push_str(indent);
            out.push_str(&tag);
            out.push('\n');
        }
        let comment = if field.comment.is_empty() {
            field.sql_name.clone()
        } else {
            format!("{} ({})", field.sql_name, field.comment)
        };
        out.push_str(&format!(
            "{indent}pub {}: {}, // {}\n",
            field.rust_name, field.ty, comment
        ));
        out
    }

    // -- sql ----------------------------------------------------------------

    /// A `let sqlstr = "…";` statement for the requested statement kind.
    pub fn sqlstr(&self, kind: &str, table: &Table) -> String {
        let lines = match kind {
            "insert" => sql::build_insert(&self.sql, table),
            "update" => sql::build_update(&self.sql, table),
            "upsert" => sql::build_upsert(&self.sql, table),
            "delete" => sql::build_delete(&self.sql, table),
            other => vec![format!("-- unsupported statement kind: {other}")],
        };
        sql_literal(&lines)
    }

    /// The sqlstr statement for an index lookup.
    pub fn sqlstr_index(&self, index: &Index) -> String {
        sql_literal(&sql::build_index_lookup(&self.sql, index))
    }

    /// The sqlstr statement for a routine call.
    pub fn sqlstr_proc(&self, proc: &Proc) -> String {
        sql_literal(&sql::build_proc_call(&self.sql, proc))
    }

    /// A schema-qualified identifier, honoring the escape switches.
    pub fn schema(&self, name: &str) -> String {
        self.sql.qualified(name)
    }
}

/// Join builder lines into a `let sqlstr = "…";` statement, escaping for
/// the surrounding Rust string literal.
fn sql_literal(lines: &[String]) -> String {
    let joined = lines.concat().replace('\\', "\\\\").replace('"', "\\\"");
    format!("let sqlstr = \"{joined}\";")
}

/// Positional substitution: replaces `%[1]`, `%[2]`, … with the given
/// arguments.
pub fn eval(template: &str, args: &[&str]) -> String {
    let mut out = template.to_owned();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("%[{}]", i + 1), arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameMapper;

    #[test]
    fn test_eval() {
        assert_eq!(eval("a %[1] b %[2] a %[1]", &["x", "y"]), "a x b y a x");
        assert_eq!(eval("no placeholders", &["x"]), "no placeholders");
    }

    fn sample_table() -> Table {
        Table {
            kind: "table".into(),
            rust_name: "Tag".into(),
            sql_name: "tags".into(),
            primary_keys: vec![Field {
                rust_name: "tag_id".into(),
                sql_name: "tag_id".into(),
                ty: "i32".into(),
                zero: "0".into(),
                is_primary: true,
                is_sequence: true,
                comment: String::new(),
            }],
            fields: vec![
                Field {
                    rust_name: "tag_id".into(),
                    sql_name: "tag_id".into(),
                    ty: "i32".into(),
                    zero: "0".into(),
                    is_primary: true,
                    is_sequence: true,
                    comment: String::new(),
                },
                Field {
                    rust_name: "tag_name".into(),
                    sql_name: "tag_name".into(),
                    ty: "String".into(),
                    zero: "String::new()".into(),
                    is_primary: false,
                    is_sequence: false,
                    comment: String::new(),
                },
            ],
            manual: false,
        }
    }

    #[test]
    fn test_insert_binds_skip_sequence() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let f = Funcs::new(&cfg, &names);
        assert_eq!(
            f.insert_binds(&sample_table(), "self."),
            vec![".bind(&self.tag_name)"]
        );
    }

    #[test]
    fn test_update_binds_order() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let f = Funcs::new(&cfg, &names);
        assert_eq!(
            f.update_binds(&sample_table(), "self."),
            vec![".bind(&self.tag_name)", ".bind(&self.tag_id)"]
        );
    }

    #[test]
    fn test_logf_update() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let f = Funcs::new(&cfg, &names);
        assert_eq!(
            f.logf_update(&sample_table()),
            "logf(sqlstr, &[&self.tag_name, &self.tag_id]);"
        );
    }

    #[test]
    fn test_field_decl_default_tag() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let f = Funcs::new(&cfg, &names);
        let decl = f.field_decl(&sample_table().fields[1], 2, "    ");
        assert_eq!(decl, "    #[row(2)]\n    pub tag_name: String, // tag_name\n");
    }

    #[test]
    fn test_impl_name_context_modes() {
        let names = NameMapper::new();

        let mut cfg = Config::new();
        cfg.apply("context", "only").unwrap();
        assert_eq!(Funcs::new(&cfg, &names).impl_name("insert"), "insert");

        cfg.apply("context", "both").unwrap();
        assert_eq!(Funcs::new(&cfg, &names).impl_name("insert"), "insert_ctx");
    }
}
