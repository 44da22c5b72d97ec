//! Conversion from the schema input model to the emission model.
//!
//! The emission model carries everything the partials need pre-computed:
//! Rust identifiers, type spellings, zero literals, lookup function names
//! and overload disambiguation.

use crate::config::Config;
use crate::names::NameMapper;
use crate::schema;
use crate::schema::ProcKind;
use crate::typemap::map_type;

/// Shared conversion context: configuration plus the per-run name mapper.
pub struct GenCtx<'a> {
    pub cfg: &'a Config,
    pub names: &'a NameMapper,
}

/// A converted column, parameter or return value.
#[derive(Debug, Clone)]
pub struct Field {
    pub rust_name: String,
    pub sql_name: String,
    pub ty: String,
    pub zero: String,
    pub is_primary: bool,
    pub is_sequence: bool,
    pub comment: String,
}

/// A converted table, view, or query result type.
#[derive(Debug, Clone)]
pub struct Table {
    /// `table` or `view`.
    pub kind: String,
    pub rust_name: String,
    pub sql_name: String,
    pub primary_keys: Vec<Field>,
    pub fields: Vec<Field>,
    pub manual: bool,
}

impl Table {
    /// The sequence field, if the table has one.
    pub fn sequence(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_sequence)
    }

    /// Fields that are not part of the primary key.
    pub fn non_primary(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| !f.is_primary).collect()
    }
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub rust_name: String,
    pub sql_name: String,
    pub const_value: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub rust_name: String,
    pub sql_name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone)]
pub struct Proc {
    pub kind: ProcKind,
    pub rust_name: String,
    pub overloaded_name: String,
    pub sql_name: String,
    pub signature: String,
    pub params: Vec<Field>,
    pub returns: Vec<Field>,
    pub void: bool,
    pub overloaded: bool,
}

impl Proc {
    /// The function name to emit, disambiguated when overloaded.
    pub fn fn_name(&self) -> &str {
        if self.overloaded {
            &self.overloaded_name
        } else {
            &self.rust_name
        }
    }
}

#[derive(Debug, Clone)]
pub struct Index {
    pub sql_name: String,
    pub func_name: String,
    pub table: Table,
    pub fields: Vec<Field>,
    pub is_unique: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub sql_name: String,
    /// Accessor method name on the owning table's record type.
    pub method_name: String,
    pub table: Table,
    pub fields: Vec<Field>,
    /// Rust type name of the referenced record.
    pub ref_table: String,
    pub ref_fields: Vec<Field>,
    /// The referenced table's lookup function this accessor delegates to.
    pub ref_func: String,
}

#[derive(Debug, Clone)]
pub struct QueryParam {
    pub name: String,
    pub ty: String,
    pub interpolate: bool,
    pub join: bool,
}

#[derive(Debug, Clone)]
pub struct Query {
    pub fn_name: String,
    pub query: Vec<String>,
    pub comments: Vec<String>,
    pub params: Vec<QueryParam>,
    pub one: bool,
    pub flat: bool,
    pub exec: bool,
    pub interpolate: bool,
    pub table: Table,
}

/// Convert a schema field.
pub fn convert_field(ctx: &GenCtx<'_>, f: &schema::Field) -> Field {
    let (ty, zero) = map_type(ctx.cfg, ctx.names, &f.ty);
    Field {
        rust_name: ctx.names.ident(&f.name, &ctx.cfg.conflict),
        sql_name: f.name.clone(),
        ty,
        zero,
        is_primary: f.is_primary,
        is_sequence: f.is_sequence,
        comment: f.comment.clone(),
    }
}

pub fn convert_fields(ctx: &GenCtx<'_>, fields: &[schema::Field]) -> Vec<Field> {
    fields.iter().map(|f| convert_field(ctx, f)).collect()
}

/// Convert a table or view.
pub fn convert_table(ctx: &GenCtx<'_>, t: &schema::Table, kind: &str) -> Table {
    let fields = convert_fields(ctx, &t.columns);
    let primary_keys = fields.iter().filter(|f| f.is_primary).cloned().collect();
    Table {
        kind: kind.to_owned(),
        rust_name: ctx.names.camel_export(&[&ctx.names.singularize(&t.name)]),
        sql_name: t.name.clone(),
        primary_keys,
        fields,
        manual: t.manual,
    }
}

/// Convert an enum, stripping a redundant trailing type-name suffix from
/// value names (`open_order_status` on `order_status` becomes `Open`).
pub fn convert_enum(ctx: &GenCtx<'_>, e: &schema::Enum) -> Enum {
    let rust_name = ctx.names.camel_export(&[&e.name]);
    let values = e
        .values
        .iter()
        .map(|v| {
            let mut name = ctx.names.camel_export(&[&v.name.to_lowercase()]);
            if name != rust_name {
                if let Some(stripped) = name.strip_suffix(rust_name.as_str()) {
                    if !stripped.is_empty() {
                        name = stripped.to_owned();
                    }
                }
            }
            EnumValue {
                rust_name: name,
                sql_name: v.name.clone(),
                const_value: v.const_value,
            }
        })
        .collect();
    Enum {
        rust_name,
        sql_name: e.name.clone(),
        values,
    }
}

/// Convert a stored routine. Overload flags are set later, once the whole
/// group has been seen.
pub fn convert_proc(ctx: &GenCtx<'_>, p: &schema::Proc) -> Proc {
    Proc {
        kind: p.kind,
        rust_name: ctx.names.snake(&p.name),
        overloaded_name: overloaded_name(ctx, p),
        sql_name: p.name.clone(),
        signature: p.definition.clone(),
        params: convert_fields(ctx, &p.params),
        returns: convert_fields(ctx, &p.returns),
        void: p.void,
        overloaded: false,
    }
}

/// Build the disambiguated name for an overloaded routine from its
/// parameter names in declaration order; positional parameters (`p0`,
/// `p1`, …) fall back to their SQL type names.
fn overloaded_name(ctx: &GenCtx<'_>, p: &schema::Proc) -> String {
    let base = ctx.names.snake(&p.name);
    let parts: Vec<String> = p
        .params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            if param.name == format!("p{i}") {
                param.ty.ty.to_lowercase().replace(' ', "_")
            } else {
                ctx.names.snake(&param.name)
            }
        })
        .collect();
    match parts.len() {
        0 => base,
        1 => format!("{base}_by_{}", parts[0]),
        n => format!(
            "{base}_by_{}_and_{}",
            parts[..n - 1].join("_"),
            parts[n - 1]
        ),
    }
}

/// Convert an index on a converted table.
pub fn convert_index(ctx: &GenCtx<'_>, table: &Table, i: &schema::Index) -> Index {
    let fields = convert_fields(ctx, &i.fields);
    let func_name = format!(
        "{}_by_{}",
        ctx.names.snake(&table.rust_name),
        fields
            .iter()
            .map(|f| f.rust_name.as_str())
            .collect::<Vec<_>>()
            .join("_")
    );
    Index {
        sql_name: i.name.clone(),
        func_name,
        table: table.clone(),
        fields,
        is_unique: i.is_unique,
        is_primary: i.is_primary,
    }
}

/// Convert a foreign key on a converted table.
pub fn convert_fkey(ctx: &GenCtx<'_>, table: &Table, fk: &schema::ForeignKey) -> ForeignKey {
    let fields = convert_fields(ctx, &fk.fields);
    let ref_fields = convert_fields(ctx, &fk.ref_fields);
    let ref_table = ctx
        .names
        .camel_export(&[&ctx.names.singularize(&fk.ref_table)]);
    let ref_snake = ctx.names.snake(&ref_table);
    let join = |fs: &[Field]| {
        fs.iter()
            .map(|f| f.rust_name.as_str())
            .collect::<Vec<_>>()
            .join("_")
    };
    ForeignKey {
        sql_name: fk.name.clone(),
        method_name: format!("{ref_snake}_by_{}", join(&fields)),
        table: table.clone(),
        fields,
        ref_table,
        ref_func: format!("{ref_snake}_by_{}", join(&ref_fields)),
        ref_fields,
    }
}

/// Build the result type for a custom query. Query type names are used as
/// given, without singularization.
pub fn convert_query_type(ctx: &GenCtx<'_>, q: &schema::Query) -> Table {
    let fields = q
        .fields
        .iter()
        .map(|f| {
            if q.manual_fields {
                // Types were provided by the user, pass them through.
                Field {
                    rust_name: ctx.names.ident(&f.name, &ctx.cfg.conflict),
                    sql_name: ctx.names.snake(&f.name),
                    ty: f.ty.ty.clone(),
                    zero: String::new(),
                    is_primary: false,
                    is_sequence: false,
                    comment: f.comment.clone(),
                }
            } else {
                convert_field(ctx, f)
            }
        })
        .collect();
    Table {
        kind: "query".to_owned(),
        rust_name: q.ty.clone(),
        sql_name: ctx.names.snake(&q.ty),
        primary_keys: Vec::new(),
        fields,
        manual: false,
    }
}

/// Convert a custom query, deriving a function name when none was given.
pub fn convert_query(ctx: &GenCtx<'_>, q: &schema::Query) -> Query {
    let table = convert_query_type(ctx, q);
    let fn_name = if !q.name.is_empty() {
        ctx.names.snake(&q.name)
    } else {
        let mut n = q.ty.clone();
        if !q.one {
            n = ctx.names.pluralize(&n);
        }
        let n = ctx.names.snake(&n);
        if q.params.is_empty() {
            format!("get_{n}")
        } else {
            format!(
                "{n}_by_{}",
                q.params
                    .iter()
                    .map(|p| ctx.names.snake(&p.name))
                    .collect::<Vec<_>>()
                    .join("_")
            )
        }
    };
    Query {
        fn_name,
        query: q.query.clone(),
        comments: q.comments.clone(),
        params: q
            .params
            .iter()
            .map(|p| QueryParam {
                name: ctx.names.ident(&p.name, &ctx.cfg.conflict),
                ty: p.ty.clone(),
                interpolate: p.interpolate,
                join: p.join,
            })
            .collect(),
        one: q.one || q.flat || q.exec,
        flat: q.flat,
        exec: q.exec,
        interpolate: q.interpolate,
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn ctx_parts() -> (Config, NameMapper) {
        (Config::new(), NameMapper::new())
    }

    fn field(name: &str, ty: &str) -> schema::Field {
        schema::Field {
            name: name.into(),
            ty: ColumnType::new(ty),
            ..Default::default()
        }
    }

    #[test]
    fn test_convert_table_names() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let t = schema::Table {
            name: "book_tags".into(),
            columns: vec![field("book_id", "integer"), field("tag_id", "integer")],
            ..Default::default()
        };
        let table = convert_table(&ctx, &t, "table");
        assert_eq!(table.rust_name, "BookTag");
        assert_eq!(table.sql_name, "book_tags");
        assert_eq!(table.fields[0].rust_name, "book_id");
        assert_eq!(table.fields[0].ty, "i32");
    }

    #[test]
    fn test_reserved_column_name() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let converted = convert_field(&ctx, &field("type", "text"));
        assert_eq!(converted.rust_name, "type_val");
        assert_eq!(converted.sql_name, "type");
    }

    #[test]
    fn test_enum_suffix_strip() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let e = schema::Enum {
            name: "order_status".into(),
            values: vec![
                schema::EnumValue {
                    name: "open_order_status".into(),
                    const_value: None,
                },
                schema::EnumValue {
                    name: "closed".into(),
                    const_value: Some(2),
                },
            ],
        };
        let converted = convert_enum(&ctx, &e);
        assert_eq!(converted.rust_name, "OrderStatus");
        assert_eq!(converted.values[0].rust_name, "Open");
        assert_eq!(converted.values[1].rust_name, "Closed");
        assert_eq!(converted.values[1].const_value, Some(2));
    }

    #[test]
    fn test_overloaded_name_from_params() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let p = schema::Proc {
            name: "say_hello".into(),
            params: vec![field("name", "text"), field("greeting", "text")],
            ..Default::default()
        };
        assert_eq!(
            convert_proc(&ctx, &p).overloaded_name,
            "say_hello_by_name_and_greeting"
        );
    }

    #[test]
    fn test_overloaded_name_positional_params() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let p = schema::Proc {
            name: "sync".into(),
            params: vec![field("p0", "timestamp with time zone")],
            ..Default::default()
        };
        assert_eq!(
            convert_proc(&ctx, &p).overloaded_name,
            "sync_by_timestamp_with_time_zone"
        );
    }

    #[test]
    fn test_index_func_name() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let t = schema::Table {
            name: "books".into(),
            columns: vec![field("isbn", "text")],
            ..Default::default()
        };
        let table = convert_table(&ctx, &t, "table");
        let idx = schema::Index {
            name: "books_isbn_key".into(),
            fields: vec![field("isbn", "text")],
            is_unique: true,
            is_primary: false,
        };
        assert_eq!(convert_index(&ctx, &table, &idx).func_name, "book_by_isbn");
    }

    #[test]
    fn test_fkey_names() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let t = schema::Table {
            name: "books".into(),
            columns: vec![field("author_id", "integer")],
            ..Default::default()
        };
        let table = convert_table(&ctx, &t, "table");
        let fk = schema::ForeignKey {
            name: "books_author_id_fkey".into(),
            fields: vec![field("author_id", "integer")],
            ref_table: "authors".into(),
            ref_fields: vec![field("author_id", "integer")],
        };
        let converted = convert_fkey(&ctx, &table, &fk);
        assert_eq!(converted.ref_table, "Author");
        assert_eq!(converted.method_name, "author_by_author_id");
        assert_eq!(converted.ref_func, "author_by_author_id");
    }

    #[test]
    fn test_query_auto_name() {
        let (cfg, names) = ctx_parts();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let q = schema::Query {
            ty: "AuthorName".into(),
            ..Default::default()
        };
        assert_eq!(convert_query(&ctx, &q).fn_name, "get_author_names");

        let q = schema::Query {
            ty: "AuthorName".into(),
            one: true,
            params: vec![schema::QueryParam {
                name: "author_id".into(),
                ty: "i32".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(convert_query(&ctx, &q).fn_name, "author_name_by_author_id");
    }
}
