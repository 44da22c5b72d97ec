//! Emission planning.
//!
//! Walks a schema — enums, then grouped routines, then tables and views
//! with their indexes and foreign keys — and produces the ordered list of
//! template jobs, each targeting a per-entity destination file.

use std::collections::BTreeMap;

use crate::convert::{
    convert_enum, convert_fkey, convert_index, convert_proc, convert_query, convert_table, Enum,
    ForeignKey, GenCtx, Index, Proc, Query, Table,
};
use crate::schema;
use crate::schema::ProcKind;

/// Extension carried by every emitted file.
pub const EXT: &str = ".gen.rs";

/// Destination of the one-time shared partial.
pub fn db_dest() -> String {
    format!("db{EXT}")
}

/// Partial kinds, ranked in their within-file emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Partial {
    Header,
    Db,
    Enum,
    Proc,
    Typedef,
    Query,
    Index,
    ForeignKey,
}

/// Payload routed to the partial renderer.
pub enum JobData {
    None,
    Enum(Enum),
    Procs(Vec<Proc>),
    Table(Table),
    Index(Index),
    ForeignKey(ForeignKey),
    Query(Box<Query>),
}

/// One template invocation targeting a destination file.
pub struct Job {
    pub dest: String,
    pub partial: Partial,
    pub sort_type: String,
    pub sort_name: String,
    pub data: JobData,
}

fn enum_dest(ctx: &GenCtx<'_>, name: &str) -> String {
    format!("{}{EXT}", ctx.names.camel_export(&[name]).to_lowercase())
}

fn proc_dest(ctx: &GenCtx<'_>, kind: ProcKind, name: &str) -> String {
    let prefix = match kind {
        ProcKind::Procedure => "sp_",
        ProcKind::Function => "sf_",
    };
    format!(
        "{prefix}{}{EXT}",
        ctx.names.camel_export(&[name]).to_lowercase()
    )
}

fn table_dest(ctx: &GenCtx<'_>, name: &str) -> String {
    format!("{}{EXT}", ctx.names.snake(&ctx.names.singularize(name)))
}

fn query_dest(ty: &str) -> String {
    format!("{}{EXT}", ty.to_lowercase())
}

/// Enumerate the destination files a schema-mode run will produce,
/// without the shared partial.
pub fn schema_file_names(ctx: &GenCtx<'_>, s: &schema::Schema) -> Vec<String> {
    let mut files = Vec::new();
    for e in &s.enums {
        files.push(enum_dest(ctx, &e.name));
    }
    let mut seen = Vec::new();
    for p in &s.procs {
        let dest = proc_dest(ctx, p.kind, &p.name);
        if !seen.contains(&dest) {
            seen.push(dest.clone());
            files.push(dest);
        }
    }
    for t in s.tables.iter().chain(s.views.iter()) {
        files.push(table_dest(ctx, &t.name));
    }
    files
}

/// Plan one schema: enums, routine groups, tables then views, and for
/// each table its indexes and foreign keys.
pub fn plan_schema(ctx: &GenCtx<'_>, s: &schema::Schema) -> Vec<Job> {
    let mut jobs = Vec::new();

    for e in &s.enums {
        let converted = convert_enum(ctx, e);
        jobs.push(Job {
            dest: enum_dest(ctx, &e.name),
            partial: Partial::Enum,
            sort_type: "enum".into(),
            sort_name: converted.rust_name.clone(),
            data: JobData::Enum(converted),
        });
    }

    // Group routines by generated name; a group of more than one marks
    // every member overloaded. Groups keep first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<Proc>> = BTreeMap::new();
    for p in &s.procs {
        let converted = convert_proc(ctx, p);
        let key = converted.rust_name.clone();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(converted);
    }
    for key in order {
        let Some(mut procs) = groups.remove(&key) else {
            continue;
        };
        let overloaded = procs.len() > 1;
        for p in &mut procs {
            p.overloaded = overloaded;
        }
        let kind = procs[0].kind;
        jobs.push(Job {
            dest: proc_dest(ctx, kind, &procs[0].sql_name),
            partial: Partial::Proc,
            sort_type: "proc".into(),
            sort_name: key,
            data: JobData::Procs(procs),
        });
    }

    for (t, kind) in s
        .tables
        .iter()
        .map(|t| (t, "table"))
        .chain(s.views.iter().map(|v| (v, "view")))
    {
        let table = convert_table(ctx, t, kind);
        let dest = table_dest(ctx, &t.name);
        jobs.push(Job {
            dest: dest.clone(),
            partial: Partial::Typedef,
            sort_type: kind.into(),
            sort_name: table.rust_name.clone(),
            data: JobData::Table(table.clone()),
        });
        for i in &t.indexes {
            let index = convert_index(ctx, &table, i);
            jobs.push(Job {
                dest: dest.clone(),
                partial: Partial::Index,
                sort_type: kind.into(),
                sort_name: index.sql_name.clone(),
                data: JobData::Index(index),
            });
        }
        for fk in &t.foreign_keys {
            let fkey = convert_fkey(ctx, &table, fk);
            jobs.push(Job {
                dest: dest.clone(),
                partial: Partial::ForeignKey,
                sort_type: kind.into(),
                sort_name: fkey.sql_name.clone(),
                data: JobData::ForeignKey(fkey),
            });
        }
    }

    jobs
}

/// Plan one custom query: a typedef unless the query is flat or exec,
/// then the query body.
pub fn plan_query(ctx: &GenCtx<'_>, q: &schema::Query) -> Vec<Job> {
    let converted = convert_query(ctx, q);
    let dest = query_dest(&q.ty);
    let mut jobs = Vec::new();
    if !q.flat && !q.exec {
        jobs.push(Job {
            dest: dest.clone(),
            partial: Partial::Typedef,
            sort_type: "query".into(),
            sort_name: q.ty.clone(),
            data: JobData::Table(converted.table.clone()),
        });
    }
    jobs.push(Job {
        dest,
        partial: Partial::Query,
        sort_type: "query".into(),
        sort_name: converted.fn_name.clone(),
        data: JobData::Query(Box::new(converted)),
    });
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::names::NameMapper;
    use crate::schema::ColumnType;

    fn sample_schema() -> schema::Schema {
        schema::Schema {
            name: "public".into(),
            enums: vec![schema::Enum {
                name: "process_status".into(),
                values: vec![schema::EnumValue {
                    name: "PENDING".into(),
                    const_value: None,
                }],
            }],
            procs: vec![
                schema::Proc {
                    kind: ProcKind::Function,
                    name: "say_hello".into(),
                    params: vec![schema::Field {
                        name: "name".into(),
                        ty: ColumnType::new("text"),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                schema::Proc {
                    kind: ProcKind::Function,
                    name: "say_hello".into(),
                    params: vec![
                        schema::Field {
                            name: "name".into(),
                            ty: ColumnType::new("text"),
                            ..Default::default()
                        },
                        schema::Field {
                            name: "greeting".into(),
                            ty: ColumnType::new("text"),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
            ],
            tables: vec![schema::Table {
                name: "book_tags".into(),
                columns: vec![schema::Field {
                    name: "book_id".into(),
                    ty: ColumnType::new("integer"),
                    is_primary: true,
                    ..Default::default()
                }],
                indexes: vec![schema::Index {
                    name: "book_tags_pkey".into(),
                    fields: vec![schema::Field {
                        name: "book_id".into(),
                        ty: ColumnType::new("integer"),
                        is_primary: true,
                        ..Default::default()
                    }],
                    is_unique: true,
                    is_primary: true,
                }],
                ..Default::default()
            }],
            views: Vec::new(),
        }
    }

    #[test]
    fn test_destinations() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let files = schema_file_names(&ctx, &sample_schema());
        assert_eq!(
            files,
            ["processstatus.gen.rs", "sf_sayhello.gen.rs", "book_tag.gen.rs"]
        );
    }

    #[test]
    fn test_overload_grouping() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let jobs = plan_schema(&ctx, &sample_schema());
        let procs = jobs
            .iter()
            .find_map(|j| match &j.data {
                JobData::Procs(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(procs.len(), 2);
        assert!(procs.iter().all(|p| p.overloaded));
        assert_eq!(procs[0].overloaded_name, "say_hello_by_name");
        assert_eq!(procs[1].overloaded_name, "say_hello_by_name_and_greeting");
    }

    #[test]
    fn test_table_jobs_cover_indexes() {
        let cfg = Config::new();
        let names = NameMapper::new();
        let ctx = GenCtx {
            cfg: &cfg,
            names: &names,
        };
        let jobs = plan_schema(&ctx, &sample_schema());
        let dests: Vec<(&str, Partial)> = jobs
            .iter()
            .map(|j| (j.dest.as_str(), j.partial))
            .collect();
        assert!(dests.contains(&("book_tag.gen.rs", Partial::Typedef)));
        assert!(dests.contains(&("book_tag.gen.rs", Partial::Index)));
    }
}
