//! Database type to Rust type mapping.
//!
//! Maps a `(type, nullable, is_array)` triple onto the Rust type spelled in
//! generated code, together with its zero-value literal. Nullable columns
//! use the `pgcraft_row` nullable wrappers so generated records distinguish
//! SQL NULL from empty values.

use crate::config::Config;
use crate::names::NameMapper;
use crate::schema::ColumnType;

/// Resolve a column type to `(rust_type, zero_literal)`.
pub fn map_type(cfg: &Config, names: &NameMapper, typ: &ColumnType) -> (String, String) {
    // SETOF T becomes a vector of T.
    if let Some(inner) = typ.ty.strip_prefix("SETOF ") {
        let inner = ColumnType {
            ty: inner.to_owned(),
            nullable: typ.nullable,
            is_array: false,
        };
        let (rust, _) = map_type(cfg, names, &inner);
        return (format!("Vec<{rust}>"), "Vec::new()".to_owned());
    }

    // An array column's element type is never itself nullable.
    let nullable = typ.nullable && !typ.is_array;

    let mut db_type = typ.ty.as_str();
    if db_type == "\"char\"" {
        db_type = "char";
    }
    // information_schema domains collapse to their base types.
    if let Some(domain) = db_type.strip_prefix("information_schema.") {
        db_type = match domain {
            "cardinal_number" => "integer",
            "character_data" | "sql_identifier" | "yes_or_no" => "character varying",
            "time_stamp" => "timestamp with time zone",
            other => other,
        };
    }

    let (rust, zero) = match db_type {
        "boolean" => pick(nullable, ("bool", "false"), ("NullBool", "NullBool::none()")),
        "bpchar" | "character varying" | "character" | "inet" | "money" | "text" | "name" => pick(
            nullable,
            ("String", "String::new()"),
            ("NullText", "NullText::none()"),
        ),
        "smallint" => pick(nullable, ("i16", "0"), ("NullInt2", "NullInt2::none()")),
        "integer" => {
            if nullable {
                ("NullInt4".to_owned(), "NullInt4::none()".to_owned())
            } else {
                (cfg.int32.clone(), "0".to_owned())
            }
        }
        "bigint" => pick(nullable, ("i64", "0"), ("NullInt8", "NullInt8::none()")),
        "real" => pick(nullable, ("f32", "0.0"), ("NullFloat4", "NullFloat4::none()")),
        "double precision" | "numeric" => pick(
            nullable,
            ("f64", "0.0"),
            ("NullFloat8", "NullFloat8::none()"),
        ),
        "date" => pick(
            nullable,
            ("NaiveDate", "NaiveDate::default()"),
            ("NullDate", "NullDate::none()"),
        ),
        "timestamp without time zone" => pick(
            nullable,
            ("NaiveDateTime", "NaiveDateTime::default()"),
            ("NullTimestamp", "NullTimestamp::none()"),
        ),
        "timestamp with time zone" => pick(
            nullable,
            ("DateTime<Utc>", "DateTime::<Utc>::default()"),
            ("NullTimestamptz", "NullTimestamptz::none()"),
        ),
        "time without time zone" | "time with time zone" => pick(
            nullable,
            ("NaiveTime", "NaiveTime::default()"),
            ("NullTime", "NullTime::none()"),
        ),
        "bit" => pick(nullable, ("u8", "0"), ("Option<u8>", "None")),
        "any" | "bit varying" | "bytea" | "interval" | "json" | "jsonb" | "xml" => {
            ("Vec<u8>".to_owned(), "Vec::new()".to_owned())
        }
        "hstore" => (
            "HashMap<String, String>".to_owned(),
            "HashMap::new()".to_owned(),
        ),
        "uuid" => (cfg.uuid.clone(), format!("{}::nil()", cfg.uuid)),
        other => custom_type(cfg, names, other, nullable),
    };

    if typ.is_array {
        return lift_array(cfg, &rust);
    }
    (rust, zero)
}

fn pick(
    nullable: bool,
    plain: (&str, &str),
    wrapped: (&str, &str),
) -> (String, String) {
    let (t, z) = if nullable { wrapped } else { plain };
    (t.to_owned(), z.to_owned())
}

/// Unknown types fall through to a name-mangled identifier, optionally
/// inside the configured custom module, `Null`-prefixed when nullable.
fn custom_type(cfg: &Config, names: &NameMapper, typ: &str, nullable: bool) -> (String, String) {
    let mut name = names.camel_export(&[typ]);
    if nullable {
        name = format!("Null{name}");
    }
    if !cfg.custom.is_empty() {
        name = format!("{}::{}", cfg.custom, name);
    }
    let zero = format!("{name}::default()");
    (name, zero)
}

/// Scalar element types with a native vector mapping; everything else
/// degrades to raw bytes.
fn lift_array(cfg: &Config, element: &str) -> (String, String) {
    let native = element == "bool"
        || element == "i16"
        || element == cfg.int32
        || element == "i64"
        || element == "f32"
        || element == "f64"
        || element == "String";
    if native {
        (format!("Vec<{element}>"), "Vec::new()".to_owned())
    } else {
        ("Vec<u8>".to_owned(), "Vec::new()".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(ty: ColumnType) -> (String, String) {
        let cfg = Config::new();
        let names = NameMapper::new();
        map_type(&cfg, &names, &ty)
    }

    #[test]
    fn test_scalar_buckets() {
        assert_eq!(map(ColumnType::new("boolean")).0, "bool");
        assert_eq!(map(ColumnType::new("smallint")).0, "i16");
        assert_eq!(map(ColumnType::new("integer")).0, "i32");
        assert_eq!(map(ColumnType::new("bigint")).0, "i64");
        assert_eq!(map(ColumnType::new("real")).0, "f32");
        assert_eq!(map(ColumnType::new("double precision")).0, "f64");
        assert_eq!(map(ColumnType::new("numeric")).0, "f64");
        assert_eq!(map(ColumnType::new("text")).0, "String");
        assert_eq!(map(ColumnType::new("character varying")).0, "String");
        assert_eq!(map(ColumnType::new("bytea")).0, "Vec<u8>");
        assert_eq!(map(ColumnType::new("jsonb")).0, "Vec<u8>");
        assert_eq!(map(ColumnType::new("hstore")).0, "HashMap<String, String>");
        assert_eq!(map(ColumnType::new("uuid")).0, "uuid::Uuid");
    }

    #[test]
    fn test_nullable_wrappers() {
        assert_eq!(map(ColumnType::new("boolean").nullable()).0, "NullBool");
        assert_eq!(map(ColumnType::new("text").nullable()).0, "NullText");
        assert_eq!(map(ColumnType::new("smallint").nullable()).0, "NullInt2");
        assert_eq!(map(ColumnType::new("integer").nullable()).0, "NullInt4");
        assert_eq!(map(ColumnType::new("bigint").nullable()).0, "NullInt8");
        assert_eq!(map(ColumnType::new("numeric").nullable()).0, "NullFloat8");
        assert_eq!(map(ColumnType::new("bit").nullable()).0, "Option<u8>");
        // uuid stays the same type when nullable.
        assert_eq!(map(ColumnType::new("uuid").nullable()).0, "uuid::Uuid");
    }

    #[test]
    fn test_time_variants() {
        assert_eq!(map(ColumnType::new("date")).0, "NaiveDate");
        assert_eq!(
            map(ColumnType::new("timestamp without time zone")).0,
            "NaiveDateTime"
        );
        assert_eq!(
            map(ColumnType::new("timestamp with time zone")).0,
            "DateTime<Utc>"
        );
        assert_eq!(map(ColumnType::new("time without time zone")).0, "NaiveTime");
        // Four distinct nullable variants.
        assert_eq!(map(ColumnType::new("date").nullable()).0, "NullDate");
        assert_eq!(
            map(ColumnType::new("timestamp without time zone").nullable()).0,
            "NullTimestamp"
        );
        assert_eq!(
            map(ColumnType::new("timestamp with time zone").nullable()).0,
            "NullTimestamptz"
        );
        assert_eq!(map(ColumnType::new("time with time zone").nullable()).0, "NullTime");
    }

    #[test]
    fn test_arrays() {
        assert_eq!(map(ColumnType::new("integer").array()).0, "Vec<i32>");
        assert_eq!(map(ColumnType::new("text").array()).0, "Vec<String>");
        assert_eq!(map(ColumnType::new("boolean").array()).0, "Vec<bool>");
        // Array disables nullable on the element type.
        assert_eq!(map(ColumnType::new("text").nullable().array()).0, "Vec<String>");
        // No native vector mapping degrades to bytes.
        assert_eq!(map(ColumnType::new("uuid").array()).0, "Vec<u8>");
        assert_eq!(map(ColumnType::new("point").array()).0, "Vec<u8>");
    }

    #[test]
    fn test_setof() {
        let (t, z) = map(ColumnType::new("SETOF text"));
        assert_eq!(t, "Vec<String>");
        assert_eq!(z, "Vec::new()");
    }

    #[test]
    fn test_information_schema_domains() {
        assert_eq!(map(ColumnType::new("information_schema.cardinal_number")).0, "i32");
        assert_eq!(map(ColumnType::new("information_schema.yes_or_no")).0, "String");
        assert_eq!(
            map(ColumnType::new("information_schema.time_stamp")).0,
            "DateTime<Utc>"
        );
    }

    #[test]
    fn test_unknown_type_fallback() {
        let (t, z) = map(ColumnType::new("process_status"));
        assert_eq!(t, "ProcessStatus");
        assert_eq!(z, "ProcessStatus::default()");

        let (t, _) = map(ColumnType::new("process_status").nullable());
        assert_eq!(t, "NullProcessStatus");
    }

    #[test]
    fn test_custom_module_prefix() {
        let mut cfg = Config::new();
        cfg.apply("custom", "types").unwrap();
        let names = NameMapper::new();
        let (t, z) = map_type(&cfg, &names, &ColumnType::new("mood"));
        assert_eq!(t, "types::Mood");
        assert_eq!(z, "types::Mood::default()");
    }

    #[test]
    fn test_configured_int32() {
        let mut cfg = Config::new();
        cfg.apply("int32", "i64").unwrap();
        let names = NameMapper::new();
        assert_eq!(map_type(&cfg, &names, &ColumnType::new("integer")).0, "i64");
        assert_eq!(
            map_type(&cfg, &names, &ColumnType::new("integer").array()).0,
            "Vec<i64>"
        );
    }
}
