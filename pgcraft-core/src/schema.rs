//! Schema input model.
//!
//! The generator consumes a [`Set`] — schemas plus custom queries — as
//! produced by an external schema loader. The shapes here mirror the
//! loader's JSON output; everything is optional-with-default so partial
//! descriptions stay loadable.

use serde::{Deserialize, Serialize};

/// The root input: all schemas and custom queries for one run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Set {
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default)]
    pub queries: Vec<Query>,
}

/// One database schema.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub enums: Vec<Enum>,
    #[serde(default)]
    pub procs: Vec<Proc>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<Table>,
}

/// A database enum type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Enum {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

/// One value of an enum, with an optional numeric constant.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub const_value: Option<i32>,
}

/// Stored routine kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcKind {
    #[default]
    Function,
    Procedure,
}

/// A stored function or procedure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Proc {
    #[serde(default)]
    pub kind: ProcKind,
    pub name: String,
    /// The SQL signature, kept for doc comments.
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub returns: Vec<Field>,
    #[serde(default)]
    pub void: bool,
}

/// A table or view.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Field>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    /// Manual tables skip the insert RETURNING round-trip.
    #[serde(default)]
    pub manual: bool,
}

/// A column, routine parameter, or routine return value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_sequence: bool,
    #[serde(default)]
    pub comment: String,
}

/// A database type reference.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ColumnType {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub is_array: bool,
}

impl ColumnType {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            nullable: false,
            is_array: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

/// A lookup index on a table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Index {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
}

/// A foreign key reference.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ForeignKey {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    pub ref_table: String,
    #[serde(default)]
    pub ref_fields: Vec<Field>,
}

/// A custom query to generate a function (and usually a record type) for.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Query {
    /// Function name; derived from the type when empty.
    #[serde(default)]
    pub name: String,
    /// Record type name for the query results.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub query: Vec<String>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub params: Vec<QueryParam>,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Field types were provided by the user, not inferred.
    #[serde(default)]
    pub manual_fields: bool,
    /// Return a single record instead of a vector.
    #[serde(default)]
    pub one: bool,
    /// Return scalars instead of a record type.
    #[serde(default)]
    pub flat: bool,
    /// Execute only; no rows come back.
    #[serde(default)]
    pub exec: bool,
    #[serde(default)]
    pub interpolate: bool,
}

/// A custom query parameter.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Interpolated into the SQL text instead of bound.
    #[serde(default)]
    pub interpolate: bool,
    #[serde(default)]
    pub join: bool,
}
