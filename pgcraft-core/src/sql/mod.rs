//! Parameterized SQL generation for the emitted CRUD surface.
//!
//! Placeholders are `$n`, 1-based, assigned in column order. Identifier
//! quoting is controlled by three independent switches for schema, table
//! and column names.

pub mod delete;
pub mod insert;
pub mod lookup;
pub mod proc;
pub mod update;
pub mod upsert;


pub use delete::build_delete;
pub use insert::build_insert;
pub use lookup::build_index_lookup;
pub use proc::build_proc_call;
pub use update::build_update;
pub use upsert::build_upsert;

use crate::config::{Config, EscTarget};
use crate::convert::Field;

/// Quoting and naming context shared by every statement builder.
#[derive(Debug, Clone)]
pub struct SqlCtx<'a> {
    pub schema: &'a str,
    pub driver: &'a str,
    pub esc_schema: bool,
    pub esc_table: bool,
    pub esc_column: bool,
}

impl<'a> SqlCtx<'a> {
    pub fn from_config(cfg: &'a Config) -> Self {
        Self {
            schema: &cfg.schema,
            driver: &cfg.driver,
            esc_schema: cfg.esc_is(EscTarget::Schema),
            esc_table: cfg.esc_is(EscTarget::Table),
            esc_column: cfg.esc_is(EscTarget::Column),
        }
    }

    /// The nth placeholder, 0-indexed input, `$1`-based output.
    pub fn nth(&self, n: usize) -> String {
        format!("${}", n + 1)
    }

    /// A column reference, quoted when column escaping is on.
    pub fn colname(&self, field: &Field) -> String {
        if self.esc_column {
            format!("\"{}\"", field.sql_name)
        } else {
            field.sql_name.clone()
        }
    }

    /// A table (or routine) reference with the schema prefix applied. The
    /// schema is prefixed only when non-empty and the driver is not
    /// sqlite.
    pub fn qualified(&self, name: &str) -> String {
        let table = if self.esc_table {
            format!("\"{name}\"")
        } else {
            name.to_owned()
        };
        if self.schema.is_empty() || self.driver == "sqlite3" {
            return table;
        }
        let schema = if self.esc_schema {
            format!("\"{}\"", self.schema)
        } else {
            self.schema.to_owned()
        };
        format!("{schema}.{table}")
    }
}
