//! Schema-to-code generation for typed PostgreSQL data access.
//!
//! Consumes a schema description — tables, columns, enums, indexes,
//! foreign keys, stored routines — and emits Rust data-access code:
//! record structs with CRUD methods, index and foreign-key lookups, enum
//! types and routine wrappers, all targeting sqlx and carrying
//! `pgcraft-row` positional tags.
//!
//! ```no_run
//! use pgcraft_core::{Config, Generator, Mode};
//!
//! let set = pgcraft_core::schema::Set::default();
//! let files = Generator::new(Config::new()).run(Mode::Schema, &set)?;
//! for (dest, content) in &files {
//!     println!("{dest}: {} bytes", content.len());
//! }
//! # Ok::<(), pgcraft_core::Error>(())
//! ```

pub mod config;
pub mod convert;
pub mod emit;
pub mod error;
pub mod names;
pub mod postproc;
pub mod schema;
pub mod sql;
pub mod typemap;

mod generator;

pub use config::{Config, ContextMode, EscTarget};
pub use error::{Error, Result};
pub use generator::{Generator, Mode};
