//! Emission: planning, template helpers and partial renderers.

pub mod funcs;
pub mod plan;
pub mod render;

pub use funcs::{eval, Funcs};
pub use plan::{db_dest, plan_query, plan_schema, schema_file_names, Job, JobData, Partial, EXT};
