//! Generator configuration.
//!
//! One [`Config`] is threaded through every phase; there is no process
//! global. [`Config::apply`] implements the recognized-by-name flag surface
//! so front ends (CLI flags, key=value pairs) share one parser.

use crate::error::{Error, Result};

/// Whether generated functions accept a context handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextMode {
    /// Every generated function takes `ctx: &Context`.
    #[default]
    Only,
    /// No context parameters.
    Disable,
    /// Emit both a plain variant and a `*_ctx` variant.
    Both,
}

impl ContextMode {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "only" | "" => Ok(Self::Only),
            "disable" => Ok(Self::Disable),
            "both" => Ok(Self::Both),
            other => Err(Error::config(
                "context",
                format!("expected only, disable or both, got {other:?}"),
            )),
        }
    }
}

/// Identifier escaping targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscTarget {
    None,
    Schema,
    Table,
    Column,
    All,
}

impl EscTarget {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "none" => Ok(Self::None),
            "schema" => Ok(Self::Schema),
            "table" => Ok(Self::Table),
            "column" => Ok(Self::Column),
            "all" => Ok(Self::All),
            other => Err(Error::config(
                "esc",
                format!("expected none, schema, table, column or all, got {other:?}"),
            )),
        }
    }
}

/// The full generator configuration surface.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input driver; anything but postgres fails the pre phase.
    pub driver: String,
    /// Database schema name, prefixed onto SQL identifiers when non-empty.
    pub schema: String,
    /// Output directory; its basename is the default package name.
    pub out: String,
    /// Suppress the first-file-only shared partial.
    pub not_first: bool,
    /// Rust spelling for 4-byte integer columns.
    pub int32: String,
    /// Rust spelling for 4-byte unsigned columns.
    pub uint32: String,
    /// Target package name; defaults to the basename of `out`.
    pub pkg: String,
    /// Feature gates emitted into file headers.
    pub tags: Vec<String>,
    /// Extra imports, each `"alias path"` or `"path"`.
    pub imports: Vec<String>,
    /// UUID type path.
    pub uuid: String,
    /// Module prefix for custom type fallbacks.
    pub custom: String,
    /// Suffix appended to resolve identifier collisions.
    pub conflict: String,
    /// Extra initialisms registered with the name mapper at Pre time.
    pub initialisms: Vec<String>,
    /// Identifier escaping targets.
    pub esc: Vec<EscTarget>,
    /// Per-field attribute template; `%[1]` SQL name, `%[2]` Rust name,
    /// `%[3]` 1-based ordinal.
    pub field_tag: String,
    pub context: ContextMode,
    /// Literal text inserted into generated file headers.
    pub inject: String,
    /// Like `inject`, read from a file by the front end.
    pub inject_file: String,
    /// Combined single-file output destination; empty disables.
    pub single: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver: "postgres".into(),
            schema: "public".into(),
            out: "models".into(),
            not_first: false,
            int32: "i32".into(),
            uint32: "u32".into(),
            pkg: String::new(),
            tags: Vec::new(),
            imports: Vec::new(),
            uuid: "uuid::Uuid".into(),
            custom: String::new(),
            conflict: "Val".into(),
            initialisms: Vec::new(),
            esc: Vec::new(),
            field_tag: "#[row(%[3])]".into(),
            context: ContextMode::Only,
            inject: String::new(),
            inject_file: String::new(),
            single: String::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a flag by name. List flags append; bool flags accept
    /// `true`/`false`/`1`/`0`; unknown names are rejected.
    pub fn apply(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "driver" => self.driver = value.into(),
            "schema" => self.schema = value.into(),
            "out" => self.out = value.into(),
            "not-first" => self.not_first = parse_bool(name, value)?,
            "int32" => self.int32 = value.into(),
            "uint32" => self.uint32 = value.into(),
            "pkg" => self.pkg = value.into(),
            "tag" => self.tags.push(value.into()),
            "import" => self.imports.push(value.into()),
            "uuid" => self.uuid = value.into(),
            "custom" => self.custom = value.into(),
            "conflict" => self.conflict = value.into(),
            "initialism" => self.initialisms.push(value.into()),
            "esc" => self.esc.push(EscTarget::parse(value)?),
            "field-tag" => self.field_tag = value.into(),
            "context" => self.context = ContextMode::parse(value)?,
            "inject" => self.inject = value.into(),
            "inject-file" => self.inject_file = value.into(),
            "single" => self.single = value.into(),
            other => {
                return Err(Error::config(other, "unknown flag"));
            }
        }
        Ok(())
    }

    /// The effective package name.
    pub fn pkg(&self) -> &str {
        if !self.pkg.is_empty() {
            return &self.pkg;
        }
        // Basename of the output directory.
        self.out
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.out)
    }

    /// Whether any of the targets is enabled (`all` enables every target).
    pub fn esc_is(&self, target: EscTarget) -> bool {
        self.esc.contains(&target) || self.esc.contains(&EscTarget::All)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "" | "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::config(name, format!("expected bool, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::new();
        assert_eq!(cfg.driver, "postgres");
        assert_eq!(cfg.int32, "i32");
        assert_eq!(cfg.conflict, "Val");
        assert_eq!(cfg.pkg(), "models");
        assert_eq!(cfg.context, ContextMode::Only);
    }

    #[test]
    fn test_apply_flags() {
        let mut cfg = Config::new();
        cfg.apply("pkg", "store").unwrap();
        cfg.apply("esc", "schema").unwrap();
        cfg.apply("esc", "column").unwrap();
        cfg.apply("initialism", "ACME").unwrap();
        cfg.apply("context", "both").unwrap();
        assert_eq!(cfg.pkg(), "store");
        assert!(cfg.esc_is(EscTarget::Schema));
        assert!(cfg.esc_is(EscTarget::Column));
        assert!(!cfg.esc_is(EscTarget::Table));
        assert_eq!(cfg.initialisms, ["ACME"]);
        assert_eq!(cfg.context, ContextMode::Both);
    }

    #[test]
    fn test_esc_all() {
        let mut cfg = Config::new();
        cfg.apply("esc", "all").unwrap();
        assert!(cfg.esc_is(EscTarget::Schema));
        assert!(cfg.esc_is(EscTarget::Table));
        assert!(cfg.esc_is(EscTarget::Column));
    }

    #[test]
    fn test_unknown_flag() {
        let mut cfg = Config::new();
        let err = cfg.apply("frobnicate", "x").unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_bad_enum_values() {
        let mut cfg = Config::new();
        assert!(cfg.apply("esc", "everything").is_err());
        assert!(cfg.apply("context", "sometimes").is_err());
        assert!(cfg.apply("not-first", "maybe").is_err());
    }

    #[test]
    fn test_pkg_from_out_path() {
        let mut cfg = Config::new();
        cfg.apply("out", "gen/db/models/").unwrap();
        assert_eq!(cfg.pkg(), "models");
    }
}
