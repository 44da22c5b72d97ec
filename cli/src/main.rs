//! pgcraft — generate typed PostgreSQL data access code.
//!
//! Loads a schema set (as JSON, produced by a schema loader), runs the
//! generator, and writes the emitted files.
//!
//! ```bash
//! # Generate per-table files into ./models
//! pgcraft generate --schema-file set.json --out models
//!
//! # Custom query mode, combined into one file
//! pgcraft generate --schema-file set.json --out models --mode query --single queries.gen.rs
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use pgcraft_core::{Config, Generator, Mode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgcraft")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate typed PostgreSQL data access code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMode {
    Schema,
    Query,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Schema => Mode::Schema,
            CliMode::Query => Mode::Query,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from a schema set file.
    Generate {
        /// Path to the schema set JSON.
        #[arg(long)]
        schema_file: PathBuf,

        /// Output directory.
        #[arg(short, long)]
        out: PathBuf,

        /// Generation mode.
        #[arg(long, value_enum, default_value = "schema")]
        mode: CliMode,

        /// Input driver name.
        #[arg(long, default_value = "postgres")]
        driver: String,

        /// Database schema name prefixed onto SQL identifiers.
        #[arg(long, default_value = "public")]
        db_schema: String,

        /// Suppress the first-file-only shared partial.
        #[arg(long)]
        not_first: bool,

        /// Rust type used for 4-byte integer columns.
        #[arg(long, default_value = "i32")]
        int32: String,

        /// Rust type used for 4-byte unsigned columns.
        #[arg(long, default_value = "u32")]
        uint32: String,

        /// Package name; defaults to the output directory basename.
        #[arg(long, default_value = "")]
        pkg: String,

        /// Feature gates for generated files (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Extra imports, "alias path" or "path" (repeatable).
        #[arg(long = "import")]
        imports: Vec<String>,

        /// UUID type path.
        #[arg(long, default_value = "uuid::Uuid")]
        uuid: String,

        /// Module prefix for custom type fallbacks.
        #[arg(long, default_value = "")]
        custom: String,

        /// Suffix used to resolve identifier collisions.
        #[arg(long, default_value = "Val")]
        conflict: String,

        /// Extra initialisms, e.g. ID, API, URI (repeatable).
        #[arg(long = "initialism")]
        initialisms: Vec<String>,

        /// Identifier escaping: none, schema, table, column, all (repeatable).
        #[arg(long = "esc")]
        esc: Vec<String>,

        /// Per-field attribute template.
        #[arg(long, default_value = "#[row(%[3])]")]
        field_tag: String,

        /// Context mode: only, disable, both.
        #[arg(long, default_value = "only")]
        context: String,

        /// Literal text inserted into generated file headers.
        #[arg(long, default_value = "")]
        inject: String,

        /// Read the header injection from a file.
        #[arg(long)]
        inject_file: Option<PathBuf>,

        /// Combine all output into a single file with this name.
        #[arg(long, default_value = "")]
        single: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            schema_file,
            out,
            mode,
            driver,
            db_schema,
            not_first,
            int32,
            uint32,
            pkg,
            tags,
            imports,
            uuid,
            custom,
            conflict,
            initialisms,
            esc,
            field_tag,
            context,
            inject,
            inject_file,
            single,
        } => {
            let mut cfg = Config::new();
            cfg.apply("driver", &driver)?;
            cfg.apply("schema", &db_schema)?;
            cfg.apply("out", &out.to_string_lossy())?;
            if not_first {
                cfg.apply("not-first", "true")?;
            }
            cfg.apply("int32", &int32)?;
            cfg.apply("uint32", &uint32)?;
            cfg.apply("pkg", &pkg)?;
            for tag in &tags {
                cfg.apply("tag", tag)?;
            }
            for import in &imports {
                cfg.apply("import", import)?;
            }
            cfg.apply("uuid", &uuid)?;
            cfg.apply("custom", &custom)?;
            cfg.apply("conflict", &conflict)?;
            for initialism in &initialisms {
                cfg.apply("initialism", initialism)?;
            }
            for target in &esc {
                cfg.apply("esc", target)?;
            }
            cfg.apply("field-tag", &field_tag)?;
            cfg.apply("context", &context)?;
            cfg.apply("single", &single)?;
            match inject_file {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("reading inject file {}", path.display()))?;
                    cfg.apply("inject", &text)?;
                }
                None => cfg.apply("inject", &inject)?,
            }

            generate(cfg, mode.into(), &schema_file, &out)
        }
    }
}

fn generate(cfg: Config, mode: Mode, schema_file: &Path, out: &Path) -> Result<()> {
    let input = fs::read_to_string(schema_file)
        .with_context(|| format!("reading schema set {}", schema_file.display()))?;
    let set = serde_json::from_str(&input)
        .with_context(|| format!("parsing schema set {}", schema_file.display()))?;

    let files = Generator::new(cfg).run(mode, &set)?;

    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let mut total = 0usize;
    for (dest, content) in &files {
        let path = out.join(dest);
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        total += content.len();
        println!("  {} {} ({} bytes)", "wrote".green(), path.display(), content.len());
    }
    println!(
        "{} {} files, {} bytes",
        "generated".bold().green(),
        files.len(),
        total
    );
    Ok(())
}
