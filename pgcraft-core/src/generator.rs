//! Generator orchestration.
//!
//! Runs the three phases over an input [`Set`]: **pre** (driver gate,
//! initialism registration, shared partial), **process** (planning and
//! rendering), **post** (the formatter pipeline). Output is a map from
//! destination file name to content; writing files is the caller's job.
//!
//! The pipeline is single-threaded and deterministic: two runs over the
//! same input produce byte-identical output. External cancellation is
//! advisory and checked between entities.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::convert::GenCtx;
use crate::emit::{self, Funcs, Job, JobData, Partial};
use crate::error::{Error, Result};
use crate::names::NameMapper;
use crate::postproc::{default_pipeline, PostProcessor};
use crate::schema::Set;

/// Generation mode: whole schemas, or custom queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Schema,
    Query,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Schema => "schema",
            Mode::Query => "query",
        }
    }
}

pub struct Generator {
    cfg: Config,
    processors: Vec<Box<dyn PostProcessor>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Generator {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            processors: default_pipeline(),
            cancel: None,
        }
    }

    /// Replace the post-phase formatter pipeline.
    pub fn with_processors(mut self, processors: Vec<Box<dyn PostProcessor>>) -> Self {
        self.processors = processors;
        self
    }

    /// Attach an advisory cancellation flag, checked between entities.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn check_cancel(&self) -> Result<()> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::SeqCst) {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    /// Run all three phases and return the emitted files.
    pub fn run(&self, mode: Mode, set: &Set) -> Result<BTreeMap<String, Vec<u8>>> {
        // Pre: the driver gate and per-run naming state.
        if self.cfg.driver != "postgres" {
            return Err(Error::Driver(self.cfg.driver.clone()));
        }
        let mut names = NameMapper::new();
        names.add_initialisms(self.cfg.initialisms.iter());
        let ctx = GenCtx {
            cfg: &self.cfg,
            names: &names,
        };
        let funcs = Funcs::new(&self.cfg, &names);
        info!(mode = mode.as_str(), pkg = self.cfg.pkg(), "generating");

        // Process: plan every entity.
        let mut jobs: Vec<Job> = Vec::new();
        match mode {
            Mode::Schema => {
                for schema in &set.schemas {
                    self.check_cancel()?;
                    jobs.extend(emit::plan_schema(&ctx, schema));
                }
            }
            Mode::Query => {
                for query in &set.queries {
                    self.check_cancel()?;
                    jobs.extend(emit::plan_query(&ctx, query));
                }
            }
        }

        let single = !self.cfg.single.is_empty();
        if single {
            for job in &mut jobs {
                job.dest = self.cfg.single.clone();
            }
        }

        // The shared partial is emitted once, into its well-known
        // destination, unless suppressed.
        if !self.cfg.not_first {
            let dest = if single {
                self.cfg.single.clone()
            } else {
                emit::db_dest()
            };
            jobs.push(Job {
                dest,
                partial: Partial::Db,
                sort_type: String::new(),
                sort_name: String::new(),
                data: JobData::None,
            });
        }

        // One header per destination file.
        let mut dests: Vec<String> = jobs.iter().map(|j| j.dest.clone()).collect();
        dests.sort();
        dests.dedup();
        for dest in &dests {
            debug!(file = dest.as_str(), "planned");
            jobs.push(Job {
                dest: dest.clone(),
                partial: Partial::Header,
                sort_type: String::new(),
                sort_name: String::new(),
                data: JobData::None,
            });
        }

        jobs.sort_by(|a, b| {
            (&a.dest, a.partial, &a.sort_type, &a.sort_name)
                .cmp(&(&b.dest, b.partial, &b.sort_type, &b.sort_name))
        });

        // Render into per-file buffers.
        let mut files: BTreeMap<String, String> = BTreeMap::new();
        for job in &jobs {
            self.check_cancel()?;
            let text = match (&job.partial, &job.data) {
                (Partial::Header, _) => emit::render::render_header(&funcs),
                (Partial::Db, _) => emit::render::render_db(&funcs),
                (Partial::Enum, JobData::Enum(e)) => emit::render::render_enum(&funcs, e),
                (Partial::Proc, JobData::Procs(procs)) => emit::render::render_procs(&funcs, procs),
                (Partial::Typedef, JobData::Table(t)) => emit::render::render_typedef(&funcs, t),
                (Partial::Index, JobData::Index(i)) => emit::render::render_index(&funcs, i),
                (Partial::ForeignKey, JobData::ForeignKey(fk)) => {
                    emit::render::render_foreign_key(&funcs, fk)
                }
                (Partial::Query, JobData::Query(q)) => emit::render::render_query(&funcs, q),
                (partial, _) => {
                    return Err(Error::Render {
                        file: job.dest.clone(),
                        message: format!("no data for partial {partial:?}"),
                    })
                }
            };
            let buf = files.entry(job.dest.clone()).or_default();
            buf.push_str(&text);
            buf.push('\n');
        }

        // Post: the formatter pipeline, walked deterministically.
        let mut out = BTreeMap::new();
        for (dest, content) in files {
            self.check_cancel()?;
            let mut content = content;
            for processor in &self.processors {
                content = processor
                    .process(&dest, content)
                    .map_err(|message| Error::Format {
                        file: dest.clone(),
                        formatter: processor.name(),
                        message,
                    })?;
            }
            debug!(file = dest.as_str(), bytes = content.len(), "emitted");
            out.insert(dest, content.into_bytes());
        }
        Ok(out)
    }
}
