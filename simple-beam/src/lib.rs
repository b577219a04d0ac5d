//! Two-span beam analysis pipeline
//!
//! Builds the beam in an analysis engine session, saves and analyzes it,
//! reads back support reactions and frame forces, and writes the forces to
//! CSV. Every component works on an explicit `&mut dyn AnalysisEngine`.
//!
//! ```no_run
//! use simple_beam::{Pipeline, PipelineConfig};
//!
//! let report = Pipeline::connect(PipelineConfig::new("out"))?.run()?;
//! println!("{} force sets", report.extraction.forces.len());
//! # Ok::<(), simple_beam::PipelineError>(())
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod runner;
pub mod scenario;
pub mod writer;

pub use builder::ModelBuilder;
pub use config::PipelineConfig;
pub use engine::{connect, AnalysisEngine, EngineError, EntityKind, NativeEngine, Units};
pub use error::{PipelineError, Stage};
pub use extractor::ResultExtractor;
pub use models::{ForceRecord, ReactionRecord};
pub use pipeline::{Extraction, NoResults, Pipeline, PipelineState, RunReport};
pub use runner::AnalysisRunner;
pub use scenario::{BuiltModel, TwoSpanBeam};
pub use writer::{ResultWriter, CSV_HEADER};
