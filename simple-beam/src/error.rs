use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::engine::{EngineError, EntityKind};
use crate::pipeline::PipelineState;

/// Pipeline stage an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Connect,
    Build,
    Save,
    Analyze,
    Extract,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Connect => "connect",
            Stage::Build => "build",
            Stage::Save => "save",
            Stage::Analyze => "analyze",
            Stage::Extract => "extract",
            Stage::Write => "write",
        })
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("[connect] cannot open the analysis engine: {0}")]
    Connection(String),

    #[error("[{stage}] unknown {kind} '{name}'")]
    Reference {
        stage: Stage,
        kind: EntityKind,
        name: String,
    },

    #[error("[{stage}] validation error: {message}")]
    Validation { stage: Stage, message: String },

    #[error("[{stage}] analysis error: {message}")]
    Analysis { stage: Stage, message: String },

    #[error("[{stage}] I/O error on '{}': {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{stage}] step requested out of order: pipeline is {state}")]
    OutOfOrder { stage: Stage, state: PipelineState },
}

impl PipelineError {
    /// Stage the error was raised in
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Connection(_) => Stage::Connect,
            PipelineError::Reference { stage, .. }
            | PipelineError::Validation { stage, .. }
            | PipelineError::Analysis { stage, .. }
            | PipelineError::Io { stage, .. }
            | PipelineError::OutOfOrder { stage, .. } => *stage,
        }
    }

    /// Reference and validation errors concern one entity; the rest end the run
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PipelineError::Reference { .. } | PipelineError::Validation { .. }
        )
    }

    pub(crate) fn validation(stage: Stage, message: impl Into<String>) -> Self {
        PipelineError::Validation {
            stage,
            message: message.into(),
        }
    }

    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// Map an engine error raised during `stage`
    pub fn engine(stage: Stage, err: EngineError) -> Self {
        match err {
            EngineError::UnknownEntity { kind, name } => PipelineError::Reference { stage, kind, name },
            EngineError::InvalidInput(message) => PipelineError::Validation { stage, message },
            EngineError::Io { path, source } => PipelineError::Io { stage, path, source },
            err @ (EngineError::NotInitialized | EngineError::Analysis(_) | EngineError::Timeout(_)) => {
                PipelineError::Analysis {
                    stage,
                    message: err.to_string(),
                }
            }
        }
    }
}
