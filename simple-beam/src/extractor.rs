use crate::engine::AnalysisEngine;
use crate::error::{PipelineError, Stage};
use crate::models::{ForceRecord, ReactionRecord};

/// Reads analysis results back from an engine session
pub struct ResultExtractor<'e> {
    engine: &'e dyn AnalysisEngine,
}

impl<'e> ResultExtractor<'e> {
    pub fn new(engine: &'e dyn AnalysisEngine) -> Self {
        Self { engine }
    }

    /// Reactions of a node, one record per selected case. Empty when the
    /// node is unrestrained or nothing has been analyzed.
    pub fn get_reactions(&self, node: &str) -> Result<Vec<ReactionRecord>, PipelineError> {
        let records = self
            .engine
            .joint_react(node)
            .map_err(|e| PipelineError::engine(Stage::Extract, e))?;
        tracing::debug!("{} reaction records for node {}", records.len(), node);
        Ok(records)
    }

    /// Internal forces of a frame, one record per station per selected case
    pub fn get_frame_forces(&self, frame: &str) -> Result<Vec<ForceRecord>, PipelineError> {
        let records = self
            .engine
            .frame_force(frame)
            .map_err(|e| PipelineError::engine(Stage::Extract, e))?;
        tracing::debug!("{} force records for frame {}", records.len(), frame);
        Ok(records)
    }
}
