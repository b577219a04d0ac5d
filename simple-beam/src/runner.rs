use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fea_engine::analysis::ActiveDofs;

use crate::engine::AnalysisEngine;
use crate::error::{PipelineError, Stage};

/// Persists the model, runs the analysis and picks the output cases
pub struct AnalysisRunner<'e> {
    engine: &'e mut dyn AnalysisEngine,
}

impl<'e> AnalysisRunner<'e> {
    pub fn new(engine: &'e mut dyn AnalysisEngine) -> Self {
        Self { engine }
    }

    /// Save to `<dir>/<model_name>.<engine extension>`, creating `dir` if needed
    pub fn save_model(&mut self, dir: &Path, model_name: &str) -> Result<PathBuf, PipelineError> {
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(Stage::Save, dir, e))?;
        let path = dir.join(format!("{}.{}", model_name, self.engine.model_extension()));
        self.engine
            .save(&path)
            .map_err(|e| PipelineError::engine(Stage::Save, e))?;
        tracing::info!("Model saved to {}", path.display());
        Ok(path)
    }

    pub fn set_active_dofs(&mut self, dofs: ActiveDofs) -> Result<(), PipelineError> {
        self.engine
            .set_active_dofs(dofs)
            .map_err(|e| PipelineError::engine(Stage::Analyze, e))
    }

    /// Run the analysis; blocks until the engine returns
    pub fn run_analysis(&mut self, timeout: Duration) -> Result<(), PipelineError> {
        let start = Instant::now();
        self.engine
            .run_analysis(Some(timeout))
            .map_err(|e| PipelineError::engine(Stage::Analyze, e))?;

        let elapsed = start.elapsed();
        if elapsed > timeout {
            return Err(PipelineError::Analysis {
                stage: Stage::Analyze,
                message: format!(
                    "analysis took {:.1?}, longer than the limit of {:?}",
                    elapsed, timeout
                ),
            });
        }
        tracing::info!("Analysis finished in {:.1?}", elapsed);
        Ok(())
    }

    /// Deselect every case, then select exactly `cases`
    pub fn select_output_cases(&mut self, cases: &[&str]) -> Result<(), PipelineError> {
        let stage = Stage::Analyze;
        self.engine
            .deselect_all_cases_for_output()
            .map_err(|e| PipelineError::engine(stage, e))?;
        for case in cases {
            self.engine
                .set_case_selected_for_output(case, true)
                .map_err(|e| PipelineError::engine(stage, e))?;
        }
        Ok(())
    }
}
