//! Build, save, analyze, extract and write, one forward step at a time

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::builder::ModelBuilder;
use crate::config::PipelineConfig;
use crate::engine::{self, AnalysisEngine, EntityKind};
use crate::error::{PipelineError, Stage};
use crate::extractor::ResultExtractor;
use crate::models::{ForceRecord, ReactionRecord};
use crate::runner::AnalysisRunner;
use crate::scenario::{BuiltModel, TwoSpanBeam};
use crate::writer::ResultWriter;

/// Progress of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Uninitialized,
    ModelBuilt,
    Saved,
    Analyzed,
    ResultsExtracted,
    Written,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineState::Uninitialized => "uninitialized",
            PipelineState::ModelBuilt => "model built",
            PipelineState::Saved => "saved",
            PipelineState::Analyzed => "analyzed",
            PipelineState::ResultsExtracted => "results extracted",
            PipelineState::Written => "written",
        })
    }
}

/// An entity the engine reported no records for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoResults {
    pub kind: EntityKind,
    pub name: String,
}

impl fmt::Display for NoResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No results for {} {}", self.kind, self.name)
    }
}

/// Records read back from the engine, in query order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    /// Non-empty reaction sets, keyed by point
    pub reactions: Vec<(String, Vec<ReactionRecord>)>,
    /// Non-empty force sets, keyed by frame
    pub forces: Vec<(String, Vec<ForceRecord>)>,
    pub no_results: Vec<NoResults>,
    /// Messages of entities skipped on a local error
    pub skipped: Vec<String>,
}

impl Extraction {
    /// Every force record, frame by frame
    pub fn force_records(&self) -> Vec<ForceRecord> {
        self.forces
            .iter()
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }

    /// Sum of all reactions as [FX, FY, FZ, MX, MY, MZ]
    pub fn reaction_total(&self) -> [f64; 6] {
        let mut total = [0.0; 6];
        for record in self.reactions.iter().flat_map(|(_, records)| records) {
            for (sum, value) in total.iter_mut().zip(record.as_array()) {
                *sum += value;
            }
        }
        total
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub model_path: PathBuf,
    pub results_path: PathBuf,
    pub extraction: Extraction,
}

/// One run against one engine session
pub struct Pipeline {
    config: PipelineConfig,
    engine: Box<dyn AnalysisEngine>,
    scenario: TwoSpanBeam,
    state: PipelineState,
    run_id: Uuid,
    built: Option<BuiltModel>,
    model_path: Option<PathBuf>,
    extraction: Option<Extraction>,
}

impl Pipeline {
    /// Open the configured engine
    pub fn connect(config: PipelineConfig) -> Result<Self, PipelineError> {
        let engine = engine::connect(&config)?;
        Ok(Self::new(config, engine))
    }

    /// Run against an already open engine session
    pub fn new(config: PipelineConfig, engine: Box<dyn AnalysisEngine>) -> Self {
        let scenario = TwoSpanBeam {
            units: config.units,
            ..TwoSpanBeam::default()
        };
        Self {
            config,
            engine,
            scenario,
            state: PipelineState::Uninitialized,
            run_id: Uuid::new_v4(),
            built: None,
            model_path: None,
            extraction: None,
        }
    }

    pub fn with_scenario(mut self, scenario: TwoSpanBeam) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The engine session, for direct queries
    pub fn engine(&self) -> &dyn AnalysisEngine {
        self.engine.as_ref()
    }

    pub fn built(&self) -> Option<&BuiltModel> {
        self.built.as_ref()
    }

    /// Where the model was saved, once it has been
    pub fn model_path(&self) -> Option<&std::path::Path> {
        self.model_path.as_deref()
    }

    fn expect_state(&self, stage: Stage, expected: PipelineState) -> Result<(), PipelineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PipelineError::OutOfOrder {
                stage,
                state: self.state,
            })
        }
    }

    /// Define the scenario in the engine
    pub fn build(&mut self) -> Result<&BuiltModel, PipelineError> {
        self.expect_state(Stage::Build, PipelineState::Uninitialized)?;
        let built = self
            .scenario
            .build(&mut ModelBuilder::new(self.engine.as_mut()))?;
        self.state = PipelineState::ModelBuilt;
        let built: &BuiltModel = self.built.insert(built);
        Ok(built)
    }

    /// Persist the model into the output directory
    pub fn save(&mut self) -> Result<PathBuf, PipelineError> {
        self.expect_state(Stage::Save, PipelineState::ModelBuilt)?;
        let path = AnalysisRunner::new(self.engine.as_mut())
            .save_model(&self.config.output_dir, &self.config.model_name)?;
        self.model_path = Some(path.clone());
        self.state = PipelineState::Saved;
        Ok(path)
    }

    /// Analyze and select the scenario's load case for output
    pub fn analyze(&mut self) -> Result<(), PipelineError> {
        self.expect_state(Stage::Analyze, PipelineState::Saved)?;
        tracing::info!(run_id = %self.run_id, engine = self.engine.name(), "Running analysis");
        let mut runner = AnalysisRunner::new(self.engine.as_mut());
        runner.set_active_dofs(self.scenario.active_dofs)?;
        runner.run_analysis(self.config.analysis_timeout)?;
        runner.select_output_cases(&[self.scenario.load_case.as_str()])?;
        self.state = PipelineState::Analyzed;
        Ok(())
    }

    /// Query reactions at every support and forces along every frame.
    /// Unknown entities are skipped with a warning.
    pub fn extract(&mut self) -> Result<&Extraction, PipelineError> {
        self.expect_state(Stage::Extract, PipelineState::Analyzed)?;
        let built = self.built.clone().unwrap_or_default();
        let extractor = ResultExtractor::new(self.engine.as_ref());
        let mut extraction = Extraction::default();

        for node in &built.supports {
            match extractor.get_reactions(node) {
                Ok(records) if records.is_empty() => extraction.no_results.push(NoResults {
                    kind: EntityKind::Point,
                    name: node.clone(),
                }),
                Ok(records) => extraction.reactions.push((node.clone(), records)),
                Err(err) if err.is_local() => {
                    tracing::warn!("Skipping point {}: {}", node, err);
                    extraction.skipped.push(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }

        for frame in &built.frames {
            match extractor.get_frame_forces(frame) {
                Ok(records) if records.is_empty() => extraction.no_results.push(NoResults {
                    kind: EntityKind::Frame,
                    name: frame.clone(),
                }),
                Ok(records) => extraction.forces.push((frame.clone(), records)),
                Err(err) if err.is_local() => {
                    tracing::warn!("Skipping frame {}: {}", frame, err);
                    extraction.skipped.push(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            "Extracted {} reaction sets and {} force sets ({} without results)",
            extraction.reactions.len(),
            extraction.forces.len(),
            extraction.no_results.len()
        );
        self.state = PipelineState::ResultsExtracted;
        let extraction: &Extraction = self.extraction.insert(extraction);
        Ok(extraction)
    }

    /// Write the extracted frame forces as CSV
    pub fn write(&mut self) -> Result<PathBuf, PipelineError> {
        self.expect_state(Stage::Write, PipelineState::ResultsExtracted)?;
        let records = self
            .extraction
            .as_ref()
            .map(Extraction::force_records)
            .unwrap_or_default();
        let path = self.config.results_path();
        ResultWriter::write_csv(&path, &records)?;
        self.state = PipelineState::Written;
        Ok(path)
    }

    /// Every step in order
    pub fn run(mut self) -> Result<RunReport, PipelineError> {
        tracing::info!(
            run_id = %self.run_id,
            output_dir = %self.config.output_dir().display(),
            "Starting two-span beam run"
        );
        self.build()?;
        let model_path = self.save()?;
        self.analyze()?;
        self.extract()?;
        let results_path = self.write()?;

        let report = RunReport {
            run_id: self.run_id,
            model_path,
            results_path,
            extraction: self.extraction.take().unwrap_or_default(),
        };
        tracing::info!(run_id = %report.run_id, "Run finished");
        Ok(report)
    }
}
