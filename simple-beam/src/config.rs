use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::engine::{Units, NATIVE_ENGINE};

/// Environment variable overriding the output directory
pub const ENV_OUTPUT_DIR: &str = "SIMPLE_BEAM_OUTPUT_DIR";
pub const ENV_ENGINE: &str = "SIMPLE_BEAM_ENGINE";
pub const ENV_MODEL_NAME: &str = "SIMPLE_BEAM_MODEL_NAME";
pub const ENV_ANALYSIS_TIMEOUT: &str = "SIMPLE_BEAM_ANALYSIS_TIMEOUT_SECS";

pub const DEFAULT_MODEL_NAME: &str = "SimpleBeam";
pub const DEFAULT_RESULTS_FILE: &str = "Simple_Beam_Results.csv";
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Directory receiving the model and the results
    pub output_dir: PathBuf,
    /// Model file name without extension
    pub model_name: String,
    /// Results file name
    pub results_file: String,
    /// Engine to open
    pub engine: String,
    pub units: Units,
    pub analysis_timeout: Duration,
}

impl PipelineConfig {
    /// Defaults for an output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            results_file: DEFAULT_RESULTS_FILE.to_string(),
            engine: NATIVE_ENGINE.to_string(),
            units: Units::KnMC,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    /// Defaults overridden by `SIMPLE_BEAM_*` environment variables
    pub fn from_env(output_dir: impl Into<PathBuf>) -> Self {
        Self::from_lookup(output_dir, |key| std::env::var(key).ok())
    }

    fn from_lookup(output_dir: impl Into<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(output_dir);
        if let Some(engine) = lookup(ENV_ENGINE).filter(|v| !v.trim().is_empty()) {
            config.engine = engine.trim().to_string();
        }
        if let Some(name) = lookup(ENV_MODEL_NAME).filter(|v| !v.trim().is_empty()) {
            config.model_name = name.trim().to_string();
        }
        match lookup(ENV_ANALYSIS_TIMEOUT).map(|v| v.trim().parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => config.analysis_timeout = Duration::from_secs(secs),
            Some(_) => tracing::warn!(
                "Ignoring {}: expected a positive number of seconds",
                ENV_ANALYSIS_TIMEOUT
            ),
            None => {}
        }
        config
    }

    /// Where the engine saves the model, given its file extension
    pub fn model_path(&self, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", self.model_name, extension))
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_paths() {
        let config = PipelineConfig::new("/tmp/beam");
        assert_eq!(config.model_path("json"), PathBuf::from("/tmp/beam/SimpleBeam.json"));
        assert_eq!(
            config.results_path(),
            PathBuf::from("/tmp/beam/Simple_Beam_Results.csv")
        );
        assert_eq!(config.analysis_timeout, Duration::from_secs(300));
        assert_eq!(config.units, Units::KnMC);
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENGINE, "native"),
            (ENV_MODEL_NAME, "Bridge"),
            (ENV_ANALYSIS_TIMEOUT, "12"),
        ]
        .into_iter()
        .collect();
        let config = PipelineConfig::from_lookup("out", |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.model_name, "Bridge");
        assert_eq!(config.analysis_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_bad_timeout_keeps_default() {
        let config = PipelineConfig::from_lookup("out", |k| {
            (k == ENV_ANALYSIS_TIMEOUT).then(|| "soon".to_string())
        });
        assert_eq!(config.analysis_timeout, DEFAULT_ANALYSIS_TIMEOUT);
    }
}
