//! The analysis engine contract and its in-process implementation
//!
//! Pipeline components talk to an engine session only through
//! [`AnalysisEngine`]. [`NativeEngine`] runs the analysis in-process on a
//! [`FEModel`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fea_engine::analysis::{ActiveDofs, AnalysisOptions};
use fea_engine::elements::{Material, MaterialKind, Member, Node, Section, Support};
use fea_engine::error::FEAError;
use fea_engine::loads::{DistributedLoad, LoadCase, NodeLoad};
use fea_engine::mesh::StationOptions;
use fea_engine::model::FEModel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::models::{ForceRecord, ReactionRecord};

/// Name of the built-in engine
pub const NATIVE_ENGINE: &str = "native";

/// Unit systems, numbered the way structural analysis programs number them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    LbInF = 1,
    LbFtF = 2,
    KipInF = 3,
    KipFtF = 4,
    KnMmC = 5,
    KnMC = 6,
    KgfMmC = 7,
    KgfMC = 8,
    NMmC = 9,
    NMC = 10,
}

impl Units {
    /// Numeric code of the unit system
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Unit system for a numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        use Units::*;
        [LbInF, LbFtF, KipInF, KipFtF, KnMmC, KnMC, KgfMmC, KgfMC, NMmC, NMC]
            .into_iter()
            .find(|u| u.code() == code)
    }

    /// Short label, e.g. `kN_m_C`
    pub fn label(self) -> &'static str {
        match self {
            Units::LbInF => "lb_in_F",
            Units::LbFtF => "lb_ft_F",
            Units::KipInF => "kip_in_F",
            Units::KipFtF => "kip_ft_F",
            Units::KnMmC => "kN_mm_C",
            Units::KnMC => "kN_m_C",
            Units::KgfMmC => "kgf_mm_C",
            Units::KgfMC => "kgf_m_C",
            Units::NMmC => "N_mm_C",
            Units::NMC => "N_m_C",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kinds of named entities in an engine session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Point,
    Frame,
    Material,
    Section,
    LoadCase,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Point => "point",
            EntityKind::Frame => "frame",
            EntityKind::Material => "material",
            EntityKind::Section => "section",
            EntityKind::LoadCase => "load case",
        })
    }
}

/// Errors reported by an engine session
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no model is open")]
    NotInitialized,
    #[error("unknown {kind} '{name}'")]
    UnknownEntity { kind: EntityKind, name: String },
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Analysis(String),
    #[error("analysis exceeded its time limit of {0:?}")]
    Timeout(Duration),
    #[error("cannot write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<FEAError> for EngineError {
    fn from(err: FEAError) -> Self {
        let unknown = |kind, name| EngineError::UnknownEntity { kind, name };
        match err {
            FEAError::NodeNotFound(name) => unknown(EntityKind::Point, name),
            FEAError::MemberNotFound(name) => unknown(EntityKind::Frame, name),
            FEAError::MaterialNotFound(name) => unknown(EntityKind::Material, name),
            FEAError::SectionNotFound(name) => unknown(EntityKind::Section, name),
            FEAError::LoadCaseNotFound(name) => unknown(EntityKind::LoadCase, name),
            FEAError::Timeout(limit) => EngineError::Timeout(limit),
            err @ (FEAError::DuplicateName(_) | FEAError::InvalidInput(_)) => {
                EngineError::InvalidInput(err.to_string())
            }
            err => EngineError::Analysis(err.to_string()),
        }
    }
}

/// Modeling, analysis and result interface of an analysis engine session.
///
/// Names returned by the engine identify points and frames in later calls.
/// Result queries return zero records when the model has not been analyzed
/// or no selected case applies.
pub trait AnalysisEngine {
    /// Engine name for logging
    fn name(&self) -> &str;

    /// Discard any open model and start a blank one
    fn initialize_new_model(&mut self, units: Units) -> Result<(), EngineError>;

    /// Unit system of the open model
    fn units(&self) -> Option<Units>;

    /// Add a point, or return the point already at `coords`
    fn add_point(&mut self, coords: [f64; 3]) -> Result<String, EngineError>;

    fn point_coordinates(&self, point: &str) -> Result<[f64; 3], EngineError>;

    /// Connect two points with a frame; the engine names it unless `name` is given
    fn add_frame(&mut self, start: &str, end: &str, section: &str, name: Option<&str>) -> Result<String, EngineError>;

    /// Start and end point of a frame
    fn frame_endpoints(&self, frame: &str) -> Result<(String, String), EngineError>;

    fn frame_names(&self) -> Result<Vec<String>, EngineError>;

    /// Define or redefine an isotropic material
    fn set_material(
        &mut self,
        name: &str,
        kind: MaterialKind,
        elastic_modulus: f64,
        poisson: f64,
        unit_weight: f64,
    ) -> Result<(), EngineError>;

    /// Define or redefine a solid rectangular section
    fn set_rectangular_section(&mut self, name: &str, material: &str, width: f64, depth: f64)
        -> Result<(), EngineError>;

    /// Restraints as [UX, UY, UZ, RX, RY, RZ]
    fn set_restraint(&mut self, point: &str, restraint: [bool; 6]) -> Result<(), EngineError>;

    fn restraint(&self, point: &str) -> Result<[bool; 6], EngineError>;

    /// Define a load pattern and its load case, or update its self weight multiplier
    fn add_load_pattern(&mut self, name: &str, self_weight_multiplier: f64) -> Result<(), EngineError>;

    fn set_load_distributed(&mut self, frame: &str, load: &DistributedLoad) -> Result<(), EngineError>;

    /// Point load as [FX, FY, FZ, MX, MY, MZ]
    fn set_load_force(&mut self, point: &str, load_case: &str, values: [f64; 6]) -> Result<(), EngineError>;

    fn set_active_dofs(&mut self, dofs: ActiveDofs) -> Result<(), EngineError>;

    /// File extension of saved models
    fn model_extension(&self) -> &str;

    fn save(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Analyze all load cases; blocks until done or `timeout` elapses
    fn run_analysis(&mut self, timeout: Option<Duration>) -> Result<(), EngineError>;

    fn deselect_all_cases_for_output(&mut self) -> Result<(), EngineError>;

    fn set_case_selected_for_output(&mut self, load_case: &str, selected: bool) -> Result<(), EngineError>;

    /// Reactions of a point for every selected case
    fn joint_react(&self, point: &str) -> Result<Vec<ReactionRecord>, EngineError>;

    /// Internal forces along a frame for every selected case
    fn frame_force(&self, frame: &str) -> Result<Vec<ForceRecord>, EngineError>;
}

/// Open the engine named in the configuration
pub fn connect(config: &PipelineConfig) -> Result<Box<dyn AnalysisEngine>, PipelineError> {
    match config.engine.as_str() {
        NATIVE_ENGINE => Ok(Box::new(NativeEngine::new())),
        other => Err(PipelineError::Connection(format!(
            "unknown engine '{}' (available: {})",
            other, NATIVE_ENGINE
        ))),
    }
}

/// Model file contents written by [`NativeEngine::save`]
#[derive(Serialize)]
struct SavedModel<'a> {
    units: Units,
    model: &'a FEModel,
}

/// In-process engine session backed by [`FEModel`]
#[derive(Debug)]
pub struct NativeEngine {
    model: Option<FEModel>,
    units: Option<Units>,
    merge_tolerance: f64,
    stations: StationOptions,
    next_point: usize,
    next_frame: usize,
    saved_to: Option<PathBuf>,
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine {
    pub fn new() -> Self {
        Self {
            model: None,
            units: None,
            merge_tolerance: 1e-6,
            stations: StationOptions::default(),
            next_point: 1,
            next_frame: 1,
            saved_to: None,
        }
    }

    /// Station spacing for frames added from now on
    pub fn with_stations(mut self, stations: StationOptions) -> Self {
        self.stations = stations;
        self
    }

    /// Distance within which a new point merges with an existing one
    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Path of the last save, if any
    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    fn model(&self) -> Result<&FEModel, EngineError> {
        self.model.as_ref().ok_or(EngineError::NotInitialized)
    }

    fn model_mut(&mut self) -> Result<&mut FEModel, EngineError> {
        self.model.as_mut().ok_or(EngineError::NotInitialized)
    }

    fn member(&self, frame: &str) -> Result<&Member, EngineError> {
        self.model()?
            .members
            .get(frame)
            .ok_or_else(|| EngineError::UnknownEntity {
                kind: EntityKind::Frame,
                name: frame.to_string(),
            })
    }

    /// Next free name from a counter
    fn next_name<T>(counter: &mut usize, taken: &std::collections::HashMap<String, T>) -> String {
        loop {
            let name = counter.to_string();
            *counter += 1;
            if !taken.contains_key(&name) {
                return name;
            }
        }
    }
}

impl AnalysisEngine for NativeEngine {
    fn name(&self) -> &str {
        NATIVE_ENGINE
    }

    fn initialize_new_model(&mut self, units: Units) -> Result<(), EngineError> {
        let mut model = FEModel::new();
        model.add_load_case(LoadCase::dead())?;
        self.model = Some(model);
        self.units = Some(units);
        self.next_point = 1;
        self.next_frame = 1;
        self.saved_to = None;
        Ok(())
    }

    fn units(&self) -> Option<Units> {
        self.units
    }

    fn add_point(&mut self, coords: [f64; 3]) -> Result<String, EngineError> {
        let tolerance = self.merge_tolerance;
        let model = self.model.as_mut().ok_or(EngineError::NotInitialized)?;
        if let Some(existing) = model.node_at(coords, tolerance) {
            return Ok(existing.to_string());
        }
        let name = Self::next_name(&mut self.next_point, &model.nodes);
        model.add_node(&name, Node::at(coords))?;
        Ok(name)
    }

    fn point_coordinates(&self, point: &str) -> Result<[f64; 3], EngineError> {
        self.model()?
            .nodes
            .get(point)
            .map(Node::coords)
            .ok_or_else(|| EngineError::UnknownEntity {
                kind: EntityKind::Point,
                name: point.to_string(),
            })
    }

    fn add_frame(&mut self, start: &str, end: &str, section: &str, name: Option<&str>) -> Result<String, EngineError> {
        let stations = self.stations;
        let model = self.model.as_mut().ok_or(EngineError::NotInitialized)?;
        let name = match name {
            Some(name) => name.to_string(),
            None => Self::next_name(&mut self.next_frame, &model.members),
        };
        model.add_member(&name, Member::new(start, end, section).with_stations(stations))?;
        Ok(name)
    }

    fn frame_endpoints(&self, frame: &str) -> Result<(String, String), EngineError> {
        let member = self.member(frame)?;
        Ok((member.i_node.clone(), member.j_node.clone()))
    }

    fn frame_names(&self) -> Result<Vec<String>, EngineError> {
        let mut names: Vec<String> = self.model()?.members.keys().cloned().collect();
        names.sort_by(|a, b| natural_order(a, b));
        Ok(names)
    }

    fn set_material(
        &mut self,
        name: &str,
        kind: MaterialKind,
        elastic_modulus: f64,
        poisson: f64,
        unit_weight: f64,
    ) -> Result<(), EngineError> {
        let material = Material::isotropic(kind, elastic_modulus, poisson, unit_weight);
        self.model_mut()?.set_material(name, material)?;
        Ok(())
    }

    fn set_rectangular_section(&mut self, name: &str, material: &str, width: f64, depth: f64) -> Result<(), EngineError> {
        self.model_mut()?
            .set_section(name, Section::rectangular(material, width, depth))?;
        Ok(())
    }

    fn set_restraint(&mut self, point: &str, restraint: [bool; 6]) -> Result<(), EngineError> {
        self.model_mut()?
            .set_support(point, Support::from_array(restraint))?;
        Ok(())
    }

    fn restraint(&self, point: &str) -> Result<[bool; 6], EngineError> {
        Ok(self.model()?.support(point)?.as_array())
    }

    fn add_load_pattern(&mut self, name: &str, self_weight_multiplier: f64) -> Result<(), EngineError> {
        let model = self.model_mut()?;
        if model.load_case(name).is_some() {
            model.set_self_weight_multiplier(name, self_weight_multiplier)?;
        } else {
            model.add_load_case(LoadCase::new(name).with_self_weight(self_weight_multiplier))?;
        }
        Ok(())
    }

    fn set_load_distributed(&mut self, frame: &str, load: &DistributedLoad) -> Result<(), EngineError> {
        self.model_mut()?.add_member_dist_load(frame, load.clone())?;
        Ok(())
    }

    fn set_load_force(&mut self, point: &str, load_case: &str, values: [f64; 6]) -> Result<(), EngineError> {
        self.model_mut()?
            .add_node_load(point, NodeLoad::from_array(values, load_case))?;
        Ok(())
    }

    fn set_active_dofs(&mut self, dofs: ActiveDofs) -> Result<(), EngineError> {
        self.model_mut()?.set_active_dofs(dofs);
        Ok(())
    }

    fn model_extension(&self) -> &str {
        "json"
    }

    fn save(&mut self, path: &Path) -> Result<(), EngineError> {
        let units = self.units.ok_or(EngineError::NotInitialized)?;
        let contents = serde_json::to_string_pretty(&SavedModel {
            units,
            model: self.model()?,
        })
        .map_err(|e| EngineError::InvalidInput(format!("cannot serialize model: {}", e)))?;

        fs::write(path, contents).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.saved_to = Some(path.to_path_buf());
        Ok(())
    }

    fn run_analysis(&mut self, timeout: Option<Duration>) -> Result<(), EngineError> {
        if self.saved_to.is_none() {
            self.model()?;
            return Err(EngineError::Analysis(
                "model must be saved before it is analyzed".to_string(),
            ));
        }

        let mut options = AnalysisOptions::linear();
        options.timeout = timeout;
        let summaries = self.model_mut()?.analyze(&options)?;
        for summary in &summaries {
            tracing::debug!(
                load_case = %summary.load_case,
                free_dofs = summary.free_dofs,
                max_displacement = summary.max_displacement,
                "load case solved"
            );
        }
        Ok(())
    }

    fn deselect_all_cases_for_output(&mut self) -> Result<(), EngineError> {
        self.model_mut()?.deselect_all_cases_for_output();
        Ok(())
    }

    fn set_case_selected_for_output(&mut self, load_case: &str, selected: bool) -> Result<(), EngineError> {
        self.model_mut()?
            .set_case_selected_for_output(load_case, selected)?;
        Ok(())
    }

    fn joint_react(&self, point: &str) -> Result<Vec<ReactionRecord>, EngineError> {
        let model = self.model()?;
        if !model.support(point)?.is_supported() || !model.is_analyzed() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for case in model.selected_cases() {
            if let Some(r) = model.node_reactions(point, case)? {
                records.push(ReactionRecord {
                    node: point.to_string(),
                    load_case: case.to_string(),
                    fx: r.fx,
                    fy: r.fy,
                    fz: r.fz,
                    mx: r.mx,
                    my: r.my,
                    mz: r.mz,
                });
            }
        }
        Ok(records)
    }

    fn frame_force(&self, frame: &str) -> Result<Vec<ForceRecord>, EngineError> {
        self.member(frame)?;
        let model = self.model()?;
        if !model.is_analyzed() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for case in model.selected_cases() {
            for s in model.member_station_forces(frame, case)? {
                records.push(ForceRecord {
                    frame: frame.to_string(),
                    station: s.station,
                    load_case: s.load_case,
                    element: s.element,
                    element_station: s.element_station,
                    p: s.p,
                    v2: s.v2,
                    v3: s.v3,
                    t: s.t,
                    m2: s.m2,
                    m3: s.m3,
                });
            }
        }
        Ok(records)
    }
}

/// Order names numerically when both are numbers, else lexically
fn natural_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
