//! Model assembly against an engine session
//!
//! Inputs are checked before the engine is called. The builder keeps no
//! state of its own; everything it creates lives in the engine.

use fea_engine::elements::MaterialKind;
use fea_engine::loads::{DistributedLoad, LoadDirection};

use crate::engine::{AnalysisEngine, Units};
use crate::error::{PipelineError, Stage};

const STAGE: Stage = Stage::Build;

fn engine_err(err: crate::engine::EngineError) -> PipelineError {
    PipelineError::engine(STAGE, err)
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::validation(STAGE, message)
}

/// Defines geometry, properties, restraints and loads in an engine session
pub struct ModelBuilder<'e> {
    engine: &'e mut dyn AnalysisEngine,
}

impl<'e> ModelBuilder<'e> {
    pub fn new(engine: &'e mut dyn AnalysisEngine) -> Self {
        Self { engine }
    }

    /// Start a blank model in `units`
    pub fn initialize(&mut self, units: Units) -> Result<(), PipelineError> {
        self.engine.initialize_new_model(units).map_err(engine_err)?;
        tracing::debug!("Blank model initialized in {}", units);
        Ok(())
    }

    /// Add a node, or get the one already at `coords`
    pub fn add_node(&mut self, coords: [f64; 3]) -> Result<String, PipelineError> {
        if !coords.iter().all(|c| c.is_finite()) {
            return Err(invalid(format!("node coordinates must be finite (received {:?})", coords)));
        }
        self.engine.add_point(coords).map_err(engine_err)
    }

    /// Connect two existing nodes with a frame
    pub fn add_frame(&mut self, start: &str, end: &str, section: &str) -> Result<String, PipelineError> {
        if start == end {
            return Err(invalid(format!("frame cannot start and end at node '{}'", start)));
        }
        let name = self.engine.add_frame(start, end, section, None).map_err(engine_err)?;
        tracing::debug!("Frame {} added from node {} to node {}", name, start, end);
        Ok(name)
    }

    /// Add the end nodes (merging with existing ones) and connect them
    pub fn add_frame_by_coord(&mut self, start: [f64; 3], end: [f64; 3], section: &str) -> Result<String, PipelineError> {
        if start == end {
            return Err(invalid(format!("frame at {:?} has zero length", start)));
        }
        let i = self.add_node(start)?;
        let j = self.add_node(end)?;
        self.add_frame(&i, &j, section)
    }

    /// Define or redefine an isotropic material
    pub fn define_material(
        &mut self,
        name: &str,
        kind: MaterialKind,
        elastic_modulus: f64,
        poisson: f64,
        unit_weight: f64,
    ) -> Result<(), PipelineError> {
        if name.trim().is_empty() {
            return Err(invalid("material name must not be empty"));
        }
        if !(elastic_modulus.is_finite() && elastic_modulus > 0.0) {
            return Err(invalid(format!(
                "elastic modulus of '{}' must be positive (received {})",
                name, elastic_modulus
            )));
        }
        if !(unit_weight.is_finite() && unit_weight >= 0.0) {
            return Err(invalid(format!(
                "unit weight of '{}' must be non-negative (received {})",
                name, unit_weight
            )));
        }
        self.engine
            .set_material(name, kind, elastic_modulus, poisson, unit_weight)
            .map_err(engine_err)
    }

    /// Define or redefine a rectangular section of an existing material
    pub fn define_section(&mut self, tag: &str, material: &str, width: f64, depth: f64) -> Result<(), PipelineError> {
        if tag.trim().is_empty() {
            return Err(invalid("section tag must not be empty"));
        }
        for (label, value) in [("width", width), ("depth", depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!(
                    "section '{}' {} must be positive (received {})",
                    tag, label, value
                )));
            }
        }
        self.engine
            .set_rectangular_section(tag, material, width, depth)
            .map_err(engine_err)
    }

    /// Create a load case or update its self weight multiplier
    pub fn define_load_case(&mut self, name: &str, self_weight_multiplier: f64) -> Result<(), PipelineError> {
        if name.trim().is_empty() {
            return Err(invalid("load case name must not be empty"));
        }
        if !self_weight_multiplier.is_finite() {
            return Err(invalid(format!(
                "self weight multiplier of '{}' must be finite",
                name
            )));
        }
        self.engine
            .add_load_pattern(name, self_weight_multiplier)
            .map_err(engine_err)
    }

    /// Restrain a node; `restraint` flags UX, UY, UZ, RX, RY, RZ
    pub fn set_restraint(&mut self, node: &str, restraint: &[bool]) -> Result<(), PipelineError> {
        let flags: [bool; 6] = restraint.try_into().map_err(|_| {
            invalid(format!(
                "restraint vector of node '{}' needs 6 entries (received {})",
                node,
                restraint.len()
            ))
        })?;
        self.engine.set_restraint(node, flags).map_err(engine_err)
    }

    /// Read back the restraint flags of a node
    pub fn restraint(&self, node: &str) -> Result<[bool; 6], PipelineError> {
        self.engine.restraint(node).map_err(engine_err)
    }

    /// Uniform load between two fractions of the frame length. The sign of
    /// `magnitude` selects the sense along `direction`.
    pub fn add_distributed_load(
        &mut self,
        frame: &str,
        load_case: &str,
        direction: LoadDirection,
        magnitude: f64,
        start_fraction: f64,
        end_fraction: f64,
    ) -> Result<(), PipelineError> {
        if !magnitude.is_finite() {
            return Err(invalid(format!("load magnitude on frame '{}' must be finite", frame)));
        }
        if !(0.0..=1.0).contains(&start_fraction) || !(0.0..=1.0).contains(&end_fraction) || start_fraction >= end_fraction {
            return Err(invalid(format!(
                "load on frame '{}' needs 0 <= start < end <= 1 (received {} to {})",
                frame, start_fraction, end_fraction
            )));
        }
        let load = DistributedLoad::relative(magnitude, magnitude, start_fraction, end_fraction, direction, load_case);
        self.engine.set_load_distributed(frame, &load).map_err(engine_err)
    }

    /// Force and moment at a node, [FX, FY, FZ, MX, MY, MZ]
    pub fn add_point_load(&mut self, node: &str, load_case: &str, values: &[f64]) -> Result<(), PipelineError> {
        let values: [f64; 6] = values.try_into().map_err(|_| {
            invalid(format!(
                "point load on node '{}' needs 6 components (received {})",
                node,
                values.len()
            ))
        })?;
        if !values.iter().all(|v| v.is_finite()) {
            return Err(invalid(format!("point load on node '{}' must be finite", node)));
        }
        self.engine.set_load_force(node, load_case, values).map_err(engine_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EntityKind, NativeEngine};

    fn started() -> NativeEngine {
        let mut engine = NativeEngine::new();
        let mut builder = ModelBuilder::new(&mut engine);
        builder.initialize(Units::KnMC).unwrap();
        builder
            .define_material("Concrete", MaterialKind::Concrete, 3e7, 0.0, 0.0)
            .unwrap();
        builder.define_section("Default", "Concrete", 0.3, 0.5).unwrap();
        engine
    }

    #[test]
    fn test_frame_by_coord_reuses_nodes() {
        let mut engine = started();
        let mut builder = ModelBuilder::new(&mut engine);
        let first = builder.add_frame_by_coord([0.0; 3], [4.0, 0.0, 0.0], "Default").unwrap();
        let second = builder
            .add_frame_by_coord([4.0, 0.0, 0.0], [9.0, 0.0, 0.0], "Default")
            .unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("1", "2"));
        assert_eq!(engine.frame_endpoints("2").unwrap(), ("2".to_string(), "3".to_string()));
    }

    #[test]
    fn test_geometry_before_initialize_fails() {
        let mut engine = NativeEngine::new();
        let mut builder = ModelBuilder::new(&mut engine);
        let err = builder.add_node([0.0; 3]).unwrap_err();
        assert!(matches!(err, PipelineError::Analysis { stage: Stage::Build, .. }));
    }

    #[test]
    fn test_frame_references_are_checked() {
        let mut engine = started();
        let mut builder = ModelBuilder::new(&mut engine);
        let a = builder.add_node([0.0; 3]).unwrap();
        assert!(matches!(
            builder.add_frame(&a, &a, "Default"),
            Err(PipelineError::Validation { .. })
        ));
        assert!(matches!(
            builder.add_frame(&a, "42", "Default"),
            Err(PipelineError::Reference { kind: EntityKind::Point, .. })
        ));
        let b = builder.add_node([1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            builder.add_frame(&a, &b, "W12x26"),
            Err(PipelineError::Reference { kind: EntityKind::Section, .. })
        ));
    }

    #[test]
    fn test_material_validation() {
        let mut engine = started();
        let mut builder = ModelBuilder::new(&mut engine);
        assert!(builder
            .define_material("Bad", MaterialKind::Other, 0.0, 0.2, 1.0)
            .is_err());
        assert!(builder
            .define_material("Bad", MaterialKind::Other, 1.0, 0.2, -1.0)
            .is_err());
        assert!(matches!(
            builder.define_section("S", "Timber", 0.1, 0.2),
            Err(PipelineError::Reference { kind: EntityKind::Material, .. })
        ));
        // Redefinition overwrites
        builder
            .define_material("Concrete", MaterialKind::Concrete, 2.5e7, 0.2, 25.0)
            .unwrap();
    }

    #[test]
    fn test_restraint_round_trip_and_length_check() {
        let mut engine = started();
        let mut builder = ModelBuilder::new(&mut engine);
        let a = builder.add_node([0.0; 3]).unwrap();
        builder.set_restraint(&a, &[true, true, true, false, false, false]).unwrap();
        assert_eq!(builder.restraint(&a).unwrap(), [true, true, true, false, false, false]);

        assert!(matches!(
            builder.set_restraint(&a, &[true, true]),
            Err(PipelineError::Validation { .. })
        ));
        assert!(matches!(
            builder.set_restraint("9", &[true; 6]),
            Err(PipelineError::Reference { .. })
        ));
    }

    #[test]
    fn test_load_validation() {
        let mut engine = started();
        let mut builder = ModelBuilder::new(&mut engine);
        let frame = builder.add_frame_by_coord([0.0; 3], [4.0, 0.0, 0.0], "Default").unwrap();

        assert!(matches!(
            builder.add_distributed_load(&frame, "DEAD", LoadDirection::Gravity, 20.0, 0.6, 0.2),
            Err(PipelineError::Validation { .. })
        ));
        assert!(matches!(
            builder.add_distributed_load(&frame, "DEAD", LoadDirection::Gravity, f64::NAN, 0.0, 1.0),
            Err(PipelineError::Validation { .. })
        ));
        assert!(matches!(
            builder.add_distributed_load(&frame, "LIVE", LoadDirection::Gravity, 20.0, 0.0, 1.0),
            Err(PipelineError::Reference { kind: EntityKind::LoadCase, .. })
        ));
        assert!(matches!(
            builder.add_point_load("1", "DEAD", &[0.0, 0.0, -18.0]),
            Err(PipelineError::Validation { .. })
        ));
        builder
            .add_distributed_load(&frame, "DEAD", LoadDirection::Gravity, 20.0, 0.0, 1.0)
            .unwrap();
        builder
            .add_point_load("2", "DEAD", &[0.0, 0.0, -18.0, 0.0, 0.0, 0.0])
            .unwrap();
    }

    #[test]
    fn test_load_case_definition() {
        let mut engine = started();
        let mut builder = ModelBuilder::new(&mut engine);
        builder.define_load_case("LIVE", 0.0).unwrap();
        builder.define_load_case("DEAD", 1.0).unwrap();
        assert!(builder.define_load_case("", 0.0).is_err());
    }
}
