//! The two-span beam model
//!
//! ```text
//!        20 kN/m                  18 kN
//!   vvvvvvvvvvvvvvvvvv              v
//!   o================o==============o=====o
//!   ^ x=0            ^ x=4       x=6      ^ x=9
//! ```

use fea_engine::analysis::ActiveDofs;
use fea_engine::elements::MaterialKind;
use fea_engine::loads::LoadDirection;
use serde::Serialize;

use crate::builder::ModelBuilder;
use crate::engine::Units;
use crate::error::PipelineError;

/// Pinned in translation, free in rotation
pub const PINNED: [bool; 6] = [true, true, true, false, false, false];

/// Geometry, properties and loads of a two-span beam
#[derive(Debug, Clone, Serialize)]
pub struct TwoSpanBeam {
    pub units: Units,
    pub material: String,
    pub material_kind: MaterialKind,
    pub elastic_modulus: f64,
    pub poisson: f64,
    pub unit_weight: f64,
    pub section: String,
    pub width: f64,
    pub depth: f64,
    pub load_case: String,
    /// Start and end of each span
    pub spans: [([f64; 3], [f64; 3]); 2],
    /// Restraint of every span end
    pub restraint: [bool; 6],
    /// Gravity load on the first span, positive downwards
    pub span_load: f64,
    pub point_load_at: [f64; 3],
    /// [FX, FY, FZ, MX, MY, MZ]
    pub point_load: [f64; 6],
    pub active_dofs: ActiveDofs,
}

impl Default for TwoSpanBeam {
    fn default() -> Self {
        Self {
            units: Units::KnMC,
            material: "Concrete".to_string(),
            material_kind: MaterialKind::Concrete,
            elastic_modulus: 3e7,
            poisson: 0.0,
            unit_weight: 0.0,
            section: "Default".to_string(),
            width: 0.3,
            depth: 0.5,
            load_case: "DEAD".to_string(),
            spans: [([0.0, 0.0, 0.0], [4.0, 0.0, 0.0]), ([4.0, 0.0, 0.0], [9.0, 0.0, 0.0])],
            restraint: PINNED,
            span_load: 20.0,
            point_load_at: [6.0, 0.0, 0.0],
            point_load: [0.0, 0.0, -18.0, 0.0, 0.0, 0.0],
            active_dofs: ActiveDofs::plane_xz(),
        }
    }
}

/// Names the engine gave to what the scenario created
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuiltModel {
    pub frames: Vec<String>,
    /// Restrained points, in span order
    pub supports: Vec<String>,
    pub loaded_point: String,
}

impl TwoSpanBeam {
    /// Total vertical load, positive downwards
    pub fn total_vertical_load(&self) -> f64 {
        let (start, end) = self.spans[0];
        let length = start
            .iter()
            .zip(end.iter())
            .map(|(a, b)| (b - a).powi(2))
            .sum::<f64>()
            .sqrt();
        self.span_load * length - self.point_load[2]
    }

    /// Define the whole model through `builder`
    pub fn build(&self, builder: &mut ModelBuilder<'_>) -> Result<BuiltModel, PipelineError> {
        builder.initialize(self.units)?;
        builder.define_material(
            &self.material,
            self.material_kind,
            self.elastic_modulus,
            self.poisson,
            self.unit_weight,
        )?;
        builder.define_section(&self.section, &self.material, self.width, self.depth)?;
        builder.define_load_case(&self.load_case, 1.0)?;

        let mut built = BuiltModel::default();
        for (start, end) in &self.spans {
            let i = builder.add_node(*start)?;
            let j = builder.add_node(*end)?;
            built.frames.push(builder.add_frame(&i, &j, &self.section)?);
            for node in [i, j] {
                if !built.supports.contains(&node) {
                    built.supports.push(node);
                }
            }
        }
        for node in &built.supports {
            builder.set_restraint(node, &self.restraint)?;
        }

        builder.add_distributed_load(
            &built.frames[0],
            &self.load_case,
            LoadDirection::Gravity,
            self.span_load,
            0.0,
            1.0,
        )?;
        built.loaded_point = builder.add_node(self.point_load_at)?;
        builder.add_point_load(&built.loaded_point, &self.load_case, &self.point_load)?;

        tracing::info!(
            "Model built: {} frames, {} supports, load case {}",
            built.frames.len(),
            built.supports.len(),
            self.load_case
        );
        Ok(built)
    }
}
