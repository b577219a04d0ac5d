//! Frame engine - an in-process linear static analysis engine for 3D frames
//!
//! The engine covers what a small beam model needs:
//! - Frame members (12 DOF, Euler-Bernoulli) split automatically at the
//!   nodes lying on them
//! - Node loads, trapezoidal member loads in local or global directions,
//!   and self weight per load case
//! - Linear static analysis of every load case, optionally restricted to a plane
//! - Reactions, displacements and internal forces at output stations
//!
//! ## Example
//! ```rust
//! use fea_engine::prelude::*;
//!
//! let mut model = FEModel::new();
//!
//! model.set_material("Concrete", Material::concrete()).unwrap();
//! model.set_section("Beam", Section::rectangular("Concrete", 0.3, 0.5)).unwrap();
//!
//! model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
//! model.add_node("N2", Node::new(4.0, 0.0, 0.0)).unwrap();
//! model.add_member("M1", Member::new("N1", "N2", "Beam")).unwrap();
//!
//! model.set_support("N1", Support::pinned()).unwrap();
//! model.set_support("N2", Support::pinned()).unwrap();
//! model.set_active_dofs(ActiveDofs::plane_xz());
//!
//! model.add_load_case(LoadCase::new("DEAD")).unwrap();
//! model
//!     .add_member_dist_load("M1", DistributedLoad::uniform(20.0, LoadDirection::Gravity, "DEAD"))
//!     .unwrap();
//!
//! model.analyze(&AnalysisOptions::linear()).unwrap();
//!
//! let reaction = model.node_reactions("N1", "DEAD").unwrap().unwrap();
//! assert!((reaction.fz - 40.0).abs() < 1e-6);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod mesh;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{ActiveDofs, AnalysisOptions, AnalysisType};
    pub use crate::elements::{Material, MaterialKind, Member, Node, Section, Support};
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::loads::{DistributedLoad, LoadCase, LoadDirection, NodeLoad};
    pub use crate::mesh::{StationForces, StationOptions};
    pub use crate::model::FEModel;
    pub use crate::results::{AnalysisSummary, NodeDisplacement, Reactions};
}
