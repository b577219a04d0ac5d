//! Node loads - forces and moments applied directly to nodes

use serde::{Deserialize, Serialize};

/// A load applied directly to a node, in global axes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLoad {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
    /// Load case this load belongs to
    pub case: String,
}

impl NodeLoad {
    /// Create a node load from [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(values: [f64; 6], case: &str) -> Self {
        Self {
            fx: values[0],
            fy: values[1],
            fz: values[2],
            mx: values[3],
            my: values[4],
            mz: values[5],
            case: case.to_string(),
        }
    }

    /// Create a force-only node load
    pub fn force(fx: f64, fy: f64, fz: f64, case: &str) -> Self {
        Self::from_array([fx, fy, fz, 0.0, 0.0, 0.0], case)
    }

    /// Get the load as an array [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }
}
