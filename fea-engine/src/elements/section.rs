//! Section properties for frame elements

use serde::{Deserialize, Serialize};

/// Cross-section properties for frame elements.
///
/// Bending in the 1-2 plane (V2, M3) is governed by `i33`, bending in the
/// 1-3 plane (V3, M2) by `i22`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Name of the material
    pub material: String,
    /// Cross-sectional area
    pub a: f64,
    /// Moment of inertia about the local 2 axis
    pub i22: f64,
    /// Moment of inertia about the local 3 axis
    pub i33: f64,
    /// Torsional constant
    pub j: f64,
}

impl Section {
    /// Create a new section with basic properties
    pub fn new(material: &str, a: f64, i22: f64, i33: f64, j: f64) -> Self {
        Self {
            material: material.to_string(),
            a,
            i22,
            i33,
            j,
        }
    }

    /// Create a rectangular section. `depth` is measured along local 2,
    /// `width` along local 3.
    pub fn rectangular(material: &str, width: f64, depth: f64) -> Self {
        let a = width * depth;
        let i33 = width * depth.powi(3) / 12.0;
        let i22 = depth * width.powi(3) / 12.0;

        // Torsional constant for a solid rectangle (approximate)
        let (long, short) = if width > depth { (width, depth) } else { (depth, width) };
        let j = long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long);

        Self::new(material, a, i22, i33, j)
    }

    /// Check the properties are physically meaningful
    pub fn validate(&self) -> Result<(), String> {
        for (label, value) in [("area", self.a), ("I22", self.i22), ("I33", self.i33), ("J", self.j)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive (received {})", label, value));
            }
        }
        Ok(())
    }
}
