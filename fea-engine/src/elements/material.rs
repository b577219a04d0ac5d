//! Material properties

use serde::{Deserialize, Serialize};

/// Material type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    Steel,
    Concrete,
    Aluminum,
    Other,
}

/// Isotropic material properties, in the session's unit system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Type tag
    pub kind: MaterialKind,
    /// Modulus of elasticity
    pub e: f64,
    /// Shear modulus
    pub g: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Weight per unit volume
    pub unit_weight: f64,
}

impl Material {
    /// Create a new isotropic material from E and nu
    /// G is calculated as E / (2 * (1 + nu))
    pub fn isotropic(kind: MaterialKind, e: f64, nu: f64, unit_weight: f64) -> Self {
        Self {
            kind,
            e,
            g: e / (2.0 * (1.0 + nu)),
            nu,
            unit_weight,
        }
    }

    /// Structural steel in kN and m
    pub fn steel() -> Self {
        Self::isotropic(MaterialKind::Steel, 200e6, 0.3, 76.98)
    }

    /// Normal weight concrete in kN and m
    pub fn concrete() -> Self {
        Self::isotropic(MaterialKind::Concrete, 24.8e6, 0.2, 23.56)
    }

    /// Check the properties are physically meaningful
    pub fn validate(&self) -> Result<(), String> {
        if !(self.e.is_finite() && self.e > 0.0) {
            return Err(format!("elastic modulus must be positive (received {})", self.e));
        }
        if !(self.unit_weight.is_finite() && self.unit_weight >= 0.0) {
            return Err(format!(
                "unit weight must be non-negative (received {})",
                self.unit_weight
            ));
        }
        if !(-1.0 < self.nu && self.nu < 0.5) {
            return Err(format!("Poisson's ratio out of range (received {})", self.nu));
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isotropic_material() {
        let mat = Material::isotropic(MaterialKind::Concrete, 3e7, 0.0, 0.0);
        assert!((mat.g - 1.5e7).abs() < 1e-6);
        assert!(mat.validate().is_ok());
    }

    #[test]
    fn test_invalid_properties() {
        let mat = Material::isotropic(MaterialKind::Other, -1.0, 0.2, 0.0);
        assert!(mat.validate().is_err());
        let mat = Material::isotropic(MaterialKind::Other, 1.0, 0.2, -5.0);
        assert!(mat.validate().is_err());
    }
}
