//! Distributed loads on members

use serde::{Deserialize, Serialize};

/// Direction of a member load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoadDirection {
    /// Member local 1 axis (axial)
    Local1,
    /// Member local 2 axis
    Local2,
    /// Member local 3 axis
    Local3,
    /// Global X
    GlobalX,
    /// Global Y
    GlobalY,
    /// Global Z
    GlobalZ,
    /// Global -Z; a positive magnitude acts downward
    Gravity,
}

impl LoadDirection {
    /// Local axis index (0, 1, 2) for local directions
    pub fn local_axis(&self) -> Option<usize> {
        match self {
            LoadDirection::Local1 => Some(0),
            LoadDirection::Local2 => Some(1),
            LoadDirection::Local3 => Some(2),
            _ => None,
        }
    }

    /// Unit vector in global coordinates for global directions
    pub fn global_vector(&self) -> Option<[f64; 3]> {
        match self {
            LoadDirection::GlobalX => Some([1.0, 0.0, 0.0]),
            LoadDirection::GlobalY => Some([0.0, 1.0, 0.0]),
            LoadDirection::GlobalZ => Some([0.0, 0.0, 1.0]),
            LoadDirection::Gravity => Some([0.0, 0.0, -1.0]),
            _ => None,
        }
    }

    /// Check if this is a local coordinate direction
    pub fn is_local(&self) -> bool {
        self.local_axis().is_some()
    }
}

/// A linearly varying line load over part or all of a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Magnitude at the start position
    pub w1: f64,
    /// Magnitude at the end position
    pub w2: f64,
    /// Start position
    pub x1: f64,
    /// End position
    pub x2: f64,
    /// Positions are fractions of the member length rather than distances
    pub relative: bool,
    /// Load direction
    pub direction: LoadDirection,
    /// Load case
    pub case: String,
}

impl DistributedLoad {
    /// Create a load between relative positions `x1` and `x2` (0..1)
    pub fn relative(w1: f64, w2: f64, x1: f64, x2: f64, direction: LoadDirection, case: &str) -> Self {
        Self {
            w1,
            w2,
            x1,
            x2,
            relative: true,
            direction,
            case: case.to_string(),
        }
    }

    /// Create a load between absolute distances `x1` and `x2` from the i-node
    pub fn absolute(w1: f64, w2: f64, x1: f64, x2: f64, direction: LoadDirection, case: &str) -> Self {
        Self {
            relative: false,
            ..Self::relative(w1, w2, x1, x2, direction, case)
        }
    }

    /// Create a uniform load over the full member length
    pub fn uniform(w: f64, direction: LoadDirection, case: &str) -> Self {
        Self::relative(w, w, 0.0, 1.0, direction, case)
    }

    /// Check if the load is uniform (constant magnitude)
    pub fn is_uniform(&self) -> bool {
        (self.w1 - self.w2).abs() < 1e-10
    }

    /// Start and end distances from the i-node for a member of `length`
    pub fn absolute_range(&self, length: f64) -> (f64, f64) {
        if self.relative {
            (self.x1 * length, self.x2 * length)
        } else {
            (self.x1, self.x2)
        }
    }

    /// Magnitude at distance `x` from the i-node; zero outside the loaded range
    pub fn intensity_at(&self, x: f64, length: f64) -> f64 {
        let (x1, x2) = self.absolute_range(length);
        if x < x1 || x > x2 || x2 - x1 <= 0.0 {
            return 0.0;
        }
        self.w1 + (self.w2 - self.w1) * (x - x1) / (x2 - x1)
    }

    /// Total force carried by this load on a member of `length`
    pub fn total_force(&self, length: f64) -> f64 {
        let (x1, x2) = self.absolute_range(length);
        (self.w1 + self.w2) / 2.0 * (x2 - x1)
    }

    /// Check the loaded range fits a member of `length`
    pub fn validate(&self, length: f64) -> Result<(), String> {
        if !(self.w1.is_finite() && self.w2.is_finite()) {
            return Err("load magnitude must be finite".to_string());
        }
        let (x1, x2) = self.absolute_range(length);
        if !(x1 >= 0.0 && x2 > x1 && x2 <= length * (1.0 + 1e-9)) {
            return Err(format!(
                "load range [{}, {}] does not fit a member of length {}",
                x1, x2, length
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_load_total() {
        let load = DistributedLoad::uniform(20.0, LoadDirection::Gravity, "DEAD");
        assert!(load.is_uniform());
        assert!((load.total_force(4.0) - 80.0).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_interpolation() {
        let load = DistributedLoad::absolute(0.0, 10.0, 1.0, 3.0, LoadDirection::Local2, "LIVE");
        assert_eq!(load.intensity_at(0.5, 4.0), 0.0);
        assert!((load.intensity_at(2.0, 4.0) - 5.0).abs() < 1e-12);
        assert!((load.total_force(4.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_range_validation() {
        let load = DistributedLoad::relative(1.0, 1.0, 0.5, 0.2, LoadDirection::Gravity, "DEAD");
        assert!(load.validate(4.0).is_err());
        let load = DistributedLoad::absolute(1.0, 1.0, 0.0, 5.0, LoadDirection::Gravity, "DEAD");
        assert!(load.validate(4.0).is_err());
    }

    #[test]
    fn test_directions() {
        assert_eq!(LoadDirection::Local2.local_axis(), Some(1));
        assert_eq!(LoadDirection::Gravity.global_vector(), Some([0.0, 0.0, -1.0]));
        assert!(!LoadDirection::GlobalX.is_local());
    }
}
