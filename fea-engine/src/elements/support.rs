//! Support conditions

use serde::{Deserialize, Serialize};

/// Restraints at a node, one flag per DOF
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    /// Restrained in X translation
    pub dx: bool,
    /// Restrained in Y translation
    pub dy: bool,
    /// Restrained in Z translation
    pub dz: bool,
    /// Restrained in X rotation
    pub rx: bool,
    /// Restrained in Y rotation
    pub ry: bool,
    /// Restrained in Z rotation
    pub rz: bool,
}

impl Support {
    /// Create a support with no restraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully fixed support (all DOFs restrained)
    pub fn fixed() -> Self {
        Self::from_array([true; 6])
    }

    /// Pinned support (translations restrained, rotations free)
    pub fn pinned() -> Self {
        Self::from_array([true, true, true, false, false, false])
    }

    /// Create a support from [UX, UY, UZ, RX, RY, RZ] flags
    pub fn from_array(r: [bool; 6]) -> Self {
        Self {
            dx: r[0],
            dy: r[1],
            dz: r[2],
            rx: r[3],
            ry: r[4],
            rz: r[5],
        }
    }

    /// Restraint flags as [UX, UY, UZ, RX, RY, RZ]
    pub fn as_array(&self) -> [bool; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Check if any DOF is restrained
    pub fn is_supported(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }

    /// Count number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.as_array().iter().filter(|&&r| r).count()
    }
}
