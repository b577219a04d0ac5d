//! Node element - a joint in 3D space

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A joint of the frame model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,

    /// Equation number of the first DOF, assigned during analysis
    #[serde(skip)]
    pub(crate) id: Option<usize>,

    /// Displacements by load case
    #[serde(skip)]
    pub(crate) displacements: HashMap<String, [f64; 6]>,

    /// Reactions by load case
    #[serde(skip)]
    pub(crate) reactions: HashMap<String, [f64; 6]>,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            id: None,
            displacements: HashMap::new(),
            reactions: HashMap::new(),
        }
    }

    /// Create a node from a coordinate triple
    pub fn at(coords: [f64; 3]) -> Self {
        Self::new(coords[0], coords[1], coords[2])
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        self.distance_to_point(other.coords())
    }

    /// Calculate distance to a point
    pub fn distance_to_point(&self, p: [f64; 3]) -> f64 {
        let dx = p[0] - self.x;
        let dy = p[1] - self.y;
        let dz = p[2] - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Get displacement for a load case
    /// Returns [UX, UY, UZ, RX, RY, RZ]
    pub fn displacement(&self, case: &str) -> Option<[f64; 6]> {
        self.displacements.get(case).copied()
    }

    /// Get reactions for a load case
    /// Returns [FX, FY, FZ, MX, MY, MZ]
    pub fn reaction(&self, case: &str) -> Option<[f64; 6]> {
        self.reactions.get(case).copied()
    }

    pub(crate) fn clear_results(&mut self) {
        self.id = None;
        self.displacements.clear();
        self.reactions.clear();
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}
