//! Member element - straight 3D frame object (beam/column)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::mesh::{Segment, SegmentLoad, StationOptions};

/// A straight frame object between two nodes.
///
/// During analysis the object is split into elements at every node lying
/// on it; results are reported against the object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Name of the i-node (start)
    pub i_node: String,
    /// Name of the j-node (end)
    pub j_node: String,
    /// Name of the section
    pub section: String,
    /// Rotation of the local 2-3 axes about the longitudinal axis (radians)
    pub rotation: f64,
    /// Output station spacing
    pub stations: StationOptions,

    /// Object length, set during analysis
    #[serde(skip)]
    pub(crate) length: Option<f64>,

    /// Analysis elements, ordered from the i-node
    #[serde(skip)]
    pub(crate) segments: Vec<Segment>,

    /// Local end forces of each segment by load case
    /// [Fx_i, Fy_i, Fz_i, Mx_i, My_i, Mz_i, Fx_j, Fy_j, Fz_j, Mx_j, My_j, Mz_j]
    #[serde(skip)]
    pub(crate) segment_forces: HashMap<String, Vec<[f64; 12]>>,

    /// Loads acting on each segment by load case, local components
    #[serde(skip)]
    pub(crate) segment_loads: HashMap<String, Vec<Vec<SegmentLoad>>>,
}

impl Member {
    /// Create a new member
    pub fn new(i_node: &str, j_node: &str, section: &str) -> Self {
        Self {
            i_node: i_node.to_string(),
            j_node: j_node.to_string(),
            section: section.to_string(),
            rotation: 0.0,
            stations: StationOptions::default(),
            length: None,
            segments: Vec::new(),
            segment_forces: HashMap::new(),
            segment_loads: HashMap::new(),
        }
    }

    /// Set member rotation about its longitudinal axis
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set output station spacing
    pub fn with_stations(mut self, stations: StationOptions) -> Self {
        self.stations = stations;
        self
    }

    /// Get the member length (available after analysis)
    pub fn length(&self) -> Option<f64> {
        self.length
    }

    /// Analysis elements the member was split into
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Local end forces of every segment for a load case
    pub fn segment_forces(&self, case: &str) -> Option<&[[f64; 12]]> {
        self.segment_forces.get(case).map(Vec::as_slice)
    }

    pub(crate) fn clear_results(&mut self) {
        self.length = None;
        self.segments.clear();
        self.segment_forces.clear();
        self.segment_loads.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_creation() {
        let member = Member::new("1", "2", "Default");
        assert_eq!(member.i_node, "1");
        assert_eq!(member.j_node, "2");
        assert_eq!(member.rotation, 0.0);
        assert!(member.length().is_none());
        assert!(member.segments().is_empty());
    }

    #[test]
    fn test_member_builders() {
        let member = Member::new("1", "2", "Default")
            .with_rotation(0.5)
            .with_stations(StationOptions::with_max_spacing(0.5));
        assert_eq!(member.rotation, 0.5);
        assert_eq!(member.stations.max_spacing, Some(0.5));
    }
}
