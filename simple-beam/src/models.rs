use std::fmt;

use serde::{Deserialize, Serialize};

/// Support reaction of one node for one load case, global axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub node: String,
    pub load_case: String,
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

impl ReactionRecord {
    /// Reaction as [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }
}

impl fmt::Display for ReactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Point {} [{}]: F1={} F2={} F3={} M1={} M2={} M3={}",
            self.node, self.load_case, self.fx, self.fy, self.fz, self.mx, self.my, self.mz
        )
    }
}

/// Internal forces of a frame at one output station for one load case,
/// frame local axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceRecord {
    pub frame: String,
    /// Distance from the frame start
    pub station: f64,
    pub load_case: String,
    /// Analysis element the station belongs to
    pub element: String,
    /// Distance from the element start
    pub element_station: f64,
    /// Axial force, tension positive
    pub p: f64,
    pub v2: f64,
    pub v3: f64,
    pub t: f64,
    pub m2: f64,
    pub m3: f64,
}

impl fmt::Display for ForceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame {} [{}] @ {}: P={} V2={} V3={} T={} M2={} M3={}",
            self.frame, self.load_case, self.station, self.p, self.v2, self.v3, self.t, self.m2, self.m3
        )
    }
}
