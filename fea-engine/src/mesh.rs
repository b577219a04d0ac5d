//! Member meshing and output stations
//!
//! A member is split into analysis elements at every node lying on it.
//! Internal forces are recovered at stations along each element from the
//! element end forces and the loads acting between the element start and
//! the station.

use serde::{Deserialize, Serialize};

use crate::math::{self, Vec12, Vec3};

/// Distance below which a node counts as lying on a member
pub const ON_MEMBER_TOLERANCE: f64 = 1e-6;

/// One analysis element of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Element name, `<member>-<n>` counted from the member i-node
    pub name: String,
    /// Start node
    pub i_node: String,
    /// End node
    pub j_node: String,
    /// Distance of the element start from the member i-node
    pub start: f64,
    /// Element length
    pub length: f64,
}

/// Output station spacing along each analysis element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationOptions {
    /// Minimum number of stations per element, ends included
    pub min_stations: usize,
    /// Maximum distance between adjacent stations
    pub max_spacing: Option<f64>,
}

impl Default for StationOptions {
    fn default() -> Self {
        Self {
            min_stations: 3,
            max_spacing: None,
        }
    }
}

impl StationOptions {
    /// Default station count refined to at most `spacing` between stations
    pub fn with_max_spacing(spacing: f64) -> Self {
        Self {
            max_spacing: Some(spacing),
            ..Self::default()
        }
    }

    /// Station positions along an element of `length`, ascending, both ends included
    pub fn positions(&self, length: f64) -> Vec<f64> {
        let mut intervals = self.min_stations.saturating_sub(1).max(1);
        if let Some(spacing) = self.max_spacing.filter(|s| *s > 0.0) {
            intervals = intervals.max((length / spacing - 1e-9).ceil() as usize);
        }
        (0..=intervals)
            .map(|i| {
                if i == intervals {
                    length
                } else {
                    length * i as f64 / intervals as f64
                }
            })
            .collect()
    }
}

/// Split a member into elements at the nodes lying strictly between its ends
///
/// `candidates` are all model nodes as (name, coordinates). Nodes within
/// `tolerance` of the member line are taken, ordered by distance from the
/// i-node.
pub fn split_member(
    member: &str,
    i_node: (&str, [f64; 3]),
    j_node: (&str, [f64; 3]),
    candidates: &[(String, [f64; 3])],
    tolerance: f64,
) -> Vec<Segment> {
    let origin = Vec3::from(i_node.1);
    let axis = Vec3::from(j_node.1) - origin;
    let length = axis.norm();

    let mut cuts: Vec<(f64, &str)> = Vec::new();
    if length > 0.0 {
        for (name, coords) in candidates {
            if name == i_node.0 || name == j_node.0 {
                continue;
            }
            let offset = Vec3::from(*coords) - origin;
            let t = offset.dot(&axis) / (length * length);
            let distance = t * length;
            if distance <= tolerance || distance >= length - tolerance {
                continue;
            }
            if (offset - axis * t).norm() < tolerance {
                cuts.push((distance, name.as_str()));
            }
        }
    }
    cuts.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    // Coincident nodes: keep the first one by name
    cuts.dedup_by(|b, a| (b.0 - a.0).abs() < tolerance);

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut start = (0.0, i_node.0);
    for end in cuts.into_iter().chain(std::iter::once((length, j_node.0))) {
        segments.push(Segment {
            name: format!("{}-{}", member, segments.len() + 1),
            i_node: start.1.to_string(),
            j_node: end.1.to_string(),
            start: start.0,
            length: end.0 - start.0,
        });
        start = end;
    }
    segments
}

/// A linear line load on one element, in local components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLoad {
    /// Start distance from the element start
    pub x1: f64,
    /// End distance from the element start
    pub x2: f64,
    /// Local (1, 2, 3) intensities at `x1`
    pub w1: [f64; 3],
    /// Local (1, 2, 3) intensities at `x2`
    pub w2: [f64; 3],
}

impl SegmentLoad {
    /// Clip a member-level load from `x1` to `x2` to the element starting at
    /// `start` with `length`. Returns `None` when they do not overlap.
    pub fn clip(
        x1: f64,
        x2: f64,
        w1: [f64; 3],
        w2: [f64; 3],
        start: f64,
        length: f64,
    ) -> Option<Self> {
        let a = x1.max(start);
        let b = x2.min(start + length);
        if b - a <= 1e-12 {
            return None;
        }
        let at = |x: f64| {
            let s = (x - x1) / (x2 - x1);
            [0, 1, 2].map(|k| w1[k] + (w2[k] - w1[k]) * s)
        };
        Some(Self {
            x1: a - start,
            x2: b - start,
            w1: at(a),
            w2: at(b),
        })
    }

    /// Intensity vector at distance `x` from the element start
    fn intensity(&self, x: f64) -> Vec3 {
        let s = (x - self.x1) / (self.x2 - self.x1);
        Vec3::from([0, 1, 2].map(|k| self.w1[k] + (self.w2[k] - self.w1[k]) * s))
    }

    /// Total force of the load, local components
    pub fn resultant(&self) -> Vec3 {
        (Vec3::from(self.w1) + Vec3::from(self.w2)) * (0.5 * (self.x2 - self.x1))
    }

    /// Local fixed end reactions on an element of `length`
    pub fn fixed_end_reactions(&self, length: f64) -> Vec12 {
        (0..3).fold(Vec12::zeros(), |fer, axis| {
            fer + math::fer_linear_load(self.w1[axis], self.w2[axis], self.x1, self.x2, length, axis)
        })
    }
}

/// Internal forces [P, V2, V3, T, M2, M3] at distance `x` along an element
///
/// `end_forces` are the local forces acting on the element at its ends
/// (stiffness forces plus fixed end reactions). P is positive in tension and
/// M3 is positive when the element sags under local -2 loading.
pub fn section_forces(end_forces: &[f64; 12], loads: &[SegmentLoad], x: f64) -> [f64; 6] {
    let f = end_forces;
    let mut force = Vec3::zeros();
    let mut moment_arm = Vec3::zeros();

    for load in loads {
        let b = load.x2.min(x);
        if b - load.x1 <= 1e-12 {
            continue;
        }
        force += math::gauss_legendre_3(load.x1, b, |xi| load.intensity(xi));
        moment_arm += math::gauss_legendre_3(load.x1, b, |xi| load.intensity(xi) * (xi - x));
    }

    [
        -(f[0] + force.x),
        -(f[1] + force.y),
        -(f[2] + force.z),
        -f[3],
        -(f[4] + x * f[2] - moment_arm.z),
        -(f[5] - x * f[1] + moment_arm.y),
    ]
}

/// Internal forces at one output station of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationForces {
    /// Distance from the member i-node
    pub station: f64,
    /// Analysis element the station belongs to
    pub element: String,
    /// Distance from the element start
    pub element_station: f64,
    /// Load case
    pub load_case: String,
    /// Axial force, tension positive
    pub p: f64,
    pub v2: f64,
    pub v3: f64,
    pub t: f64,
    pub m2: f64,
    pub m3: f64,
}
