//! Load cases

use serde::{Deserialize, Serialize};

/// A load case groups related loads under a common name and is analyzed
/// independently
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCase {
    /// Name of the load case
    pub name: String,
    /// Factor applied to member self weight
    pub self_weight_multiplier: f64,
    /// Whether results of this case are reported
    pub selected_for_output: bool,
}

impl LoadCase {
    /// Create a new load case without self weight
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            self_weight_multiplier: 0.0,
            selected_for_output: true,
        }
    }

    /// Set the self weight multiplier
    pub fn with_self_weight(mut self, multiplier: f64) -> Self {
        self.self_weight_multiplier = multiplier;
        self
    }

    /// Dead load case, carrying full self weight
    pub fn dead() -> Self {
        Self::new("DEAD").with_self_weight(1.0)
    }
}
