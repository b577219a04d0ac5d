//! Analysis types and options

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Type of structural analysis to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisType {
    /// First-order linear static analysis
    #[default]
    Linear,
}

/// Degrees of freedom that take part in the analysis,
/// flags in [UX, UY, UZ, RX, RY, RZ] order.
///
/// Inactive DOFs carry no stiffness, load or reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDofs(pub [bool; 6]);

impl ActiveDofs {
    /// All six DOFs
    pub fn space_frame() -> Self {
        Self([true; 6])
    }

    /// Frame in the global XZ plane: UX, UZ, RY
    pub fn plane_xz() -> Self {
        Self([true, false, true, false, true, false])
    }

    /// Frame in the global XY plane: UX, UY, RZ
    pub fn plane_xy() -> Self {
        Self([true, true, false, false, false, true])
    }

    /// Check if DOF `dof` (0-5) is active
    pub fn is_active(&self, dof: usize) -> bool {
        self.0.get(dof).copied().unwrap_or(false)
    }

    /// Number of active DOFs per node
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&a| a).count()
    }
}

impl Default for ActiveDofs {
    fn default() -> Self {
        Self::space_frame()
    }
}

/// Options for structural analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Type of analysis
    pub analysis_type: AnalysisType,
    /// Check static equilibrium after each load case
    pub check_statics: bool,
    /// Abort when the analysis runs longer than this
    pub timeout: Option<Duration>,
    /// Free DOFs whose stiffness falls below this fraction of the largest
    /// diagonal term are reported as unstable
    pub stability_tolerance: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::Linear,
            check_statics: true,
            timeout: None,
            stability_tolerance: 1e-12,
        }
    }
}

impl AnalysisOptions {
    /// Create options for linear analysis
    pub fn linear() -> Self {
        Self::default()
    }

    /// Set the time limit
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Skip the statics check
    pub fn without_statics_check(mut self) -> Self {
        self.check_statics = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_xz_dofs() {
        let dofs = ActiveDofs::plane_xz();
        assert_eq!(dofs.count(), 3);
        assert!(dofs.is_active(0) && dofs.is_active(2) && dofs.is_active(4));
        assert!(!dofs.is_active(1));
        assert!(!dofs.is_active(6));
    }
}
