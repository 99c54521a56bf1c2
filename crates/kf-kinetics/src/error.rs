//! Error types for kinetic simulation.

use kf_chem::ChemError;
use kf_equilibrium::EquilibriumError;
use thiserror::Error;

/// Errors encountered while configuring or stepping a kinetic problem.
#[derive(Error, Debug)]
pub enum KineticError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// `step`/`solve` called before `initialize`, or after the partition changed.
    #[error("Kinetic solver is not initialized")]
    NotInitialized,

    #[error("Reaction error: {what}")]
    Reaction { what: String },

    /// Negative amounts or non-finite rates; recoverable by a smaller step.
    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Chemical error: {0}")]
    Chem(#[from] ChemError),

    #[error("Equilibrium error: {0}")]
    Equilibrium(#[from] EquilibriumError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type KineticResult<T> = Result<T, KineticError>;

impl KineticError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        KineticError::InvalidArg { what: what.into() }
    }

    /// Whether retrying with a smaller step may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            KineticError::NonPhysical { .. } | KineticError::ConvergenceFailed { .. } => true,
            KineticError::Equilibrium(e) => matches!(
                e,
                EquilibriumError::ConvergenceFailed { .. } | EquilibriumError::Numeric { .. }
            ),
            _ => false,
        }
    }
}
