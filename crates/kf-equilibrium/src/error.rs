//! Error types for equilibrium calculations.

use kf_chem::ChemError;
use kf_core::UnitError;
use thiserror::Error;

/// Errors that can occur while solving for chemical equilibrium.
#[derive(Error, Debug)]
pub enum EquilibriumError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    /// Iteration budget exhausted, stagnated line search or infeasible element budget.
    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Chemical error: {0}")]
    Chem(#[from] ChemError),
}

pub type EquilibriumResult<T> = Result<T, EquilibriumError>;

impl From<UnitError> for EquilibriumError {
    fn from(e: UnitError) -> Self {
        EquilibriumError::Chem(ChemError::Unit(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_chemical_errors() {
        let err: EquilibriumError = ChemError::Lookup {
            kind: "species",
            name: "Xx".into(),
        }
        .into();
        assert!(err.to_string().contains("Unknown species 'Xx'"));

        let err: EquilibriumError = UnitError::UnknownUnit { unit: "furlong".into() }.into();
        assert!(matches!(err, EquilibriumError::Chem(ChemError::Unit(_))));
    }
}
