//! Chemical system and state errors.

use kf_core::{KfError, UnitError};
use thiserror::Error;

/// Result type for chemical system/state operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while building systems or querying/mutating chemical states.
///
/// Every mutator validates before touching the state, so an `Err` always
/// leaves the state unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemError {
    /// Negative amount/scalar/volume, non-positive T or P, overlapping sets.
    #[error("Validation failed: {what}")]
    Validation { what: String },

    /// Vector or index collection with the wrong length.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Unknown species, element, or phase name.
    #[error("Unknown {kind} '{name}'")]
    Lookup { kind: &'static str, name: String },

    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    /// Units neither convertible to amount nor to mass.
    #[error("Units '{units}' are not convertible to amount (mol) or mass (kg)")]
    NotAmountOrMass { units: String },

    /// Quantity expression with an unrecognised kind.
    #[error("Unsupported quantity expression '{expression}'")]
    UnsupportedQuantity { expression: String },

    #[error("Invalid formula '{formula}': {reason}")]
    Formula { formula: String, reason: String },

    /// Failure inside a thermodynamic property model.
    #[error("Property model error: {message}")]
    Model { message: String },

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl ChemError {
    pub(crate) fn validation(what: impl Into<String>) -> Self {
        ChemError::Validation { what: what.into() }
    }
}

impl From<KfError> for ChemError {
    fn from(err: KfError) -> Self {
        match err {
            KfError::IndexOob { what, index, len } => ChemError::IndexOob { what, index, len },
            other => ChemError::Validation {
                what: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ChemError::Lookup {
            kind: "species",
            name: "Xx".into(),
        };
        assert!(err.to_string().contains("Xx"));

        let err = ChemError::DimensionMismatch {
            what: "species amounts",
            expected: 4,
            actual: 3,
        };
        assert!(err.to_string().contains("expected 4"));
    }

    #[test]
    fn core_error_maps_to_validation() {
        let err: ChemError = KfError::Negative {
            what: "amount",
            value: -1.0,
        }
        .into();
        assert!(matches!(err, ChemError::Validation { .. }));

        let err: ChemError = KfError::IndexOob {
            what: "species",
            index: 9,
            len: 2,
        }
        .into();
        assert!(matches!(err, ChemError::IndexOob { index: 9, .. }));
    }
}
