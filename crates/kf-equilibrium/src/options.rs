//! Equilibrium solver options.

use serde::{Deserialize, Serialize};

use crate::error::{EquilibriumError, EquilibriumResult};
use crate::newton::NewtonConfig;

/// Settings for the Gibbs energy minimisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumOptions {
    /// Maximum Newton iterations
    pub max_iterations: usize,
    /// Residual norm below which the solve is converged
    pub tolerance: f64,
    /// Largest change of any ln(n) in one Newton step
    pub max_log_step: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Lower bound of the initial guess, as a fraction of the largest element amount
    pub initial_amount_fraction: f64,
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            max_log_step: 5.0,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
            initial_amount_fraction: 1e-8,
        }
    }
}

impl EquilibriumOptions {
    pub fn validate(&self) -> EquilibriumResult<()> {
        let invalid = |what: &str| {
            Err(EquilibriumError::ProblemSetup {
                what: what.to_string(),
            })
        };
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if !positive(self.tolerance) {
            return invalid("tolerance must be positive");
        }
        if !positive(self.max_log_step) {
            return invalid("max_log_step must be positive");
        }
        if !unit_interval(self.line_search_beta) {
            return invalid("line_search_beta must lie in (0, 1)");
        }
        if !unit_interval(self.initial_amount_fraction) {
            return invalid("initial_amount_fraction must lie in (0, 1)");
        }
        Ok(())
    }

    /// Newton settings where the first `num_species` unknowns are log-amounts.
    pub(crate) fn newton_config(&self, num_species: usize) -> NewtonConfig {
        NewtonConfig {
            max_iterations: self.max_iterations,
            abs_tol: self.tolerance,
            rel_tol: 0.0,
            max_step: self.max_log_step,
            capped_len: Some(num_species),
            line_search_beta: self.line_search_beta,
            max_line_search_iters: self.max_line_search_iters,
        }
    }
}

pub(crate) fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Open interval (0, 1).
pub(crate) fn unit_interval(v: f64) -> bool {
    v > 0.0 && v < 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EquilibriumOptions::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let opts = EquilibriumOptions {
            line_search_beta: 1.0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        let opts = EquilibriumOptions {
            tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn newton_config_caps_log_amounts_only() {
        let config = EquilibriumOptions::default().newton_config(4);
        assert_eq!(config.capped_len, Some(4));
        assert_eq!(config.max_step, 5.0);
        assert_eq!(config.rel_tol, 0.0);
    }
}
