//! Damped Newton solver with backtracking line search and a step cap.

use crate::error::EquilibriumError;
use nalgebra::{DMatrix, DVector};

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm (relative to the initial norm)
    pub rel_tol: f64,
    /// Largest allowed |dx_i| over the capped unknowns; longer steps are shrunk
    pub max_step: f64,
    /// Only the leading `capped_len` unknowns count towards `max_step` (all when `None`)
    pub capped_len: Option<usize>,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-10,
            rel_tol: 0.0,
            max_step: f64::INFINITY,
            capped_len: None,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Newton solver with line search.
///
/// Trial points whose residual is not finite are treated like points that
/// fail to reduce the residual.
pub fn newton_solve<F, J, E>(
    x0: DVector<f64>,
    mut residual_fn: F,
    mut jacobian_fn: J,
    config: &NewtonConfig,
) -> Result<NewtonResult, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
    J: FnMut(&DVector<f64>) -> Result<DMatrix<f64>, E>,
    E: From<EquilibriumError>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    if !r_norm.is_finite() {
        return Err(EquilibriumError::Numeric {
            what: "residual is not finite at the initial guess".to_string(),
        }
        .into());
    }
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x)?;

        // Solve J * dx = -r
        let mut dx = jac.lu().solve(&(-&r)).ok_or_else(|| EquilibriumError::Numeric {
            what: format!("singular Jacobian at iteration {iter}"),
        })?;
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(EquilibriumError::Numeric {
                what: format!("non-finite Newton step at iteration {iter}"),
            }
            .into());
        }

        let capped = config.capped_len.unwrap_or(dx.len()).min(dx.len());
        let longest = dx.rows(0, capped).amax();
        if longest > config.max_step {
            dx *= config.max_step / longest;
        }

        let mut alpha = 1.0;
        let mut x_new = &x + &dx;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();

        for _ in 0..config.max_line_search_iters {
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }

            // Backtrack
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        if !r_new_norm.is_finite() {
            return Err(EquilibriumError::ConvergenceFailed {
                what: format!("line search found no finite residual at iteration {iter}"),
            }
            .into());
        }

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        if alpha < 1e-10 {
            return Err(EquilibriumError::ConvergenceFailed {
                what: format!("line search stagnated at iteration {iter}"),
            }
            .into());
        }
    }

    if r_norm < config.abs_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }

    Err(EquilibriumError::ConvergenceFailed {
        what: format!(
            "maximum iterations {} reached, residual = {:e}",
            config.max_iterations, r_norm
        ),
    }
    .into())
}
