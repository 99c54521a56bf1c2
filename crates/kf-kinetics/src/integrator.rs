//! One-step ODE integrators for the kinetic species.

use std::cell::RefCell;

use nalgebra::DVector;

use crate::error::{KineticError, KineticResult};
use crate::model::KineticModel;
use crate::options::NewtonOptions;
use kf_equilibrium::{finite_difference_jacobian, newton_solve};

/// Trait for time integrators.
pub trait Integrator {
    /// Advance `y` from `t` to `t + dt`.
    fn step<M: KineticModel>(
        &self,
        model: &mut M,
        t: f64,
        y: &DVector<f64>,
        dt: f64,
    ) -> KineticResult<DVector<f64>>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: KineticModel>(
        &self,
        model: &mut M,
        t: f64,
        y: &DVector<f64>,
        dt: f64,
    ) -> KineticResult<DVector<f64>> {
        let k1 = model.rhs(t, y)?;
        let k2 = model.rhs(t + 0.5 * dt, &(y + &k1 * (0.5 * dt)))?;
        let k3 = model.rhs(t + 0.5 * dt, &(y + &k2 * (0.5 * dt)))?;
        let k4 = model.rhs(t + dt, &(y + &k3 * dt))?;

        // y_new = y + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = k1 + k2 * 2.0 + k3 * 2.0 + k4;
        Ok(y + k_sum * (dt / 6.0))
    }
}

/// Forward Euler (explicit, 1st order).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: KineticModel>(
        &self,
        model: &mut M,
        t: f64,
        y: &DVector<f64>,
        dt: f64,
    ) -> KineticResult<DVector<f64>> {
        let ydot = model.rhs(t, y)?;
        Ok(y + ydot * dt)
    }
}

/// Backward Euler (implicit, 1st order, A-stable).
///
/// Solves `g(z) = z - y - dt f(t + dt, z) = 0` by Newton with a
/// finite-difference Jacobian, then returns `y + dt f(t + dt, z)` so the
/// increment is an exact image of the rate map.
#[derive(Clone, Debug, Default)]
pub struct BackwardEuler {
    pub newton: NewtonOptions,
}

impl Integrator for BackwardEuler {
    fn step<M: KineticModel>(
        &self,
        model: &mut M,
        t: f64,
        y: &DVector<f64>,
        dt: f64,
    ) -> KineticResult<DVector<f64>> {
        let t_new = t + dt;
        let model = RefCell::new(model);
        let residual = |z: &DVector<f64>| -> KineticResult<DVector<f64>> {
            let f = model.borrow_mut().rhs(t_new, z)?;
            Ok(z - y - f * dt)
        };
        let epsilon = self.newton.jacobian_epsilon;
        let jacobian = |z: &DVector<f64>| finite_difference_jacobian(z, residual, epsilon);

        let config = self.newton.config(y.amax());
        let solution = newton_solve(y.clone(), residual, jacobian, &config)?;

        let f = model.borrow_mut().rhs(t_new, &solution.x)?;
        let y_new = y + f * dt;
        if y_new.iter().all(|v| v.is_finite()) {
            Ok(y_new)
        } else {
            Err(KineticError::NonPhysical {
                what: "implicit step produced non-finite amounts".to_string(),
            })
        }
    }
}
