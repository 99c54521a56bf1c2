//! Right-hand side abstraction for the kinetic ODE.

use nalgebra::DVector;

use crate::error::KineticResult;

/// An ODE `dy/dt = f(t, y)` over a vector of amounts.
pub trait KineticModel {
    fn rhs(&mut self, t: f64, y: &DVector<f64>) -> KineticResult<DVector<f64>>;
}
