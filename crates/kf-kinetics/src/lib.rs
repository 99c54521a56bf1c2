//! Kinetic time integration of partitioned chemical systems.
//!
//! This crate provides:
//! - [`Reaction`]s with pluggable [`RateLaw`]s, collected in a [`ReactionSystem`]
//! - Forward Euler, RK4 and backward Euler [`Integrator`]s
//! - [`KineticSolver`], which advances kinetic species by ODE steps and
//!   re-solves the equilibrium species after every step

pub mod error;
pub mod integrator;
pub mod model;
pub mod network;
pub mod options;
pub mod reaction;
pub mod solver;

pub use error::{KineticError, KineticResult};
pub use integrator::{BackwardEuler, ForwardEuler, Integrator, RK4};
pub use model::KineticModel;
pub use network::ReactionSystem;
pub use options::{IntegratorType, KineticOptions, NewtonOptions};
pub use reaction::{MassActionRate, RateContext, RateLaw, Reaction, TransitionStateRate};
pub use solver::{KineticSolver, KineticStats};
