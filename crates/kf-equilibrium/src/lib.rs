//! Chemical equilibrium by Gibbs energy minimisation.
//!
//! This crate provides:
//! - A damped Newton solver and finite-difference Jacobians
//! - [`EquilibriumSolver`] for the equilibrium species of a partition
//! - [`EquilibriumProblem`] and [`ChemicalComposition`] for setting up
//!   problems from element amounts or fluid compositions

pub mod composition;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod options;
pub mod problem;
pub mod solver;

pub use composition::ChemicalComposition;
pub use error::{EquilibriumError, EquilibriumResult};
pub use jacobian::finite_difference_jacobian;
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
pub use options::EquilibriumOptions;
pub use problem::{EquilibriumProblem, solve_problem};
pub use solver::{EquilibriumSolution, EquilibriumSolver};
