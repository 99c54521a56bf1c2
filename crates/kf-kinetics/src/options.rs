//! Kinetic solver options and their YAML/JSON loaders.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KineticError, KineticResult};
use kf_equilibrium::{EquilibriumOptions, NewtonConfig};

/// ODE scheme used to advance the kinetic species.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorType {
    #[default]
    BackwardEuler,
    RK4,
    ForwardEuler,
}

impl IntegratorType {
    /// Order of accuracy, used by the step-doubling error estimate.
    pub fn order(self) -> i32 {
        match self {
            IntegratorType::BackwardEuler | IntegratorType::ForwardEuler => 1,
            IntegratorType::RK4 => 4,
        }
    }
}

/// Newton settings for the implicit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonOptions {
    pub max_iterations: usize,
    /// Residual tolerance relative to the largest kinetic amount (at least 1 mol)
    pub tolerance: f64,
    /// Relative perturbation of the finite-difference Jacobian
    pub jacobian_epsilon: f64,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tolerance: 1e-14,
            jacobian_epsilon: 1e-8,
        }
    }
}

impl NewtonOptions {
    pub(crate) fn config(&self, scale: f64) -> NewtonConfig {
        NewtonConfig {
            max_iterations: self.max_iterations,
            abs_tol: self.tolerance * scale.max(1.0),
            ..NewtonConfig::default()
        }
    }
}

/// Step control and sub-solver settings of the kinetic solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticOptions {
    pub integrator: IntegratorType,
    /// First step tried by the adaptive `step` [s]
    pub initial_step: f64,
    /// Smallest step a cutback may produce [s]
    pub min_step: f64,
    /// Largest adaptive step [s]
    pub max_step: f64,
    /// Maximum cutbacks within one step call
    pub max_retries: usize,
    pub cutback_factor: f64,
    pub grow_factor: f64,
    /// Absolute error tolerance of the adaptive step [mol]
    pub abstol: f64,
    /// Relative error tolerance of the adaptive step
    pub reltol: f64,
    /// Maximum number of steps in one `solve`
    pub max_steps: usize,
    /// Negative kinetic amounts above `-negative_tolerance` are clamped to zero [mol].
    /// Without equilibrium species any negative amount is rejected instead.
    pub negative_tolerance: f64,
    pub newton: NewtonOptions,
    pub equilibrium: EquilibriumOptions,
}

impl Default for KineticOptions {
    fn default() -> Self {
        Self {
            integrator: IntegratorType::default(),
            initial_step: 1.0,
            min_step: 1e-10,
            max_step: 1e6,
            max_retries: 10,
            cutback_factor: 0.5,
            grow_factor: 2.0,
            abstol: 1e-10,
            reltol: 1e-6,
            max_steps: 100_000,
            negative_tolerance: 1e-12,
            newton: NewtonOptions::default(),
            equilibrium: EquilibriumOptions::default(),
        }
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl KineticOptions {
    pub fn validate(&self) -> KineticResult<()> {
        if !positive(self.initial_step) {
            return Err(KineticError::invalid("initial_step must be positive"));
        }
        if !positive(self.min_step) || !positive(self.max_step) || self.min_step > self.max_step {
            return Err(KineticError::invalid(
                "min_step and max_step must be positive with min_step <= max_step",
            ));
        }
        if !(self.cutback_factor > 0.0 && self.cutback_factor < 1.0) {
            return Err(KineticError::invalid("cutback_factor must lie in (0, 1)"));
        }
        if !(self.grow_factor.is_finite() && self.grow_factor >= 1.0) {
            return Err(KineticError::invalid("grow_factor must be at least 1"));
        }
        if !positive(self.abstol) || !positive(self.reltol) {
            return Err(KineticError::invalid("abstol and reltol must be positive"));
        }
        if self.max_steps == 0 {
            return Err(KineticError::invalid("max_steps must be at least 1"));
        }
        if !(self.negative_tolerance.is_finite() && self.negative_tolerance >= 0.0) {
            return Err(KineticError::invalid("negative_tolerance must be non-negative"));
        }
        if self.newton.max_iterations == 0
            || !positive(self.newton.tolerance)
            || !positive(self.newton.jacobian_epsilon)
        {
            return Err(KineticError::invalid(
                "newton settings need at least one iteration and positive tolerances",
            ));
        }
        self.equilibrium.validate()?;
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> KineticResult<Self> {
        let options: Self = serde_yaml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_str(content: &str) -> KineticResult<Self> {
        let options: Self = serde_json::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load_yaml(path: &Path) -> KineticResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn load_json(path: &Path) -> KineticResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn save_yaml(&self, path: &Path) -> KineticResult<()> {
        self.validate()?;
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
