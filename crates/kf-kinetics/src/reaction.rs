//! Reactions and rate laws.

use std::fmt;

use nalgebra::DVector;

use crate::error::{KineticError, KineticResult};
use kf_chem::ChemicalSystem;

/// Everything a rate law may depend on, evaluated at the current (T, P, n).
#[derive(Debug, Clone, Copy)]
pub struct RateContext<'a> {
    /// Temperature [K]
    pub temperature: f64,
    /// Pressure [Pa]
    pub pressure: f64,
    /// Species amounts [mol]
    pub amounts: &'a DVector<f64>,
    /// Species activities
    pub activities: &'a DVector<f64>,
    /// Species indices and coefficients of the reaction (negative for reactants)
    pub stoichiometry: &'a [(usize, f64)],
    /// ln K of the reaction at T, P
    pub ln_k: f64,
}

impl RateContext<'_> {
    /// ln of the reaction quotient, `sum nu_i ln a_i`.
    pub fn ln_q(&self) -> f64 {
        self.stoichiometry
            .iter()
            .map(|&(i, nu)| nu * self.activities[i].ln())
            .sum()
    }

    /// Saturation ratio Omega = Q/K.
    pub fn omega(&self) -> f64 {
        (self.ln_q() - self.ln_k).exp()
    }
}

/// Reaction rate [mol/s]; positive in the forward direction.
pub trait RateLaw: Send + Sync {
    fn rate(&self, ctx: &RateContext<'_>) -> f64;
}

impl<F> RateLaw for F
where
    F: Fn(&RateContext<'_>) -> f64 + Send + Sync,
{
    fn rate(&self, ctx: &RateContext<'_>) -> f64 {
        self(ctx)
    }
}

/// `r = forward * prod(a_reactants^|nu|) - backward * prod(a_products^nu)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassActionRate {
    pub forward: f64,
    pub backward: f64,
}

impl RateLaw for MassActionRate {
    fn rate(&self, ctx: &RateContext<'_>) -> f64 {
        let mut reactants = 1.0;
        let mut products = 1.0;
        for &(i, nu) in ctx.stoichiometry {
            let a = ctx.activities[i];
            if nu < 0.0 {
                reactants *= a.powf(-nu);
            } else {
                products *= a.powf(nu);
            }
        }
        self.forward * reactants - self.backward * products
    }
}

/// Transition-state-theory rate `r = k * area * (1 - Omega)`.
///
/// `k` is in mol/(m² s) and `area` in m².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionStateRate {
    pub k: f64,
    pub area: f64,
}

impl RateLaw for TransitionStateRate {
    fn rate(&self, ctx: &RateContext<'_>) -> f64 {
        self.k * self.area * (1.0 - ctx.omega())
    }
}

/// A named reaction with resolved stoichiometry and a rate law.
pub struct Reaction {
    name: String,
    stoichiometry: Vec<(usize, f64)>,
    rate: Box<dyn RateLaw>,
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("stoichiometry", &self.stoichiometry)
            .finish_non_exhaustive()
    }
}

impl Reaction {
    /// Build a reaction from species names and coefficients, e.g.
    /// `&[("Na+", -1.0), ("Cl-", -1.0), ("NaCl(aq)", 1.0)]`.
    pub fn new(
        system: &ChemicalSystem,
        name: impl Into<String>,
        stoichiometry: &[(&str, f64)],
        rate: impl RateLaw + 'static,
    ) -> KineticResult<Self> {
        let name = name.into();
        if stoichiometry.is_empty() {
            return Err(KineticError::Reaction {
                what: format!("reaction '{name}' has no species"),
            });
        }
        let mut resolved: Vec<(usize, f64)> = Vec::with_capacity(stoichiometry.len());
        for &(species, nu) in stoichiometry {
            if !nu.is_finite() || nu == 0.0 {
                return Err(KineticError::Reaction {
                    what: format!("reaction '{name}': coefficient of '{species}' must be finite and non-zero"),
                });
            }
            let i = system.resolve_species(species)?;
            if resolved.iter().any(|&(j, _)| j == i) {
                return Err(KineticError::Reaction {
                    what: format!("reaction '{name}' lists '{species}' twice"),
                });
            }
            resolved.push((i, nu));
        }
        Ok(Self {
            name,
            stoichiometry: resolved,
            rate: Box::new(rate),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stoichiometry(&self) -> &[(usize, f64)] {
        &self.stoichiometry
    }

    /// Coefficient of species `i` (zero when absent).
    pub fn coefficient(&self, i: usize) -> f64 {
        self.stoichiometry
            .iter()
            .find(|&&(j, _)| j == i)
            .map_or(0.0, |&(_, nu)| nu)
    }

    /// `ln K = -sum(nu_i G0_i) / RT`.
    pub fn ln_equilibrium_constant(&self, g0: &DVector<f64>, rt: f64) -> f64 {
        -self
            .stoichiometry
            .iter()
            .map(|&(i, nu)| nu * g0[i])
            .sum::<f64>()
            / rt
    }

    pub fn rate(&self, ctx: &RateContext<'_>) -> f64 {
        self.rate.rate(ctx)
    }
}
