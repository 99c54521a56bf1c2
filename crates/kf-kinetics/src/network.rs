//! A set of reactions over one chemical system.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{KineticError, KineticResult};
use crate::reaction::{RateContext, Reaction};
use kf_chem::ChemicalSystem;
use kf_core::constants::GAS_CONSTANT;

/// Element and charge imbalance tolerated in a reaction, relative to its largest coefficient.
const BALANCE_TOL: f64 = 1e-10;

/// Reactions sharing a chemical system, with their stoichiometric matrix.
#[derive(Debug)]
pub struct ReactionSystem {
    system: Arc<ChemicalSystem>,
    reactions: Vec<Reaction>,
    /// Reactions × species
    stoichiometry: DMatrix<f64>,
}

impl ReactionSystem {
    /// Every reaction must conserve every element and charge.
    pub fn new(system: Arc<ChemicalSystem>, reactions: Vec<Reaction>) -> KineticResult<Self> {
        let num_species = system.num_species();
        let mut stoichiometry = DMatrix::zeros(reactions.len(), num_species);
        for (r, reaction) in reactions.iter().enumerate() {
            for &(i, nu) in reaction.stoichiometry() {
                if i >= num_species {
                    return Err(KineticError::Reaction {
                        what: format!(
                            "reaction '{}' refers to species {i} of a {num_species}-species system",
                            reaction.name()
                        ),
                    });
                }
                stoichiometry[(r, i)] = nu;
            }
        }

        let imbalance = system.formula_matrix() * stoichiometry.transpose();
        for (r, reaction) in reactions.iter().enumerate() {
            let scale = stoichiometry.row(r).amax().max(1.0);
            for (j, element) in system.elements().iter().enumerate() {
                let delta = imbalance[(j, r)];
                if delta.abs() > BALANCE_TOL * scale {
                    return Err(KineticError::Reaction {
                        what: format!(
                            "reaction '{}' is not balanced in {} (net {delta:+})",
                            reaction.name(),
                            element.symbol()
                        ),
                    });
                }
            }
        }

        debug!(reactions = reactions.len(), species = num_species, "reaction system built");
        Ok(Self {
            system,
            reactions,
            stoichiometry,
        })
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn num_reactions(&self) -> usize {
        self.reactions.len()
    }

    /// Stoichiometric matrix, one row per reaction.
    pub fn stoichiometric_matrix(&self) -> &DMatrix<f64> {
        &self.stoichiometry
    }

    /// ln K of every reaction at (T, P).
    pub fn ln_equilibrium_constants(&self, t: f64, p: f64) -> KineticResult<DVector<f64>> {
        let g0 = self.system.standard_gibbs_energies(t, p)?;
        let rt = GAS_CONSTANT * t;
        Ok(DVector::from_iterator(
            self.reactions.len(),
            self.reactions.iter().map(|r| r.ln_equilibrium_constant(&g0, rt)),
        ))
    }

    /// Reaction rates [mol/s] at (T, P, n).
    pub fn rates(&self, t: f64, p: f64, n: &DVector<f64>) -> KineticResult<DVector<f64>> {
        let activities = self.system.activities(t, p, n)?.val;
        let ln_k = self.ln_equilibrium_constants(t, p)?;
        let mut rates = DVector::zeros(self.reactions.len());
        for (r, reaction) in self.reactions.iter().enumerate() {
            let ctx = RateContext {
                temperature: t,
                pressure: p,
                amounts: n,
                activities: &activities,
                stoichiometry: reaction.stoichiometry(),
                ln_k: ln_k[r],
            };
            let rate = reaction.rate(&ctx);
            if !rate.is_finite() {
                return Err(KineticError::NonPhysical {
                    what: format!("rate of reaction '{}' is {rate}", reaction.name()),
                });
            }
            rates[r] = rate;
        }
        Ok(rates)
    }

    /// Species production rates `S^T r` [mol/s].
    pub fn species_rates(&self, t: f64, p: f64, n: &DVector<f64>) -> KineticResult<DVector<f64>> {
        let rates = self.rates(t, p, n)?;
        Ok(self.stoichiometry.tr_mul(&rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::MassActionRate;
    use kf_chem::{PhaseKind, Species};

    fn system() -> Arc<ChemicalSystem> {
        let mut builder = ChemicalSystem::builder();
        builder.add_phase(
            "Aqueous",
            PhaseKind::Aqueous,
            vec![
                Species::new("H2O(l)").unwrap(),
                Species::new("Na+").unwrap().with_standard_gibbs_energy(-261_881.0),
                Species::new("Cl-").unwrap().with_standard_gibbs_energy(-131_290.0),
                Species::new("NaCl(aq)").unwrap().with_standard_gibbs_energy(-388_735.0),
            ],
        );
        Arc::new(builder.build().unwrap())
    }

    fn association(system: &ChemicalSystem) -> Reaction {
        Reaction::new(
            system,
            "association",
            &[("Na+", -1.0), ("Cl-", -1.0), ("NaCl(aq)", 1.0)],
            MassActionRate {
                forward: 0.01,
                backward: 0.001,
            },
        )
        .unwrap()
    }

    #[test]
    fn stoichiometric_matrix_layout() {
        let system = system();
        let reactions = ReactionSystem::new(system.clone(), vec![association(&system)]).unwrap();
        assert_eq!(reactions.num_reactions(), 1);
        let s = reactions.stoichiometric_matrix();
        assert_eq!(s.shape(), (1, 4));
        assert_eq!(s.row(0).iter().copied().collect::<Vec<_>>(), vec![0.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn unbalanced_reaction_is_rejected() {
        let system = system();
        let lost_chloride = Reaction::new(
            &system,
            "lost chloride",
            &[("Na+", -1.0), ("NaCl(aq)", 1.0)],
            MassActionRate {
                forward: 1.0,
                backward: 0.0,
            },
        )
        .unwrap();
        let err = ReactionSystem::new(system, vec![lost_chloride]).unwrap_err();
        assert!(matches!(err, KineticError::Reaction { .. }));
        assert!(err.to_string().contains("lost chloride"));
    }

    #[test]
    fn species_rates_follow_stoichiometry() {
        let system = system();
        let reactions = ReactionSystem::new(system.clone(), vec![association(&system)]).unwrap();
        let n = DVector::from_vec(vec![1.0, 0.001, 0.001, 0.0]);
        let r = reactions.rates(298.15, 1e5, &n).unwrap();
        assert!(r[0] > 0.0);
        let dn = reactions.species_rates(298.15, 1e5, &n).unwrap();
        assert_eq!(dn[0], 0.0);
        assert_eq!(dn[1], -r[0]);
        assert_eq!(dn[2], -r[0]);
        assert_eq!(dn[3], r[0]);
    }

    #[test]
    fn equilibrium_constant_uses_standard_energies() {
        let system = system();
        let reactions = ReactionSystem::new(system.clone(), vec![association(&system)]).unwrap();
        let t = 298.15;
        let ln_k = reactions.ln_equilibrium_constants(t, 1e5).unwrap();
        let expected = -(-388_735.0 + 261_881.0 + 131_290.0) / (GAS_CONSTANT * t);
        assert!((ln_k[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn non_finite_rate_is_non_physical() {
        let system = system();
        let broken = Reaction::new(
            &system,
            "broken",
            &[("Na+", -1.0), ("Cl-", -1.0), ("NaCl(aq)", 1.0)],
            |_: &RateContext<'_>| f64::NAN,
        )
        .unwrap();
        let reactions = ReactionSystem::new(system, vec![broken]).unwrap();
        let n = DVector::from_vec(vec![1.0, 0.001, 0.001, 0.0]);
        let err = reactions.rates(298.15, 1e5, &n).unwrap_err();
        assert!(err.is_retryable());
    }
}
