//! Partitioned kinetic-equilibrium stepping engine.
//!
//! Each step advances the kinetic species with an ODE integrator while every
//! other amount is held fixed, then re-solves the equilibrium species for the
//! element amounts left over, and commits the result to the state in one
//! replacement. Species in no partition set are treated as inert.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::error::{KineticError, KineticResult};
use crate::integrator::{BackwardEuler, ForwardEuler, Integrator, RK4};
use crate::model::KineticModel;
use crate::network::ReactionSystem;
use crate::options::{IntegratorType, KineticOptions};
use kf_chem::{ChemicalState, Partition};
use kf_core::{Indices, Tolerances, nearly_equal, unify};
use kf_equilibrium::EquilibriumSolver;

/// Safety factor applied to the step size predicted from the error estimate.
const SAFETY: f64 = 0.9;

/// `solve` stops once the clock is this close to the end time.
const END_TOLERANCE: Tolerances = Tolerances {
    abs: 1e-12,
    rel: 1e-12,
};

/// Step counters since the last `initialize`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KineticStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    /// Size of the last accepted step [s]
    pub last_step: f64,
}

/// Index sets and restricted formula matrices built by `initialize`.
#[derive(Debug, Clone)]
struct Decomposition {
    kinetic: Indices,
    equilibrium: Indices,
    inert: Indices,
    /// Formula-matrix columns of the kinetic species
    kinetic_formula: DMatrix<f64>,
    /// Formula-matrix columns of the inert species
    inert_formula: DMatrix<f64>,
}

/// Amounts and potentials produced by one step attempt, not yet committed.
#[derive(Debug)]
struct StepOutcome {
    n: DVector<f64>,
    potentials: Option<(DVector<f64>, DVector<f64>)>,
}

/// Kinetic species rates with every other amount frozen.
struct KineticRhs<'a> {
    reactions: &'a ReactionSystem,
    kinetic: &'a [usize],
    temperature: f64,
    pressure: f64,
    n: DVector<f64>,
}

impl KineticModel for KineticRhs<'_> {
    fn rhs(&mut self, _t: f64, y: &DVector<f64>) -> KineticResult<DVector<f64>> {
        // Trial points may dip below zero; rates are evaluated at the clamped amounts.
        for (k, &i) in self.kinetic.iter().enumerate() {
            self.n[i] = y[k].max(0.0);
        }
        let rates = self
            .reactions
            .species_rates(self.temperature, self.pressure, &self.n)?;
        Ok(DVector::from_iterator(
            self.kinetic.len(),
            self.kinetic.iter().map(|&i| rates[i]),
        ))
    }
}

/// Drives one chemical state through time.
#[derive(Debug)]
pub struct KineticSolver {
    reactions: ReactionSystem,
    partition: Partition,
    options: KineticOptions,
    equilibrium: EquilibriumSolver,
    decomposition: Option<Decomposition>,
    stats: KineticStats,
    time: f64,
    suggested_step: f64,
}

impl KineticSolver {
    /// All species kinetic, default options.
    pub fn new(reactions: ReactionSystem) -> Self {
        let system = reactions.system().clone();
        let partition = Partition::all_kinetic(&system);
        let options = KineticOptions::default();
        let suggested_step = options.initial_step;
        Self {
            reactions,
            partition,
            options,
            equilibrium: EquilibriumSolver::new(system),
            decomposition: None,
            stats: KineticStats::default(),
            time: 0.0,
            suggested_step,
        }
    }

    pub fn set_options(&mut self, options: KineticOptions) -> KineticResult<()> {
        options.validate()?;
        self.equilibrium.set_options(options.equilibrium.clone())?;
        self.suggested_step = options.initial_step;
        self.options = options;
        Ok(())
    }

    /// Replace the partition. The solver must be initialized again before stepping.
    pub fn set_partition(&mut self, partition: Partition) -> KineticResult<()> {
        partition.validate_for(self.reactions.system())?;
        self.partition = partition;
        self.decomposition = None;
        Ok(())
    }

    /// Replace the partition from a descriptor such as `"equilibrium = H2O(l)"`.
    pub fn set_partition_str(&mut self, descriptor: &str) -> KineticResult<()> {
        let partition = Partition::parse(self.reactions.system(), descriptor)?;
        self.set_partition(partition)
    }

    pub fn reactions(&self) -> &ReactionSystem {
        &self.reactions
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn options(&self) -> &KineticOptions {
        &self.options
    }

    pub fn stats(&self) -> KineticStats {
        self.stats
    }

    /// Time of the last committed step (or of `initialize`).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_initialized(&self) -> bool {
        self.decomposition.is_some()
    }

    /// Equilibrate the equilibrium species of `state` and cache the partition
    /// decomposition used by the stepping loop.
    pub fn initialize(&mut self, state: &mut ChemicalState, t0: f64) -> KineticResult<()> {
        self.decomposition = None;
        if !t0.is_finite() {
            return Err(KineticError::invalid("initial time must be finite"));
        }
        let system = self.reactions.system().clone();
        if !system.is_compatible(state.system()) {
            return Err(KineticError::invalid(
                "state belongs to a different chemical system",
            ));
        }
        self.partition.validate_for(&system)?;

        let kinetic = self.partition.kinetic().to_vec();
        let equilibrium = self.partition.equilibrium().to_vec();
        let inert = unify(
            self.partition.inert(),
            &self.partition.unassigned(system.num_species()),
        );
        self.equilibrium.set_partition(Partition::new(
            equilibrium.iter().copied(),
            kinetic.iter().copied(),
            inert.iter().copied(),
        )?)?;

        if !equilibrium.is_empty() {
            let solution = self.equilibrium.equilibrate_state(state)?;
            debug!(
                iterations = solution.iterations,
                residual = solution.residual,
                "initial equilibrium established"
            );
        }

        let formula = system.formula_matrix();
        self.decomposition = Some(Decomposition {
            kinetic_formula: formula.select_columns(kinetic.iter()),
            inert_formula: formula.select_columns(inert.iter()),
            kinetic,
            equilibrium,
            inert,
        });
        self.stats = KineticStats::default();
        self.time = t0;
        self.suggested_step = self.options.initial_step;
        debug!(
            t0,
            kinetic = self.partition.kinetic().len(),
            equilibrium = self.partition.equilibrium().len(),
            "kinetic solver initialized"
        );
        Ok(())
    }

    /// Advance by one adaptively chosen step; `t` receives the new time.
    ///
    /// The step size is controlled by step doubling against `abstol`/`reltol`.
    pub fn step(&mut self, state: &mut ChemicalState, t: &mut f64) -> KineticResult<()> {
        self.decomposition()?;
        let min_step = self.options.min_step;
        let max_step = self.options.max_step;
        let exponent = -1.0 / f64::from(self.options.integrator.order() + 1);

        let mut h = self.suggested_step.clamp(min_step, max_step);
        let mut retries = 0;
        loop {
            let next = match self.doubled_attempt(state, *t, h) {
                Ok((outcome, error)) if error <= 1.0 => {
                    commit(state, outcome)?;
                    self.accept(t, h);
                    let factor = (SAFETY * error.powf(exponent))
                        .clamp(self.options.cutback_factor, self.options.grow_factor);
                    self.suggested_step = (h * factor).clamp(min_step, max_step);
                    debug!(t = *t, dt = h, error, next_dt = self.suggested_step, "accepted adaptive step");
                    return Ok(());
                }
                Ok((_, error)) => {
                    let factor = if error.is_finite() {
                        (SAFETY * error.powf(exponent)).min(self.options.cutback_factor)
                    } else {
                        self.options.cutback_factor
                    };
                    debug!(t = *t, dt = h, error, "step error too large");
                    h * factor
                }
                Err(err) if err.is_retryable() => {
                    warn!(t = *t, dt = h, error = %err, "adaptive step failed, cutting back");
                    h * self.options.cutback_factor
                }
                Err(err) => return Err(err),
            };
            self.stats.rejected_steps += 1;
            retries += 1;
            if retries > self.options.max_retries || next < min_step {
                return Err(KineticError::ConvergenceFailed {
                    what: format!("no acceptable step at t = {} after {retries} attempts (last dt = {h:e})", *t),
                });
            }
            h = next;
        }
    }

    /// Advance by `dt`, or by a cut-back fraction of it when the step fails;
    /// `t` receives the time actually reached. `dt = 0` is a no-op.
    pub fn step_with(&mut self, state: &mut ChemicalState, t: &mut f64, dt: f64) -> KineticResult<()> {
        self.decomposition()?;
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(KineticError::invalid(format!(
                "step size must be finite and non-negative, got {dt}"
            )));
        }
        if dt == 0.0 {
            return Ok(());
        }

        let mut h = dt;
        let mut retries = 0;
        loop {
            match self.attempt(state, *t, h) {
                Ok(outcome) => {
                    commit(state, outcome)?;
                    self.accept(t, h);
                    debug!(t = *t, dt = h, "accepted step");
                    return Ok(());
                }
                Err(err) if err.is_retryable() => {
                    self.stats.rejected_steps += 1;
                    let next = h * self.options.cutback_factor;
                    if retries >= self.options.max_retries || next < self.options.min_step {
                        return Err(KineticError::ConvergenceFailed {
                            what: format!(
                                "step at t = {} failed after {retries} cutbacks (dt = {h:e}): {err}",
                                *t
                            ),
                        });
                    }
                    warn!(t = *t, dt = h, error = %err, "step failed, cutting back");
                    h = next;
                    retries += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Integrate from `t0` to exactly `t1` in steps of at most `dt`; returns `t1`.
    ///
    /// Steps already taken stay committed when a later one fails.
    pub fn solve(&mut self, state: &mut ChemicalState, t0: f64, t1: f64, dt: f64) -> KineticResult<f64> {
        self.decomposition()?;
        if !(t0.is_finite() && t1.is_finite()) || t1 < t0 {
            return Err(KineticError::invalid(format!(
                "time interval [{t0}, {t1}] is invalid"
            )));
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(KineticError::invalid(format!("step size must be positive, got {dt}")));
        }

        let mut t = t0;
        self.time = t0;
        let mut steps = 0;
        while t < t1 && !nearly_equal(t, t1, END_TOLERANCE) {
            if steps == self.options.max_steps {
                return Err(KineticError::ConvergenceFailed {
                    what: format!("reached max_steps = {steps} at t = {t} before t1 = {t1}"),
                });
            }
            let h = dt.min(t1 - t);
            self.step_with(state, &mut t, h)?;
            steps += 1;
        }
        self.time = t1;
        debug!(t0, t1, steps, "kinetic solve finished");
        Ok(t1)
    }

    fn decomposition(&self) -> KineticResult<&Decomposition> {
        self.decomposition.as_ref().ok_or(KineticError::NotInitialized)
    }

    fn accept(&mut self, t: &mut f64, h: f64) {
        *t += h;
        self.time = *t;
        self.stats.accepted_steps += 1;
        self.stats.last_step = h;
    }

    /// One full step of `h` and two half steps; returns the half-step result
    /// with its scaled error against the full step.
    fn doubled_attempt(
        &self,
        state: &ChemicalState,
        t: f64,
        h: f64,
    ) -> KineticResult<(StepOutcome, f64)> {
        let full = self.attempt(state, t, h)?;
        let half = self.attempt(state, t, 0.5 * h)?;
        let mut midpoint = state.clone();
        commit(&mut midpoint, half)?;
        let second = self.attempt(&midpoint, t + 0.5 * h, 0.5 * h)?;

        let decomposition = self.decomposition()?;
        let error = decomposition
            .kinetic
            .iter()
            .map(|&i| {
                let (coarse, fine) = (full.n[i], second.n[i]);
                (coarse - fine).abs() / (self.options.abstol + self.options.reltol * fine.abs())
            })
            .fold(0.0, f64::max);
        Ok((second, error))
    }

    /// Advance the kinetic species of `state` by `dt` and re-solve the
    /// equilibrium species, without touching `state`.
    fn attempt(&self, state: &ChemicalState, t: f64, dt: f64) -> KineticResult<StepOutcome> {
        let decomposition = self.decomposition()?;
        let temperature = state.temperature().value;
        let pressure = state.pressure().value;
        let n0 = state.species_amounts();
        let kinetic = &decomposition.kinetic;

        let y0 = DVector::from_iterator(kinetic.len(), kinetic.iter().map(|&i| n0[i]));
        let mut y = if kinetic.is_empty() {
            y0
        } else {
            let mut model = KineticRhs {
                reactions: &self.reactions,
                kinetic,
                temperature,
                pressure,
                n: n0.clone(),
            };
            match self.options.integrator {
                IntegratorType::BackwardEuler => {
                    let integrator = BackwardEuler {
                        newton: self.options.newton.clone(),
                    };
                    integrator.step(&mut model, t, &y0, dt)?
                }
                IntegratorType::RK4 => RK4.step(&mut model, t, &y0, dt)?,
                IntegratorType::ForwardEuler => ForwardEuler.step(&mut model, t, &y0, dt)?,
            }
        };

        // Clamped residue is only reabsorbed when equilibrium species carry the balance.
        let floor = if decomposition.equilibrium.is_empty() {
            0.0
        } else {
            -self.options.negative_tolerance
        };
        for (k, &i) in kinetic.iter().enumerate() {
            let amount = y[k];
            if !amount.is_finite() || amount < floor {
                return Err(KineticError::NonPhysical {
                    what: format!(
                        "species '{}' would reach {amount:e} mol",
                        self.reactions.system().species()[i].name()
                    ),
                });
            }
            y[k] = amount.max(0.0);
        }

        let mut n = n0.clone();
        for (k, &i) in kinetic.iter().enumerate() {
            n[i] = y[k];
        }
        if decomposition.equilibrium.is_empty() {
            return Ok(StepOutcome { n, potentials: None });
        }

        let inert = DVector::from_iterator(
            decomposition.inert.len(),
            decomposition.inert.iter().map(|&i| n0[i]),
        );
        let b = state.element_amounts()
            - &decomposition.kinetic_formula * &y
            - &decomposition.inert_formula * inert;
        let solution = self.equilibrium.solve(temperature, pressure, &n, &b)?;
        Ok(StepOutcome {
            n: solution.n,
            potentials: Some((solution.y, solution.z)),
        })
    }
}

/// Replace the amounts (and potentials) of `state` in one assignment.
fn commit(state: &mut ChemicalState, outcome: StepOutcome) -> KineticResult<()> {
    let mut next = state.clone();
    next.set_species_amounts(&outcome.n)?;
    if let Some((y, z)) = outcome.potentials {
        next.set_element_potentials(&y)?;
        next.set_species_potentials(&z)?;
    }
    *state = next;
    Ok(())
}


#[cfg(test)]
mod proptests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::reaction::{MassActionRate, Reaction};
    use kf_chem::{ChemicalSystem, PhaseKind, Species};

    fn system() -> Arc<ChemicalSystem> {
        let mut builder = ChemicalSystem::builder();
        builder.add_phase(
            "Aqueous",
            PhaseKind::Aqueous,
            ["H2O(l)", "Na+", "Cl-", "NaCl(aq)"]
                .into_iter()
                .map(|s| Species::new(s).unwrap())
                .collect(),
        );
        Arc::new(builder.build().unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn step_conserves_sodium_and_chlorine(
            na in 1e-4f64..1e-2,
            cl in 1e-4f64..1e-2,
            pair in 0.0f64..1e-2,
            dt in 0.1f64..5.0,
        ) {
            let system = system();
            let reaction = Reaction::new(
                &system,
                "association",
                &[("Na+", -1.0), ("Cl-", -1.0), ("NaCl(aq)", 1.0)],
                MassActionRate { forward: 0.01, backward: 0.001 },
            )
            .unwrap();
            let mut solver =
                KineticSolver::new(ReactionSystem::new(system.clone(), vec![reaction]).unwrap());
            solver.set_partition_str("equilibrium = H2O(l)").unwrap();

            let mut state = ChemicalState::new(system.clone());
            state
                .set_species_amounts(&DVector::from_vec(vec![1.0, na, cl, pair]))
                .unwrap();
            solver.initialize(&mut state, 0.0).unwrap();

            let mut t = 0.0;
            solver.step_with(&mut state, &mut t, dt).unwrap();
            prop_assert!(t > 0.0 && t <= dt);

            let n = state.species_amounts();
            prop_assert!(n.iter().all(|&v| v >= 0.0));
            prop_assert!((n[1] + n[3] - (na + pair)).abs() < 1e-14);
            prop_assert!((n[2] + n[3] - (cl + pair)).abs() < 1e-14);
        }
    }
}
