//! Gibbs energy minimisation over the equilibrium species of a partition.
//!
//! The unknowns are `x_i = ln n_i` for the active equilibrium species and
//! the dimensionless element potentials `y_j / RT` for an independent set of
//! element balance rows. The optimality conditions
//!
//! ```text
//! mu_i(n) / RT - sum_j A_ji y_j = 0      (each active species i)
//! sum_i A_ji n_i - b_j           = 0      (each independent element j)
//! ```
//!
//! are solved with the damped Newton method in [`crate::newton`]. Mass
//! balance rows are scaled by the element amount they carry, which leaves
//! the Newton direction unchanged and makes the convergence test relative.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace, warn};

use crate::error::{EquilibriumError, EquilibriumResult};
use crate::newton::newton_solve;
use crate::options::EquilibriumOptions;
use kf_chem::{CHARGE_SYMBOL, ChemicalState, ChemicalSystem, Partition};
use kf_core::constants::GAS_CONSTANT;

/// Budgets smaller than this (relative to the largest element amount) are zero.
const ZERO_BUDGET_TOL: f64 = 1e-12;
/// Rows whose component outside the span of earlier rows is smaller than this
/// (relative to their norm) are linearly dependent.
const RANK_TOL: f64 = 1e-10;
/// Allowed relative violation of dependent balance rows after convergence.
const CONSISTENCY_TOL: f64 = 1e-8;

/// Result of an equilibrium calculation.
#[derive(Debug, Clone)]
pub struct EquilibriumSolution {
    /// Species amounts [mol]; non-equilibrium species keep their input amounts
    pub n: DVector<f64>,
    /// Element potentials [J/mol]
    pub y: DVector<f64>,
    /// Species potentials `mu - A^T y` [J/mol], zero outside the equilibrium set
    pub z: DVector<f64>,
    pub iterations: usize,
    /// Final scaled residual norm
    pub residual: f64,
}

/// Equilibrium solver bound to one chemical system.
#[derive(Debug, Clone)]
pub struct EquilibriumSolver {
    system: Arc<ChemicalSystem>,
    partition: Partition,
    options: EquilibriumOptions,
}

impl EquilibriumSolver {
    /// Solver treating every species as an equilibrium species.
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        let partition = Partition::all_equilibrium(&system);
        Self {
            system,
            partition,
            options: EquilibriumOptions::default(),
        }
    }

    pub fn set_options(&mut self, options: EquilibriumOptions) -> EquilibriumResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn set_partition(&mut self, partition: Partition) -> EquilibriumResult<()> {
        partition.validate_for(&self.system)?;
        self.partition = partition;
        Ok(())
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }

    /// Re-solve the equilibrium species so they hold exactly the element
    /// amounts `b` [mol], keeping every other amount of `n`.
    ///
    /// Pure: nothing is modified, so a failure has no side effects.
    pub fn solve(
        &self,
        t: f64,
        p: f64,
        n: &DVector<f64>,
        b: &DVector<f64>,
    ) -> EquilibriumResult<EquilibriumSolution> {
        let system = &*self.system;
        let num_species = system.num_species();
        let num_elements = system.num_elements();
        if n.len() != num_species || b.len() != num_elements {
            return Err(EquilibriumError::ProblemSetup {
                what: format!(
                    "expected {num_species} amounts and {num_elements} element amounts, got {} and {}",
                    n.len(),
                    b.len()
                ),
            });
        }

        let a = system.formula_matrix();
        let equilibrium = self.partition.equilibrium();
        let charge = system.index_element(CHARGE_SYMBOL);

        let scale = b
            .amax()
            .max((a.abs() * n.abs()).amax())
            .max(f64::MIN_POSITIVE);
        let zero_tol = ZERO_BUDGET_TOL * scale;

        // Species holding an element with an empty budget cannot be present.
        let mut empty = Vec::new();
        for j in (0..num_elements).filter(|&j| Some(j) != charge) {
            if b[j] < -zero_tol {
                warn!(element = system.elements()[j].symbol(), amount = b[j], "negative element budget");
                return Err(EquilibriumError::ConvergenceFailed {
                    what: format!(
                        "negative amount {:e} mol of element '{}' for the equilibrium species",
                        b[j],
                        system.elements()[j].symbol()
                    ),
                });
            }
            if b[j].abs() <= zero_tol {
                empty.push(j);
            }
        }
        let active: Vec<usize> = equilibrium
            .iter()
            .copied()
            .filter(|&i| empty.iter().all(|&j| a[(j, i)] == 0.0))
            .collect();

        let touching: Vec<usize> = (0..num_elements)
            .filter(|&j| active.iter().any(|&i| a[(j, i)] != 0.0))
            .collect();
        for j in (0..num_elements).filter(|j| !touching.contains(j)) {
            if b[j].abs() > zero_tol {
                return Err(EquilibriumError::ConvergenceFailed {
                    what: format!(
                        "no equilibrium species can hold {:e} mol of element '{}'",
                        b[j],
                        system.elements()[j].symbol()
                    ),
                });
            }
        }

        let mut base = n.clone();
        for &i in equilibrium {
            base[i] = 0.0;
        }
        if active.is_empty() {
            return Ok(EquilibriumSolution {
                n: base,
                y: DVector::zeros(num_elements),
                z: DVector::zeros(num_species),
                iterations: 0,
                residual: 0.0,
            });
        }

        let rows = independent_rows(a, &touching, &active);
        let ns = active.len();
        let nr = rows.len();
        trace!(species = ns, balances = nr, dropped = equilibrium.len() - ns, "equilibrium layout");

        let ar = DMatrix::from_fn(nr, ns, |r, k| a[(rows[r], active[k])]);
        let br = DVector::from_fn(nr, |r, _| b[rows[r]]);
        let rt = GAS_CONSTANT * t;

        let amounts_of = |x: &DVector<f64>| -> DVector<f64> {
            let mut full = base.clone();
            for (k, &i) in active.iter().enumerate() {
                full[i] = x[k].exp();
            }
            full
        };
        let row_scales = |full: &DVector<f64>| -> DVector<f64> {
            DVector::from_fn(nr, |r, _| {
                let held: f64 = active
                    .iter()
                    .enumerate()
                    .map(|(k, &i)| ar[(r, k)].abs() * full[i])
                    .sum();
                br[r].abs().max(held).max(f64::MIN_POSITIVE)
            })
        };

        let residual = |v: &DVector<f64>| -> EquilibriumResult<DVector<f64>> {
            let full = amounts_of(v);
            let mu = system.chemical_potentials(t, p, &full)?;
            let y = v.rows(ns, nr);
            let scales = row_scales(&full);
            let mut f = DVector::zeros(ns + nr);
            for (k, &i) in active.iter().enumerate() {
                f[k] = mu.val[i] / rt - ar.column(k).dot(&y);
            }
            for r in 0..nr {
                let held: f64 = active
                    .iter()
                    .enumerate()
                    .map(|(k, &i)| ar[(r, k)] * full[i])
                    .sum();
                f[ns + r] = (held - br[r]) / scales[r];
            }
            Ok(f)
        };

        let jacobian = |v: &DVector<f64>| -> EquilibriumResult<DMatrix<f64>> {
            let full = amounts_of(v);
            let mu = system.chemical_potentials(t, p, &full)?;
            let scales = row_scales(&full);
            let mut jac = DMatrix::zeros(ns + nr, ns + nr);
            for (k, &i) in active.iter().enumerate() {
                for (l, &m) in active.iter().enumerate() {
                    jac[(k, l)] = mu.ddn[(i, m)] / rt * full[m];
                }
                for r in 0..nr {
                    jac[(k, ns + r)] = -ar[(r, k)];
                    jac[(ns + r, k)] = ar[(r, k)] * full[i] / scales[r];
                }
            }
            Ok(jac)
        };

        let v0 = self.initial_guess(t, p, n, &base, &active, &ar, &br)?;
        let config = self.options.newton_config(ns);
        let result = newton_solve(v0, residual, jacobian, &config).map_err(|e| {
            warn!(error = %e, "equilibrium solve failed");
            e
        })?;

        let n_eq = amounts_of(&result.x);

        // Dependent rows hold only if the budget itself was consistent.
        for &j in &touching {
            let held: f64 = active.iter().map(|&i| a[(j, i)] * n_eq[i]).sum();
            if (held - b[j]).abs() > CONSISTENCY_TOL * scale {
                return Err(EquilibriumError::ConvergenceFailed {
                    what: format!(
                        "element budget of '{}' is inconsistent with the other balances ({:e} mol held, {:e} mol requested)",
                        system.elements()[j].symbol(),
                        held,
                        b[j]
                    ),
                });
            }
        }

        let mut y = DVector::zeros(num_elements);
        for (r, &j) in rows.iter().enumerate() {
            y[j] = rt * result.x[ns + r];
        }
        let mu = system.chemical_potentials(t, p, &n_eq)?;
        let mut z = DVector::zeros(num_species);
        for &i in equilibrium {
            let zi = mu.val[i] - a.column(i).dot(&y);
            if zi.is_finite() {
                z[i] = zi;
            }
        }

        debug!(
            iterations = result.iterations,
            residual = result.residual_norm,
            "equilibrium converged"
        );
        Ok(EquilibriumSolution {
            n: n_eq,
            y,
            z,
            iterations: result.iterations,
            residual: result.residual_norm,
        })
    }

    /// Solve at the conditions of `state` and commit amounts and potentials.
    ///
    /// The state is only modified when the solve succeeds.
    pub fn equilibrate(
        &self,
        state: &mut ChemicalState,
        b: &DVector<f64>,
    ) -> EquilibriumResult<EquilibriumSolution> {
        if !self.system.is_compatible(state.system()) {
            return Err(EquilibriumError::ProblemSetup {
                what: "state belongs to a different chemical system".to_string(),
            });
        }
        let solution = self.solve(
            state.temperature().value,
            state.pressure().value,
            state.species_amounts(),
            b,
        )?;
        let mut next = state.clone();
        next.set_species_amounts(&solution.n)?;
        next.set_element_potentials(&solution.y)?;
        next.set_species_potentials(&solution.z)?;
        *state = next;
        Ok(solution)
    }

    /// Equilibrate the element amounts currently held by the equilibrium species.
    pub fn equilibrate_state(&self, state: &mut ChemicalState) -> EquilibriumResult<EquilibriumSolution> {
        let b = state.element_amounts_in_species(self.partition.equilibrium())?;
        self.equilibrate(state, &b)
    }

    /// Log-amounts start from the current amounts when any equilibrium
    /// species is present, otherwise from the minimum-norm solution of the
    /// balances; both are floored. Potentials start from the least-squares
    /// fit of `A^T y = mu/RT`.
    #[allow(clippy::too_many_arguments)]
    fn initial_guess(
        &self,
        t: f64,
        p: f64,
        n: &DVector<f64>,
        base: &DVector<f64>,
        active: &[usize],
        ar: &DMatrix<f64>,
        br: &DVector<f64>,
    ) -> EquilibriumResult<DVector<f64>> {
        let ns = active.len();
        let nr = br.len();
        let floor = self.options.initial_amount_fraction * br.amax().max(f64::MIN_POSITIVE);
        let gram = ar * ar.transpose();

        let warm: f64 = active.iter().map(|&i| n[i]).sum();
        let guess: Vec<f64> = if warm > 0.0 {
            active.iter().map(|&i| n[i].max(floor)).collect()
        } else {
            let least_norm = gram
                .clone()
                .lu()
                .solve(br)
                .map(|w| ar.transpose() * w)
                .unwrap_or_else(|| DVector::zeros(ns));
            least_norm.iter().map(|&v| v.max(floor)).collect()
        };

        let mut full = base.clone();
        for (k, &i) in active.iter().enumerate() {
            full[i] = guess[k];
        }
        let mu = self.system.chemical_potentials(t, p, &full)?;
        let rt = GAS_CONSTANT * t;
        let mu_rt = DVector::from_fn(ns, |k, _| mu.val[active[k]] / rt);
        let y0 = if mu_rt.iter().all(|v| v.is_finite()) {
            gram.lu().solve(&(ar * mu_rt)).unwrap_or_else(|| DVector::zeros(nr))
        } else {
            DVector::zeros(nr)
        };

        let mut v0 = DVector::zeros(ns + nr);
        for k in 0..ns {
            v0[k] = guess[k].ln();
        }
        v0.rows_mut(ns, nr).copy_from(&y0);
        Ok(v0)
    }
}

/// Rows of `a` (restricted to `columns`) that are linearly independent of
/// the rows before them, by modified Gram-Schmidt.
fn independent_rows(a: &DMatrix<f64>, rows: &[usize], columns: &[usize]) -> Vec<usize> {
    let mut basis: Vec<DVector<f64>> = Vec::new();
    let mut kept = Vec::new();
    for &j in rows {
        let mut v = DVector::from_iterator(columns.len(), columns.iter().map(|&i| a[(j, i)]));
        let norm0 = v.norm();
        if norm0 == 0.0 {
            continue;
        }
        for q in &basis {
            let proj = q.dot(&v);
            v.axpy(-proj, q, 1.0);
        }
        let norm = v.norm();
        if norm > RANK_TOL * norm0 {
            basis.push(v / norm);
            kept.push(j);
        }
    }
    kept
}
