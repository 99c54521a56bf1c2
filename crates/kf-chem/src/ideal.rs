//! Ideal-solution property model.

use nalgebra::DVector;

use crate::error::{ChemError, ChemResult};
use crate::model::{ChemicalVector, ThermoModel};
use crate::phase::PhaseKind;
use crate::system::ChemicalSystem;
use kf_core::constants::{GAS_CONSTANT, STANDARD_PRESSURE, WATER_MOLAR_MASS};

/// Name of the aqueous solvent species.
pub const WATER: &str = "H2O(l)";

/// Ideal activity model with temperature-independent standard Gibbs energies.
///
/// - aqueous: `ln a(H2O) = ln x(H2O)`, solutes `ln a = ln m` (molality)
/// - gaseous: `ln a = ln x + ln(P/P°)`
/// - liquid: `ln a = ln x`
/// - mineral: `ln a = 0` when pure, `ln x` otherwise
///
/// Species with zero amount get `ln a = -inf` (activity 0); their derivative
/// entries are evaluated at a tiny positive floor to stay finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdealModel;

const DERIVATIVE_FLOOR: f64 = 1e-300;

fn ln_amount(n: f64) -> f64 {
    if n > 0.0 { n.ln() } else { f64::NEG_INFINITY }
}

impl ThermoModel for IdealModel {
    fn name(&self) -> &str {
        "ideal"
    }

    fn standard_gibbs_energies(
        &self,
        system: &ChemicalSystem,
        t: f64,
        _p: f64,
    ) -> ChemResult<DVector<f64>> {
        if !(t.is_finite() && t > 0.0) {
            return Err(ChemError::Model {
                message: format!("temperature must be positive and finite, got {t}"),
            });
        }
        Ok(DVector::from_iterator(
            system.num_species(),
            system.species().iter().map(|s| s.standard_gibbs_energy()),
        ))
    }

    fn ln_activities(
        &self,
        system: &ChemicalSystem,
        _t: f64,
        p: f64,
        n: &DVector<f64>,
    ) -> ChemResult<ChemicalVector> {
        if !(p.is_finite() && p > 0.0) {
            return Err(ChemError::Model {
                message: format!("pressure must be positive and finite, got {p}"),
            });
        }

        let mut out = ChemicalVector::zeros(system.num_species());

        for phase in system.phases() {
            let range = phase.species_range();
            let total: f64 = range.clone().map(|i| n[i].max(0.0)).sum();
            let total_floor = total.max(DERIVATIVE_FLOOR);

            let mole_fraction = |out: &mut ChemicalVector, i: usize| {
                out.val[i] = if total > 0.0 {
                    ln_amount(n[i]) - total.ln()
                } else {
                    f64::NEG_INFINITY
                };
                out.ddn[(i, i)] += 1.0 / n[i].max(DERIVATIVE_FLOOR);
                for j in range.clone() {
                    out.ddn[(i, j)] -= 1.0 / total_floor;
                }
            };

            match phase.kind() {
                PhaseKind::Aqueous => {
                    let water = range
                        .clone()
                        .find(|&i| system.species()[i].name() == WATER);
                    match water {
                        Some(iw) => {
                            let ln_kg_water = ln_amount(n[iw]) + WATER_MOLAR_MASS.ln();
                            for i in range.clone() {
                                if i == iw {
                                    mole_fraction(&mut out, i);
                                } else {
                                    out.val[i] = ln_amount(n[i]) - ln_kg_water;
                                    out.ddn[(i, i)] = 1.0 / n[i].max(DERIVATIVE_FLOOR);
                                    out.ddn[(i, iw)] = -1.0 / n[iw].max(DERIVATIVE_FLOOR);
                                }
                            }
                        }
                        // Without a solvent the phase degrades to an ideal mixture.
                        None => range.clone().for_each(|i| mole_fraction(&mut out, i)),
                    }
                }
                PhaseKind::Gaseous => {
                    let ln_p = (p / STANDARD_PRESSURE).ln();
                    for i in range.clone() {
                        mole_fraction(&mut out, i);
                        out.val[i] += ln_p;
                    }
                }
                PhaseKind::Liquid => range.clone().for_each(|i| mole_fraction(&mut out, i)),
                PhaseKind::Mineral => {
                    if phase.num_species() > 1 {
                        range.clone().for_each(|i| mole_fraction(&mut out, i));
                    }
                }
            }
        }

        Ok(out)
    }

    fn phase_volumes(
        &self,
        system: &ChemicalSystem,
        t: f64,
        p: f64,
        n: &DVector<f64>,
    ) -> ChemResult<DVector<f64>> {
        let volumes = system.phases().iter().map(|phase| {
            let range = phase.species_range();
            match phase.kind() {
                PhaseKind::Gaseous => {
                    let total: f64 = range.map(|i| n[i]).sum();
                    total * GAS_CONSTANT * t / p
                }
                _ => range
                    .map(|i| n[i] * system.species()[i].molar_volume())
                    .sum(),
            }
        });
        Ok(DVector::from_iterator(system.num_phases(), volumes))
    }
}
