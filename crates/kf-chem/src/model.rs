//! Thermodynamic property model trait.

use nalgebra::{DMatrix, DVector};

use crate::error::ChemResult;
use crate::system::ChemicalSystem;
use kf_core::constants::GAS_CONSTANT;

/// Per-species values with their derivatives with respect to species amounts.
///
/// `ddn[(i, j)]` is ∂valᵢ/∂nⱼ.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalVector {
    pub val: DVector<f64>,
    pub ddn: DMatrix<f64>,
}

impl ChemicalVector {
    pub fn zeros(num_species: usize) -> Self {
        Self {
            val: DVector::zeros(num_species),
            ddn: DMatrix::zeros(num_species, num_species),
        }
    }
}

/// Trait for thermodynamic property models.
///
/// Implementations must be thread-safe (Send + Sync). All quantities are in
/// SI units: T in K, P in Pa, amounts in mol, energies in J/mol, volumes in m³.
/// The system is passed in so a model can consult species, phases and molar masses.
pub trait ThermoModel: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Standard molar Gibbs energies of all species [J/mol].
    fn standard_gibbs_energies(&self, system: &ChemicalSystem, t: f64, p: f64)
    -> ChemResult<DVector<f64>>;

    /// Natural logarithms of species activities.
    fn ln_activities(
        &self,
        system: &ChemicalSystem,
        t: f64,
        p: f64,
        n: &DVector<f64>,
    ) -> ChemResult<ChemicalVector>;

    /// Volume of every phase [m³].
    fn phase_volumes(
        &self,
        system: &ChemicalSystem,
        t: f64,
        p: f64,
        n: &DVector<f64>,
    ) -> ChemResult<DVector<f64>>;

    /// Species activities (dimensionless).
    fn activities(
        &self,
        system: &ChemicalSystem,
        t: f64,
        p: f64,
        n: &DVector<f64>,
    ) -> ChemResult<ChemicalVector> {
        let ln_a = self.ln_activities(system, t, p, n)?;
        let val = ln_a.val.map(f64::exp);
        let mut ddn = ln_a.ddn;
        for (i, mut row) in ddn.row_iter_mut().enumerate() {
            row *= val[i];
        }
        Ok(ChemicalVector { val, ddn })
    }

    /// Chemical potentials μ = G° + RT ln a [J/mol].
    fn chemical_potentials(
        &self,
        system: &ChemicalSystem,
        t: f64,
        p: f64,
        n: &DVector<f64>,
    ) -> ChemResult<ChemicalVector> {
        let g0 = self.standard_gibbs_energies(system, t, p)?;
        let ln_a = self.ln_activities(system, t, p, n)?;
        let rt = GAS_CONSTANT * t;
        Ok(ChemicalVector {
            val: g0 + ln_a.val * rt,
            ddn: ln_a.ddn * rt,
        })
    }
}
