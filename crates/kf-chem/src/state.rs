//! Chemical state: temperature, pressure, species amounts and the Lagrange
//! multipliers of the last equilibrium calculation.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{ChemError, ChemResult};
use crate::system::{ChemicalSystem, Key};
use kf_core::constants::{DEFAULT_PRESSURE, DEFAULT_TEMPERATURE};
use kf_core::convert::{self, Dimension};
use kf_core::units::{Amount, Mass, Pressure, Temperature, Volume, k, kg, kg_per_mol, mol, pa};
use kf_core::{ensure_non_negative, ensure_positive};

/// Thermodynamic state of a chemical system.
///
/// Invariants after every successful mutation: T > 0, P > 0 and every
/// species amount is finite and `>= 0`. Mutators validate first and leave
/// the state untouched on error. Cloning yields a fully independent state;
/// only the immutable system is shared.
#[derive(Debug, Clone)]
pub struct ChemicalState {
    system: Arc<ChemicalSystem>,
    temperature: Temperature,
    pressure: Pressure,
    /// Species amounts [mol]
    n: DVector<f64>,
    /// Element potentials [J/mol]
    y: DVector<f64>,
    /// Species potentials [J/mol]
    z: DVector<f64>,
}

impl ChemicalState {
    /// Create a state at 298.15 K and 1 bar with every amount zero.
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        let num_species = system.num_species();
        let num_elements = system.num_elements();
        Self {
            system,
            temperature: k(DEFAULT_TEMPERATURE),
            pressure: pa(DEFAULT_PRESSURE),
            n: DVector::zeros(num_species),
            y: DVector::zeros(num_elements),
            z: DVector::zeros(num_species),
        }
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    // ---------------------------------------------------------------------
    // Mutators
    // ---------------------------------------------------------------------

    pub fn set_temperature(&mut self, t: Temperature) -> ChemResult<()> {
        ensure_positive(t.value, "temperature")?;
        self.temperature = t;
        Ok(())
    }

    /// Set the temperature from a value in any temperature unit (`"celsius"`, `"K"`, ...).
    pub fn set_temperature_in(&mut self, value: f64, units: &str) -> ChemResult<()> {
        let kelvin = convert::to_si(value, units, Dimension::Temperature)?;
        self.set_temperature(k(kelvin))
    }

    pub fn set_pressure(&mut self, p: Pressure) -> ChemResult<()> {
        ensure_positive(p.value, "pressure")?;
        self.pressure = p;
        Ok(())
    }

    /// Set the pressure from a value in any pressure unit (`"bar"`, `"MPa"`, ...).
    pub fn set_pressure_in(&mut self, value: f64, units: &str) -> ChemResult<()> {
        let pascal = convert::to_si(value, units, Dimension::Pressure)?;
        self.set_pressure(pa(pascal))
    }

    /// Set every species amount to `value` [mol].
    pub fn fill_species_amounts(&mut self, value: f64) -> ChemResult<()> {
        ensure_non_negative(value, "species amount")?;
        self.n.fill(value);
        Ok(())
    }

    /// Replace the whole amount vector [mol].
    pub fn set_species_amounts(&mut self, n: &DVector<f64>) -> ChemResult<()> {
        if n.len() != self.system.num_species() {
            return Err(ChemError::DimensionMismatch {
                what: "species amounts",
                expected: self.system.num_species(),
                actual: n.len(),
            });
        }
        check_amounts(n.iter().copied())?;
        self.n.copy_from(n);
        Ok(())
    }

    /// Replace the amounts of the species at `indices` with `values` [mol].
    pub fn set_species_amounts_at(&mut self, values: &[f64], indices: &[usize]) -> ChemResult<()> {
        if values.len() != indices.len() {
            return Err(ChemError::DimensionMismatch {
                what: "amounts for the given indices",
                expected: indices.len(),
                actual: values.len(),
            });
        }
        for &i in indices {
            self.system.resolve_species(i)?;
        }
        check_amounts(values.iter().copied())?;
        for (&i, &v) in indices.iter().zip(values) {
            self.n[i] = v;
        }
        Ok(())
    }

    /// Set the amount [mol] of one species.
    pub fn set_species_amount<'a>(&mut self, species: impl Into<Key<'a>>, amount: f64) -> ChemResult<()> {
        let i = self.system.resolve_species(species)?;
        ensure_non_negative(amount, "species amount")?;
        self.n[i] = amount;
        Ok(())
    }

    /// Set the amount of one species from a value in amount units (`"mmol"`)
    /// or mass units (`"g"`), the latter divided by the species molar mass.
    pub fn set_species_amount_in<'a>(
        &mut self,
        species: impl Into<Key<'a>>,
        amount: f64,
        units: &str,
    ) -> ChemResult<()> {
        let i = self.system.resolve_species(species)?;
        let moles = self.to_moles(i, amount, units)?;
        self.set_species_amount(i, moles)
    }

    pub fn set_element_potentials(&mut self, y: &DVector<f64>) -> ChemResult<()> {
        if y.len() != self.system.num_elements() {
            return Err(ChemError::DimensionMismatch {
                what: "element potentials",
                expected: self.system.num_elements(),
                actual: y.len(),
            });
        }
        self.y.copy_from(y);
        Ok(())
    }

    pub fn set_species_potentials(&mut self, z: &DVector<f64>) -> ChemResult<()> {
        if z.len() != self.system.num_species() {
            return Err(ChemError::DimensionMismatch {
                what: "species potentials",
                expected: self.system.num_species(),
                actual: z.len(),
            });
        }
        self.z.copy_from(z);
        Ok(())
    }

    /// Rescale every amount so the total phase volume equals `volume`.
    ///
    /// A state with zero volume is scaled to zero.
    pub fn set_volume(&mut self, volume: Volume) -> ChemResult<()> {
        let target = ensure_non_negative(volume.value, "volume")?;
        let volumes = self.phase_volumes()?;
        let total = volumes.sum();
        let scalar = if total != 0.0 { target / total } else { 0.0 };
        self.scale_species_amounts(scalar)
    }

    /// Rescale the amounts of one phase so its volume equals `volume`.
    pub fn set_phase_volume<'a>(&mut self, phase: impl Into<Key<'a>>, volume: Volume) -> ChemResult<()> {
        let target = ensure_non_negative(volume.value, "phase volume")?;
        let iphase = self.system.resolve_phase(phase)?;
        let volumes = self.phase_volumes()?;
        let scalar = if volumes[iphase] != 0.0 {
            target / volumes[iphase]
        } else {
            0.0
        };
        self.scale_species_amounts_in_phase(iphase, scalar)
    }

    pub fn scale_species_amounts(&mut self, scalar: f64) -> ChemResult<()> {
        let scalar = ensure_non_negative(scalar, "scaling factor")?;
        self.n *= scalar;
        Ok(())
    }

    pub fn scale_species_amounts_in_phase<'a>(
        &mut self,
        phase: impl Into<Key<'a>>,
        scalar: f64,
    ) -> ChemResult<()> {
        let scalar = ensure_non_negative(scalar, "scaling factor")?;
        let iphase = self.system.resolve_phase(phase)?;
        for i in self.system.phase_species_range(iphase)? {
            self.n[i] *= scalar;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    /// Species amounts [mol].
    pub fn species_amounts(&self) -> &DVector<f64> {
        &self.n
    }

    /// Element potentials [J/mol].
    pub fn element_potentials(&self) -> &DVector<f64> {
        &self.y
    }

    /// Species potentials [J/mol].
    pub fn species_potentials(&self) -> &DVector<f64> {
        &self.z
    }

    /// Amount [mol] of one species.
    pub fn species_amount<'a>(&self, species: impl Into<Key<'a>>) -> ChemResult<f64> {
        Ok(self.n[self.system.resolve_species(species)?])
    }

    /// Amount of one species in amount or mass units.
    pub fn species_amount_in<'a>(&self, species: impl Into<Key<'a>>, units: &str) -> ChemResult<f64> {
        let i = self.system.resolve_species(species)?;
        if convert::convertible(units, "mol") {
            Ok(convert::convert(self.n[i], "mol", units)?)
        } else if convert::convertible(units, "kg") {
            let mass = self.n[i] * self.system.species()[i].molar_mass();
            Ok(convert::convert(mass, "kg", units)?)
        } else {
            Err(ChemError::NotAmountOrMass {
                units: units.to_string(),
            })
        }
    }

    /// Element amounts [mol] over the whole system.
    pub fn element_amounts(&self) -> DVector<f64> {
        self.system.formula_matrix() * &self.n
    }

    pub fn element_amounts_in_phase<'a>(&self, phase: impl Into<Key<'a>>) -> ChemResult<DVector<f64>> {
        let iphase = self.system.resolve_phase(phase)?;
        self.system.element_amounts_in_phase(iphase, &self.n)
    }

    pub fn element_amounts_in_species(&self, indices: &[usize]) -> ChemResult<DVector<f64>> {
        self.system.element_amounts_in_species(indices, &self.n)
    }

    /// Amount [mol] of one element over the whole system.
    pub fn element_amount<'a>(&self, element: impl Into<Key<'a>>) -> ChemResult<f64> {
        let ie = self.system.resolve_element(element)?;
        Ok(self.element_amounts()[ie])
    }

    pub fn element_amount_in<'a>(&self, element: impl Into<Key<'a>>, units: &str) -> ChemResult<f64> {
        Ok(convert::convert(self.element_amount(element)?, "mol", units)?)
    }

    /// Amount [mol] of one element in the species of one phase.
    pub fn element_amount_in_phase<'a, 'b>(
        &self,
        element: impl Into<Key<'a>>,
        phase: impl Into<Key<'b>>,
    ) -> ChemResult<f64> {
        let ie = self.system.resolve_element(element)?;
        Ok(self.element_amounts_in_phase(phase)?[ie])
    }

    pub fn element_amount_in_phase_in<'a, 'b>(
        &self,
        element: impl Into<Key<'a>>,
        phase: impl Into<Key<'b>>,
        units: &str,
    ) -> ChemResult<f64> {
        let b = self.element_amount_in_phase(element, phase)?;
        Ok(convert::convert(b, "mol", units)?)
    }

    /// Amount [mol] of one element in an arbitrary species subset.
    pub fn element_amount_in_species<'a>(
        &self,
        element: impl Into<Key<'a>>,
        indices: &[usize],
    ) -> ChemResult<f64> {
        let ie = self.system.resolve_element(element)?;
        Ok(self.element_amounts_in_species(indices)?[ie])
    }

    pub fn element_amount_in_species_in<'a>(
        &self,
        element: impl Into<Key<'a>>,
        indices: &[usize],
        units: &str,
    ) -> ChemResult<f64> {
        let b = self.element_amount_in_species(element, indices)?;
        Ok(convert::convert(b, "mol", units)?)
    }

    /// Phase volumes [m³] at the current (T, P, n).
    pub fn phase_volumes(&self) -> ChemResult<DVector<f64>> {
        self.system
            .phase_volumes(self.temperature.value, self.pressure.value, &self.n)
    }

    /// Sum of all species amounts.
    pub fn total_amount(&self) -> Amount {
        mol(self.n.sum())
    }

    /// Mass of the species in one phase.
    pub fn phase_mass<'a>(&self, phase: impl Into<Key<'a>>) -> ChemResult<Mass> {
        let iphase = self.system.resolve_phase(phase)?;
        let range = self.system.phase_species_range(iphase)?;
        Ok(range
            .map(|i| mol(self.n[i]) * kg_per_mol(self.system.molar_masses()[i]))
            .fold(kg(0.0), |total, m| total + m))
    }

    fn to_moles(&self, ispecies: usize, amount: f64, units: &str) -> ChemResult<f64> {
        if convert::convertible(units, "mol") {
            Ok(convert::convert(amount, units, "mol")?)
        } else if convert::convertible(units, "kg") {
            let molar_mass = self.system.species()[ispecies].molar_mass();
            if molar_mass <= 0.0 {
                return Err(ChemError::validation(format!(
                    "species '{}' has no molar mass",
                    self.system.species()[ispecies].name()
                )));
            }
            Ok(convert::convert(amount, units, "kg")? / molar_mass)
        } else {
            Err(ChemError::NotAmountOrMass {
                units: units.to_string(),
            })
        }
    }
}

fn check_amounts(values: impl Iterator<Item = f64>) -> ChemResult<()> {
    for (i, v) in values.enumerate() {
        if !v.is_finite() || v < 0.0 {
            return Err(ChemError::validation(format!(
                "species amount at position {i} must be finite and non-negative, got {v}"
            )));
        }
    }
    Ok(())
}

/// Copy of `left` whose amounts are the elementwise sum of both states.
///
/// Temperature, pressure and potentials are taken from `left`.
pub fn combine_amounts(left: &ChemicalState, right: &ChemicalState) -> ChemResult<ChemicalState> {
    if !left.system.is_compatible(&right.system) {
        return Err(ChemError::validation(
            "cannot combine states of different chemical systems",
        ));
    }
    let mut result = left.clone();
    result.n = &left.n + &right.n;
    Ok(result)
}

/// Copy of `state` with every amount multiplied by `factor` (which must be `>= 0`).
pub fn scale_amounts(state: &ChemicalState, factor: f64) -> ChemResult<ChemicalState> {
    let mut result = state.clone();
    result.scale_species_amounts(factor)?;
    Ok(result)
}
