//! Equilibrium problems defined by conditions and element amounts.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{EquilibriumError, EquilibriumResult};
use crate::options::EquilibriumOptions;
use crate::solver::EquilibriumSolver;
use kf_chem::{CHARGE_SYMBOL, ChemError, ChemicalState, ChemicalSystem, Element, Key, Partition, parse_formula};
use kf_core::constants::{DEFAULT_PRESSURE, DEFAULT_TEMPERATURE};
use kf_core::convert::{self, Dimension};
use kf_core::units::{Pressure, Temperature, k, pa};

/// Temperature, pressure and element amounts to equilibrate.
#[derive(Debug, Clone)]
pub struct EquilibriumProblem {
    system: Arc<ChemicalSystem>,
    partition: Partition,
    temperature: Temperature,
    pressure: Pressure,
    element_amounts: DVector<f64>,
    options: EquilibriumOptions,
}

impl EquilibriumProblem {
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        let partition = Partition::all_equilibrium(&system);
        let element_amounts = DVector::zeros(system.num_elements());
        Self {
            system,
            partition,
            temperature: k(DEFAULT_TEMPERATURE),
            pressure: pa(DEFAULT_PRESSURE),
            element_amounts,
            options: EquilibriumOptions::default(),
        }
    }

    pub fn set_temperature(&mut self, value: f64, units: &str) -> EquilibriumResult<()> {
        let kelvin = convert::to_si(value, units, Dimension::Temperature)?;
        kf_core::ensure_positive(kelvin, "temperature").map_err(ChemError::from)?;
        self.temperature = k(kelvin);
        Ok(())
    }

    pub fn set_pressure(&mut self, value: f64, units: &str) -> EquilibriumResult<()> {
        let pascal = convert::to_si(value, units, Dimension::Pressure)?;
        kf_core::ensure_positive(pascal, "pressure").map_err(ChemError::from)?;
        self.pressure = pa(pascal);
        Ok(())
    }

    pub fn set_partition(&mut self, partition: Partition) -> EquilibriumResult<()> {
        partition.validate_for(&self.system)?;
        self.partition = partition;
        Ok(())
    }

    pub fn set_options(&mut self, options: EquilibriumOptions) -> EquilibriumResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Replace all element amounts [mol].
    pub fn set_element_amounts(&mut self, b: &DVector<f64>) -> EquilibriumResult<()> {
        if b.len() != self.system.num_elements() {
            return Err(ChemError::DimensionMismatch {
                what: "element amounts",
                expected: self.system.num_elements(),
                actual: b.len(),
            }
            .into());
        }
        self.element_amounts.copy_from(b);
        Ok(())
    }

    /// Set the amount of one element in any amount unit.
    pub fn set_element_amount<'a>(
        &mut self,
        element: impl Into<Key<'a>>,
        amount: f64,
        units: &str,
    ) -> EquilibriumResult<()> {
        let j = self.system.resolve_element(element)?;
        self.element_amounts[j] = convert::to_si(amount, units, Dimension::Amount)?;
        Ok(())
    }

    /// Add the elements of a species or compound.
    ///
    /// `substance` is looked up as a species name first and parsed as a
    /// formula otherwise. `units` may be an amount or a mass unit.
    pub fn add(&mut self, substance: &str, amount: f64, units: &str) -> EquilibriumResult<()> {
        kf_core::ensure_non_negative(amount, "added amount").map_err(ChemError::from)?;
        let (elements, charge) = match self.system.index_species(substance) {
            Some(i) => {
                let species = &self.system.species()[i];
                (species.elements().to_vec(), species.charge())
            }
            None => {
                let parsed = parse_formula(substance)?;
                (parsed.elements, parsed.charge)
            }
        };

        let moles = if convert::convertible(units, "mol") {
            convert::convert(amount, units, "mol")?
        } else if convert::convertible(units, "kg") {
            let molar_mass = elements
                .iter()
                .map(|(symbol, count)| Ok(Element::lookup(symbol)?.molar_mass() * count))
                .sum::<Result<f64, ChemError>>()?;
            if molar_mass <= 0.0 {
                return Err(EquilibriumError::ProblemSetup {
                    what: format!("'{substance}' has no molar mass"),
                });
            }
            convert::convert(amount, units, "kg")? / molar_mass
        } else {
            return Err(ChemError::NotAmountOrMass {
                units: units.to_string(),
            }
            .into());
        };

        let mut delta = DVector::zeros(self.system.num_elements());
        for (symbol, count) in &elements {
            delta[self.system.resolve_element(symbol.as_str())?] += count * moles;
        }
        if charge != 0.0 {
            delta[self.system.resolve_element(CHARGE_SYMBOL)?] += charge * moles;
        }
        self.element_amounts += delta;
        Ok(())
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    pub fn element_amounts(&self) -> &DVector<f64> {
        &self.element_amounts
    }

    pub fn options(&self) -> &EquilibriumOptions {
        &self.options
    }
}

/// Solve `problem` from an empty state and return the equilibrated state.
pub fn solve_problem(problem: &EquilibriumProblem) -> EquilibriumResult<ChemicalState> {
    let mut solver = EquilibriumSolver::new(problem.system.clone());
    solver.set_options(problem.options.clone())?;
    solver.set_partition(problem.partition.clone())?;

    let mut state = ChemicalState::new(problem.system.clone());
    state.set_temperature(problem.temperature)?;
    state.set_pressure(problem.pressure)?;
    solver.equilibrate(&mut state, &problem.element_amounts)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_chem::{PhaseKind, Species};

    fn system() -> Arc<ChemicalSystem> {
        let mut builder = ChemicalSystem::builder();
        builder.add_phase(
            "Aqueous",
            PhaseKind::Aqueous,
            vec![
                Species::new("H2O(l)").unwrap().with_standard_gibbs_energy(-237_181.0),
                Species::new("H+").unwrap(),
                Species::new("OH-").unwrap().with_standard_gibbs_energy(-157_220.0),
                Species::new("Na+").unwrap().with_standard_gibbs_energy(-261_881.0),
                Species::new("Cl-").unwrap().with_standard_gibbs_energy(-131_290.0),
            ],
        );
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn add_accumulates_elements() {
        let mut problem = EquilibriumProblem::new(system());
        problem.add("H2O", 1.0, "kg").unwrap();
        problem.add("NaCl", 100.0, "mmol").unwrap();
        let b = problem.element_amounts();
        let sys = problem.system().clone();
        let h = sys.index_element("H").unwrap();
        let na = sys.index_element("Na").unwrap();
        let z = sys.index_element("Z").unwrap();
        assert!((b[h] - 2.0 / 0.018_015_28).abs() < 1e-2);
        assert!((b[na] - 0.1).abs() < 1e-15);
        assert_eq!(b[z], 0.0);

        problem.add("Na+", 1.0, "mol").unwrap();
        assert_eq!(problem.element_amounts()[z], 1.0);
    }

    #[test]
    fn add_rejects_bad_input() {
        let mut problem = EquilibriumProblem::new(system());
        assert!(problem.add("CaCO3", 1.0, "mol").is_err());
        assert!(problem.add("NaCl", 1.0, "bar").is_err());
        assert!(problem.add("NaCl", -1.0, "mol").is_err());
        assert!(problem.set_temperature(-10.0, "K").is_err());
        assert!(problem.set_pressure(1.0, "kg").is_err());
        assert!(problem.set_element_amounts(&DVector::zeros(2)).is_err());
    }

    #[test]
    fn set_element_amount_converts_units() {
        let mut problem = EquilibriumProblem::new(system());
        problem.set_element_amount("Cl", 250.0, "mmol").unwrap();
        let cl = problem.system().index_element("Cl").unwrap();
        assert!((problem.element_amounts()[cl] - 0.25).abs() < 1e-15);
        assert!(problem.set_element_amount("Cl", 1.0, "g").is_err());
    }

    #[test]
    fn solves_salt_water() {
        let mut problem = EquilibriumProblem::new(system());
        problem.set_temperature(25.0, "celsius").unwrap();
        problem.set_pressure(1.0, "bar").unwrap();
        problem.add("H2O", 1.0, "kg").unwrap();
        problem.add("NaCl", 0.1, "mol").unwrap();

        let state = solve_problem(&problem).unwrap();
        assert!((state.species_amount("Na+").unwrap() - 0.1).abs() < 1e-9);
        assert!((state.species_amount("Cl-").unwrap() - 0.1).abs() < 1e-9);
        let ph = kf_chem::extract(&state, "pH").unwrap();
        assert!((ph - 7.0).abs() < 0.05, "pH = {ph}");
    }
}
