//! Compositions of aqueous and gaseous fluids, converted to equilibrium problems.

use std::sync::Arc;

use crate::error::{EquilibriumError, EquilibriumResult};
use crate::problem::EquilibriumProblem;
use kf_chem::{ChemError, ChemicalSystem, Partition};
use kf_core::constants::{DEFAULT_PRESSURE, DEFAULT_TEMPERATURE};
use kf_core::convert::{self, Dimension};

/// Fluid composition described by solute molalities and gas mole fractions.
///
/// ```text
/// aqueous:  "1 molal NaCl; 1 mmolal MgCl2"
/// gaseous:  "0.70 N2; 0.30 O2"
/// ```
#[derive(Debug, Clone)]
pub struct ChemicalComposition {
    system: Arc<ChemicalSystem>,
    partition: Option<Partition>,
    temperature: f64,
    pressure: f64,
    /// Solute formulas and molalities [mol/kg]; `None` when no aqueous fluid was set
    aqueous: Option<Vec<(String, f64)>>,
    /// Gas formulas and normalised mole fractions
    gaseous: Vec<(String, f64)>,
    /// Solvent water [kg]
    water_mass: f64,
    /// Total gas amount [mol]
    gaseous_amount: f64,
}

impl ChemicalComposition {
    pub fn new(system: Arc<ChemicalSystem>) -> Self {
        Self {
            system,
            partition: None,
            temperature: DEFAULT_TEMPERATURE,
            pressure: DEFAULT_PRESSURE,
            aqueous: None,
            gaseous: Vec::new(),
            water_mass: 1.0,
            gaseous_amount: 1.0,
        }
    }

    pub fn system(&self) -> &Arc<ChemicalSystem> {
        &self.system
    }

    pub fn set_partition(&mut self, partition: Partition) -> EquilibriumResult<()> {
        partition.validate_for(&self.system)?;
        self.partition = Some(partition);
        Ok(())
    }

    pub fn set_temperature(&mut self, value: f64, units: &str) -> EquilibriumResult<()> {
        let kelvin = convert::to_si(value, units, Dimension::Temperature)?;
        self.temperature = kf_core::ensure_positive(kelvin, "temperature").map_err(ChemError::from)?;
        Ok(())
    }

    pub fn set_pressure(&mut self, value: f64, units: &str) -> EquilibriumResult<()> {
        let pascal = convert::to_si(value, units, Dimension::Pressure)?;
        self.pressure = kf_core::ensure_positive(pascal, "pressure").map_err(ChemError::from)?;
        Ok(())
    }

    /// Set the solutes as `;`-separated `value unit formula` clauses with
    /// molality units. An empty string means pure water.
    pub fn set_aqueous_fluid(&mut self, molalities: &str) -> EquilibriumResult<()> {
        let mut solutes = Vec::new();
        for clause in clauses(molalities) {
            let tokens: Vec<&str> = clause.split_whitespace().collect();
            let &[value, unit, formula] = tokens.as_slice() else {
                return Err(setup(format!(
                    "aqueous clause '{clause}' must read 'value unit formula'"
                )));
            };
            let molality = convert::to_si(parse_number(value)?, unit, Dimension::Molality)?;
            kf_core::ensure_non_negative(molality, "molality").map_err(ChemError::from)?;
            solutes.push((formula.to_string(), molality));
        }
        self.aqueous = Some(solutes);
        Ok(())
    }

    /// Set the gas as `;`-separated `fraction formula` clauses. Fractions
    /// are normalised to sum to one.
    pub fn set_gaseous_fluid(&mut self, fractions: &str) -> EquilibriumResult<()> {
        let mut gases = Vec::new();
        for clause in clauses(fractions) {
            let tokens: Vec<&str> = clause.split_whitespace().collect();
            let &[value, formula] = tokens.as_slice() else {
                return Err(setup(format!(
                    "gaseous clause '{clause}' must read 'fraction formula'"
                )));
            };
            let fraction = kf_core::ensure_non_negative(parse_number(value)?, "mole fraction")
                .map_err(ChemError::from)?;
            gases.push((formula.to_string(), fraction));
        }
        let total: f64 = gases.iter().map(|(_, x)| x).sum();
        if !gases.is_empty() && total <= 0.0 {
            return Err(setup("gas mole fractions sum to zero".to_string()));
        }
        for (_, x) in &mut gases {
            *x /= total;
        }
        self.gaseous = gases;
        Ok(())
    }

    /// Total amount of the gaseous fluid (default 1 mol).
    pub fn set_gaseous_amount(&mut self, value: f64, units: &str) -> EquilibriumResult<()> {
        let moles = convert::to_si(value, units, Dimension::Amount)?;
        self.gaseous_amount = kf_core::ensure_non_negative(moles, "gas amount").map_err(ChemError::from)?;
        Ok(())
    }

    /// Mass of solvent water (default 1 kg).
    pub fn set_water_mass(&mut self, value: f64, units: &str) -> EquilibriumResult<()> {
        let kilograms = convert::to_si(value, units, Dimension::Mass)?;
        self.water_mass = kf_core::ensure_non_negative(kilograms, "water mass").map_err(ChemError::from)?;
        Ok(())
    }

    /// Element amounts of water, solutes and gases as an equilibrium problem.
    pub fn to_equilibrium_problem(&self) -> EquilibriumResult<EquilibriumProblem> {
        let mut problem = EquilibriumProblem::new(self.system.clone());
        problem.set_temperature(self.temperature, "K")?;
        problem.set_pressure(self.pressure, "Pa")?;
        if let Some(partition) = &self.partition {
            problem.set_partition(partition.clone())?;
        }
        if let Some(solutes) = &self.aqueous {
            problem.add("H2O", self.water_mass, "kg")?;
            for (formula, molality) in solutes {
                problem.add(formula, molality * self.water_mass, "mol")?;
            }
        }
        for (formula, fraction) in &self.gaseous {
            problem.add(formula, fraction * self.gaseous_amount, "mol")?;
        }
        Ok(problem)
    }
}

fn clauses(s: &str) -> impl Iterator<Item = &str> {
    s.split(';').map(str::trim).filter(|c| !c.is_empty())
}

fn parse_number(token: &str) -> EquilibriumResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| setup(format!("'{token}' is not a number")))
}

fn setup(what: String) -> EquilibriumError {
    EquilibriumError::ProblemSetup { what }
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
            ["H2O(l)", "H+", "OH-", "Na+", "Cl-", "Mg+2", "O2(aq)", "N2(aq)"]
                .into_iter()
                .map(|s| Species::new(s).unwrap())
                .collect(),
        );
        builder.add_phase(
            "Gaseous",
            PhaseKind::Gaseous,
            vec![Species::new("N2(g)").unwrap(), Species::new("O2(g)").unwrap()],
        );
        Arc::new(builder.build().unwrap())
    }

    fn amount(problem: &EquilibriumProblem, element: &str) -> f64 {
        let j = problem.system().index_element(element).unwrap();
        problem.element_amounts()[j]
    }

    #[test]
    fn brine_and_air() {
        let mut composition = ChemicalComposition::new(system());
        composition.set_temperature(60.0, "celsius").unwrap();
        composition.set_pressure(10.0, "bar").unwrap();
        composition
            .set_aqueous_fluid("1 molal NaCl; 10 mmolal MgCl2")
            .unwrap();
        composition.set_gaseous_fluid("0.70 N2; 0.30 O2").unwrap();
        composition.set_gaseous_amount(2.0, "mol").unwrap();

        let problem = composition.to_equilibrium_problem().unwrap();
        assert!((problem.temperature().value - 333.15).abs() < 1e-12);
        assert_eq!(problem.pressure().value, 1e6);
        assert!((amount(&problem, "Na") - 1.0).abs() < 1e-12);
        assert!((amount(&problem, "Mg") - 0.01).abs() < 1e-12);
        assert!((amount(&problem, "Cl") - 1.02).abs() < 1e-12);
        assert!((amount(&problem, "N") - 2.8).abs() < 1e-12);
        let water = 1.0 / 0.018_015_28;
        assert!((amount(&problem, "O") - (water + 1.2)).abs() < 1e-9);
    }

    #[test]
    fn fractions_are_normalised() {
        let mut composition = ChemicalComposition::new(system());
        composition.set_gaseous_fluid("7 N2; 3 O2").unwrap();
        let problem = composition.to_equilibrium_problem().unwrap();
        assert!((amount(&problem, "N") - 1.4).abs() < 1e-12);
        assert_eq!(amount(&problem, "H"), 0.0);
    }

    #[test]
    fn malformed_clauses() {
        let mut composition = ChemicalComposition::new(system());
        assert!(composition.set_aqueous_fluid("1 NaCl").is_err());
        assert!(composition.set_aqueous_fluid("one molal NaCl").is_err());
        assert!(composition.set_aqueous_fluid("1 bar NaCl").is_err());
        assert!(composition.set_gaseous_fluid("0 N2; 0 O2").is_err());
        assert!(composition.set_gaseous_fluid("0.5 N2 extra").is_err());
        composition.set_aqueous_fluid("1 molal KCl").unwrap();
        assert!(matches!(
            composition.to_equilibrium_problem(),
            Err(EquilibriumError::Chem(ChemError::Lookup { .. }))
        ));
    }
}
