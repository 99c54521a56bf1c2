//! Chemical species definitions.

use crate::element::Element;
use crate::error::{ChemError, ChemResult};
use crate::formula::parse_formula;

/// A distinct chemical entity living in one phase.
///
/// Thermodynamic data are intentionally minimal: a standard molar Gibbs
/// energy of formation [J/mol] and a standard molar volume [m³/mol], which is
/// all the ideal property model needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    formula: String,
    elements: Vec<(String, f64)>,
    charge: f64,
    molar_mass: f64,
    standard_gibbs_energy: f64,
    molar_volume: f64,
}

impl Species {
    /// Create a species whose formula is its name (phase tags such as `(aq)` are ignored).
    pub fn new(name: impl Into<String>) -> ChemResult<Self> {
        let name = name.into();
        let formula = name.clone();
        Self::from_formula(name, formula)
    }

    /// Create a species named `name` with an explicit chemical formula.
    pub fn from_formula(name: impl Into<String>, formula: impl Into<String>) -> ChemResult<Self> {
        let name = name.into();
        let formula = formula.into();
        if name.trim().is_empty() {
            return Err(ChemError::validation("species name must not be empty"));
        }
        let parsed = parse_formula(&formula)?;

        let mut molar_mass = 0.0;
        for (symbol, count) in &parsed.elements {
            molar_mass += Element::lookup(symbol)?.molar_mass() * count;
        }

        Ok(Self {
            name,
            formula,
            elements: parsed.elements,
            charge: parsed.charge,
            molar_mass,
            standard_gibbs_energy: 0.0,
            molar_volume: 0.0,
        })
    }

    /// Set the standard molar Gibbs energy of formation [J/mol].
    pub fn with_standard_gibbs_energy(mut self, g0: f64) -> Self {
        self.standard_gibbs_energy = g0;
        self
    }

    /// Set the standard molar volume [m³/mol].
    pub fn with_molar_volume(mut self, v0: f64) -> Self {
        self.molar_volume = v0;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Element symbols and counts (charge excluded).
    pub fn elements(&self) -> &[(String, f64)] {
        &self.elements
    }

    /// Stoichiometric count of `symbol`; the charge pseudo-element `Z` yields the charge.
    pub fn element_coefficient(&self, symbol: &str) -> f64 {
        if symbol == crate::element::CHARGE_SYMBOL {
            return self.charge;
        }
        self.elements
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }

    /// Standard molar Gibbs energy of formation [J/mol].
    pub fn standard_gibbs_energy(&self) -> f64 {
        self.standard_gibbs_energy
    }

    /// Standard molar volume [m³/mol].
    pub fn molar_volume(&self) -> f64 {
        self.molar_volume
    }
}
