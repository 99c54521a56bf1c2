//! Chemical elements.

use crate::error::{ChemError, ChemResult};

/// Symbol of the pseudo-element tracking electric charge.
pub const CHARGE_SYMBOL: &str = "Z";

/// Standard atomic weights [kg/mol] of the elements known to the formula parser.
const ATOMIC_WEIGHTS: &[(&str, f64)] = &[
    ("H", 1.007_94e-3),
    ("He", 4.002_602e-3),
    ("Li", 6.941e-3),
    ("Be", 9.012_182e-3),
    ("B", 10.811e-3),
    ("C", 12.010_7e-3),
    ("N", 14.006_7e-3),
    ("O", 15.999_4e-3),
    ("F", 18.998_403_2e-3),
    ("Ne", 20.179_7e-3),
    ("Na", 22.989_769_28e-3),
    ("Mg", 24.305_0e-3),
    ("Al", 26.981_538_6e-3),
    ("Si", 28.085_5e-3),
    ("P", 30.973_762e-3),
    ("S", 32.065e-3),
    ("Cl", 35.453e-3),
    ("Ar", 39.948e-3),
    ("K", 39.098_3e-3),
    ("Ca", 40.078e-3),
    ("Mn", 54.938_045e-3),
    ("Fe", 55.845e-3),
    ("Co", 58.933_195e-3),
    ("Ni", 58.693_4e-3),
    ("Cu", 63.546e-3),
    ("Zn", 65.38e-3),
    ("Br", 79.904e-3),
    ("Sr", 87.62e-3),
    ("Ag", 107.868_2e-3),
    ("I", 126.904_47e-3),
    ("Ba", 137.327e-3),
    ("Pb", 207.2e-3),
    ("U", 238.028_91e-3),
];

/// A conserved component tracked by the formula matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    symbol: String,
    molar_mass: f64,
}

impl Element {
    /// Create an element with an explicit molar mass [kg/mol].
    pub fn new(symbol: impl Into<String>, molar_mass: f64) -> Self {
        Self {
            symbol: symbol.into(),
            molar_mass,
        }
    }

    /// Look up an element in the built-in table of atomic weights.
    pub fn lookup(symbol: &str) -> ChemResult<Self> {
        if symbol == CHARGE_SYMBOL {
            return Ok(Self::charge());
        }
        ATOMIC_WEIGHTS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(s, mm)| Self::new(*s, *mm))
            .ok_or_else(|| ChemError::Lookup {
                kind: "element",
                name: symbol.to_string(),
            })
    }

    /// The massless charge pseudo-element.
    pub fn charge() -> Self {
        Self::new(CHARGE_SYMBOL, 0.0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }

    pub fn is_charge(&self) -> bool {
        self.symbol == CHARGE_SYMBOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_and_unknown() {
        let na = Element::lookup("Na").unwrap();
        assert!((na.molar_mass() - 0.022_989_769_28).abs() < 1e-12);
        assert!(!na.is_charge());
        assert!(Element::lookup("Zz").is_err());
        assert!(Element::lookup("Z").unwrap().is_charge());
    }
}
