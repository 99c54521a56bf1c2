//! Quantity extraction from a chemical state.
//!
//! Expressions have the form `<kind>[<name>]...(:<units>)`:
//!
//! | expression            | value                                      | default unit |
//! |-----------------------|--------------------------------------------|--------------|
//! | `n[H2O(l)]`           | amount of a species                        | mol          |
//! | `b[Na]`, `b[Ca][Calcite]` | amount of an element, optionally in a phase | mol     |
//! | `m[Na+]`              | molality of a solute                       | molal        |
//! | `a[H+]`               | activity (dimensionless)                   |              |
//! | `pH`                  | `-log10 a(H+)`                             |              |

use std::str::FromStr;

use kf_core::constants::WATER_MOLAR_MASS;
use kf_core::convert;

use crate::error::{ChemError, ChemResult};
use crate::ideal::WATER;
use crate::state::ChemicalState;

const HYDRON: &str = "H+";

/// A parsed quantity expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    SpeciesAmount {
        species: String,
        units: Option<String>,
    },
    ElementAmount {
        element: String,
        phase: Option<String>,
        units: Option<String>,
    },
    Molality {
        species: String,
        units: Option<String>,
    },
    Activity {
        species: String,
    },
    PH,
}

impl Quantity {
    pub fn parse(expression: &str) -> ChemResult<Self> {
        let unsupported = || ChemError::UnsupportedQuantity {
            expression: expression.to_string(),
        };

        let expr = expression.trim();
        if expr == "pH" {
            return Ok(Quantity::PH);
        }

        let open = expr.find('[').ok_or_else(unsupported)?;
        let kind = &expr[..open];
        let mut rest = &expr[open..];
        let mut names = Vec::new();
        while let Some(inner) = rest.strip_prefix('[') {
            let close = inner.find(']').ok_or_else(unsupported)?;
            let name = inner[..close].trim();
            if name.is_empty() {
                return Err(unsupported());
            }
            names.push(name.to_string());
            rest = &inner[close + 1..];
        }
        let units = match rest.strip_prefix(':') {
            Some(u) if !u.trim().is_empty() => Some(u.trim().to_string()),
            None if rest.trim().is_empty() => None,
            _ => return Err(unsupported()),
        };

        let mut names = names.into_iter();
        let quantity = match (kind, names.len()) {
            ("n", 1) => Quantity::SpeciesAmount {
                species: names.next().ok_or_else(unsupported)?,
                units,
            },
            ("b", 1 | 2) => Quantity::ElementAmount {
                element: names.next().ok_or_else(unsupported)?,
                phase: names.next(),
                units,
            },
            ("m", 1) => Quantity::Molality {
                species: names.next().ok_or_else(unsupported)?,
                units,
            },
            ("a", 1) if units.is_none() => Quantity::Activity {
                species: names.next().ok_or_else(unsupported)?,
            },
            _ => return Err(unsupported()),
        };
        Ok(quantity)
    }

    /// Evaluate against the current (T, P, n) of `state`.
    pub fn evaluate(&self, state: &ChemicalState) -> ChemResult<f64> {
        match self {
            Quantity::SpeciesAmount { species, units } => {
                state.species_amount_in(species.as_str(), units.as_deref().unwrap_or("mol"))
            }
            Quantity::ElementAmount {
                element,
                phase,
                units,
            } => {
                let units = units.as_deref().unwrap_or("mol");
                match phase {
                    Some(phase) => {
                        state.element_amount_in_phase_in(element.as_str(), phase.as_str(), units)
                    }
                    None => state.element_amount_in(element.as_str(), units),
                }
            }
            Quantity::Molality { species, units } => {
                let molality = molality(state, species)?;
                Ok(convert::convert(
                    molality,
                    "molal",
                    units.as_deref().unwrap_or("molal"),
                )?)
            }
            Quantity::Activity { species } => activity(state, species),
            Quantity::PH => Ok(-activity(state, HYDRON)?.log10()),
        }
    }
}

impl FromStr for Quantity {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

/// Parse and evaluate `expression` against `state`.
pub fn extract(state: &ChemicalState, expression: &str) -> ChemResult<f64> {
    Quantity::parse(expression)?.evaluate(state)
}

fn molality(state: &ChemicalState, species: &str) -> ChemResult<f64> {
    let system = state.system();
    let i = system.resolve_species(species)?;
    let iw = system.resolve_species(WATER)?;
    let n = state.species_amounts();
    let solvent_mass = n[iw] * WATER_MOLAR_MASS;
    if solvent_mass <= 0.0 {
        return Err(ChemError::validation(format!(
            "molality of '{species}' is undefined without solvent water"
        )));
    }
    Ok(n[i] / solvent_mass)
}

fn activity(state: &ChemicalState, species: &str) -> ChemResult<f64> {
    let system = state.system();
    let i = system.resolve_species(species)?;
    let a = system.activities(
        state.temperature().value,
        state.pressure().value,
        state.species_amounts(),
    )?;
    Ok(a.val[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseKind;
    use crate::species::Species;
    use crate::system::ChemicalSystem;
    use nalgebra::DVector;
    use std::sync::Arc;

    fn state() -> ChemicalState {
        let mut builder = ChemicalSystem::builder();
        builder.add_phase(
            "Aqueous",
            PhaseKind::Aqueous,
            ["H2O(l)", "H+", "OH-", "Na+", "Cl-"]
                .into_iter()
                .map(|s| Species::new(s).unwrap())
                .collect(),
        );
        builder.add_phase("Halite", PhaseKind::Mineral, vec![Species::new("NaCl").unwrap()]);
        let system = Arc::new(builder.build().unwrap());
        let mut state = ChemicalState::new(system);
        state
            .set_species_amounts(&DVector::from_vec(vec![55.508, 1e-7, 1e-7, 0.5, 0.5, 2.0]))
            .unwrap();
        state
    }

    #[test]
    fn parse_variants() {
        assert_eq!(
            Quantity::parse("n[H2O(l)]").unwrap(),
            Quantity::SpeciesAmount {
                species: "H2O(l)".into(),
                units: None
            }
        );
        assert_eq!(
            Quantity::parse("b[Na][Halite]:mmol").unwrap(),
            Quantity::ElementAmount {
                element: "Na".into(),
                phase: Some("Halite".into()),
                units: Some("mmol".into())
            }
        );
        assert_eq!(
            "m[Na+]:mmolal".parse::<Quantity>().unwrap(),
            Quantity::Molality {
                species: "Na+".into(),
                units: Some("mmolal".into())
            }
        );
        assert_eq!(Quantity::parse(" pH ").unwrap(), Quantity::PH);
    }

    #[test]
    fn unsupported_expressions() {
        for expr in ["x[Na+]", "ph", "n", "n[]", "n[Na+", "n[Na+]junk", "n[Na+][Cl-]", "a[H+]:mol", "b[Na]:"] {
            assert!(
                matches!(Quantity::parse(expr), Err(ChemError::UnsupportedQuantity { .. })),
                "{expr} should be rejected"
            );
        }
    }

    #[test]
    fn species_amount_matches_accessor() {
        let state = state();
        assert_eq!(
            extract(&state, "n[H2O(l)]").unwrap(),
            state.species_amount_in("H2O(l)", "mol").unwrap()
        );
        assert!((extract(&state, "n[Na+]:mmol").unwrap() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn element_amounts() {
        let state = state();
        assert!((extract(&state, "b[Na]").unwrap() - 2.5).abs() < 1e-12);
        assert!((extract(&state, "b[Na][Halite]").unwrap() - 2.0).abs() < 1e-12);
        assert!((extract(&state, "b[Cl][Aqueous]:mmol").unwrap() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn molality_and_ph() {
        let state = state();
        let m = extract(&state, "m[Na+]").unwrap();
        assert!((m - 0.5 / (55.508 * WATER_MOLAR_MASS)).abs() < 1e-12);
        assert!((extract(&state, "m[Na+]:mmolal").unwrap() - 1e3 * m).abs() < 1e-9);

        let a_h = extract(&state, "a[H+]").unwrap();
        let ph = extract(&state, "pH").unwrap();
        assert!((ph + a_h.log10()).abs() < 1e-12);
        assert!(ph > 6.9 && ph < 7.1);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let state = state();
        let q = Quantity::parse("a[Cl-]").unwrap();
        assert_eq!(q.evaluate(&state).unwrap(), q.evaluate(&state).unwrap());
    }

    #[test]
    fn unknown_names_are_lookup_errors() {
        let state = state();
        assert!(matches!(extract(&state, "n[K+]"), Err(ChemError::Lookup { .. })));
        assert!(matches!(extract(&state, "b[Na][Gas]"), Err(ChemError::Lookup { .. })));
    }
}
