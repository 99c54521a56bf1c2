//! Chemical systems and states.
//!
//! This crate provides:
//! - Elements, species (with formula parsing) and phases
//! - [`ChemicalSystem`], an immutable species/element/phase registry with its
//!   formula matrix and a pluggable [`ThermoModel`]
//! - [`ChemicalState`], the validated container of T, P and species amounts
//! - [`Partition`] of species into equilibrium, kinetic and inert roles
//! - Quantity extraction (`n[...]`, `b[...]`, `m[...]`, `a[...]`, `pH`)

pub mod element;
pub mod error;
pub mod formula;
pub mod ideal;
pub mod model;
pub mod partition;
pub mod phase;
pub mod quantity;
pub mod species;
pub mod state;
pub mod system;
pub mod table;

pub use element::{CHARGE_SYMBOL, Element};
pub use error::{ChemError, ChemResult};
pub use formula::{ParsedFormula, parse_formula};
pub use ideal::{IdealModel, WATER};
pub use model::{ChemicalVector, ThermoModel};
pub use partition::{Partition, Role};
pub use phase::{Phase, PhaseKind};
pub use quantity::{Quantity, extract};
pub use species::Species;
pub use state::{ChemicalState, combine_amounts, scale_amounts};
pub use system::{ChemicalSystem, ChemicalSystemBuilder, Key};
pub use table::format_table;
