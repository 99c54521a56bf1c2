//! Shared chemical systems for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use kf_chem::{ChemicalState, ChemicalSystem, PhaseKind, Species};

/// Aqueous NaCl solution with a halite and a gas phase.
pub fn brine_system() -> Arc<ChemicalSystem> {
    let mut builder = ChemicalSystem::builder();
    builder.add_phase(
        "Aqueous",
        PhaseKind::Aqueous,
        vec![
            Species::new("H2O(l)")
                .expect("water")
                .with_standard_gibbs_energy(-237_181.0)
                .with_molar_volume(1.807e-5),
            Species::new("H+").expect("hydron"),
            Species::new("OH-")
                .expect("hydroxide")
                .with_standard_gibbs_energy(-157_220.0),
            Species::new("Na+")
                .expect("sodium")
                .with_standard_gibbs_energy(-261_881.0),
            Species::new("Cl-")
                .expect("chloride")
                .with_standard_gibbs_energy(-131_290.0),
        ],
    );
    builder.add_phase(
        "Halite",
        PhaseKind::Mineral,
        vec![
            Species::new("NaCl")
                .expect("halite")
                .with_standard_gibbs_energy(-384_138.0)
                .with_molar_volume(2.702e-5),
        ],
    );
    builder.add_phase(
        "Gaseous",
        PhaseKind::Gaseous,
        vec![
            Species::new("N2(g)").expect("nitrogen"),
            Species::new("O2(g)").expect("oxygen"),
        ],
    );
    Arc::new(builder.build().expect("brine system should build"))
}

/// One kilogram of water with 0.1 mol NaCl dissolved, 1 mol halite and 1 mol air.
pub fn brine_state() -> ChemicalState {
    let mut state = ChemicalState::new(brine_system());
    for (name, amount) in [
        ("H2O(l)", 55.508),
        ("H+", 1e-7),
        ("OH-", 1e-7),
        ("Na+", 0.1),
        ("Cl-", 0.1),
        ("NaCl", 1.0),
        ("N2(g)", 0.79),
        ("O2(g)", 0.21),
    ] {
        state
            .set_species_amount(name, amount)
            .expect("amount should be accepted");
    }
    state
}
