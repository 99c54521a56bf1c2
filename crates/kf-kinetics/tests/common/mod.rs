//! Shared reaction systems for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use kf_chem::{ChemicalState, ChemicalSystem, PhaseKind, Species};
use kf_kinetics::{MassActionRate, Reaction, ReactionSystem, TransitionStateRate};

/// Water with dissolved sodium chloride and its ion pair.
pub fn saline_system() -> Arc<ChemicalSystem> {
    let mut builder = ChemicalSystem::builder();
    builder.add_phase(
        "Aqueous",
        PhaseKind::Aqueous,
        vec![
            Species::new("H2O(l)")
                .expect("water")
                .with_standard_gibbs_energy(-237_181.0),
            Species::new("Na+")
                .expect("sodium")
                .with_standard_gibbs_energy(-261_881.0),
            Species::new("Cl-")
                .expect("chloride")
                .with_standard_gibbs_energy(-131_290.0),
            Species::new("NaCl(aq)")
                .expect("ion pair")
                .with_standard_gibbs_energy(-388_735.0),
        ],
    );
    Arc::new(builder.build().expect("saline system should build"))
}

/// n = [1, 0.001, 0.001, 0] mol.
pub fn saline_state(system: &Arc<ChemicalSystem>) -> ChemicalState {
    let mut state = ChemicalState::new(system.clone());
    for (name, amount) in [("H2O(l)", 1.0), ("Na+", 0.001), ("Cl-", 0.001), ("NaCl(aq)", 0.0)] {
        state
            .set_species_amount(name, amount)
            .expect("amount should be accepted");
    }
    state
}

/// Na+ + Cl- = NaCl(aq) by mass action.
pub fn association(system: &Arc<ChemicalSystem>) -> ReactionSystem {
    let reaction = Reaction::new(
        system,
        "NaCl association",
        &[("Na+", -1.0), ("Cl-", -1.0), ("NaCl(aq)", 1.0)],
        MassActionRate {
            forward: 0.01,
            backward: 0.001,
        },
    )
    .expect("association reaction");
    ReactionSystem::new(system.clone(), vec![reaction]).expect("balanced reaction")
}

/// Aqueous water autoprotolysis with calcite in its own mineral phase.
pub fn calcite_system() -> Arc<ChemicalSystem> {
    let mut builder = ChemicalSystem::builder();
    builder.add_phase(
        "Aqueous",
        PhaseKind::Aqueous,
        vec![
            Species::new("H2O(l)")
                .expect("water")
                .with_standard_gibbs_energy(-237_181.0),
            Species::new("H+").expect("hydron"),
            Species::new("OH-")
                .expect("hydroxide")
                .with_standard_gibbs_energy(-157_220.0),
            Species::new("Ca+2")
                .expect("calcium")
                .with_standard_gibbs_energy(-552_790.0),
            Species::new("CO3-2")
                .expect("carbonate")
                .with_standard_gibbs_energy(-527_980.0),
        ],
    );
    builder.add_phase(
        "Calcite",
        PhaseKind::Mineral,
        vec![
            Species::new("CaCO3")
                .expect("calcite")
                .with_standard_gibbs_energy(-1_129_100.0)
                .with_molar_volume(3.693e-5),
        ],
    );
    Arc::new(builder.build().expect("calcite system should build"))
}

/// CaCO3 = Ca+2 + CO3-2 with a transition-state rate.
pub fn calcite_dissolution(system: &Arc<ChemicalSystem>) -> ReactionSystem {
    let reaction = Reaction::new(
        system,
        "calcite dissolution",
        &[("CaCO3", -1.0), ("Ca+2", 1.0), ("CO3-2", 1.0)],
        TransitionStateRate { k: 1e-6, area: 1.0 },
    )
    .expect("dissolution reaction");
    ReactionSystem::new(system.clone(), vec![reaction]).expect("balanced reaction")
}
