//! Aqueous equilibrium end-to-end: composition to problem to state.

use std::sync::Arc;

use kf_chem::{ChemicalState, ChemicalSystem, Partition, PhaseKind, Species, extract};
use kf_core::constants::GAS_CONSTANT;
use kf_equilibrium::{ChemicalComposition, EquilibriumOptions, EquilibriumSolver, solve_problem};

const G_WATER: f64 = -237_181.0;
const G_HYDROXIDE: f64 = -157_220.0;

fn system() -> Arc<ChemicalSystem> {
    let mut builder = ChemicalSystem::builder();
    builder.add_phase(
        "Aqueous",
        PhaseKind::Aqueous,
        vec![
            Species::new("H2O(l)")
                .expect("water")
                .with_standard_gibbs_energy(G_WATER),
            Species::new("H+").expect("hydron"),
            Species::new("OH-")
                .expect("hydroxide")
                .with_standard_gibbs_energy(G_HYDROXIDE),
            Species::new("Na+")
                .expect("sodium")
                .with_standard_gibbs_energy(-261_881.0),
            Species::new("Cl-")
                .expect("chloride")
                .with_standard_gibbs_energy(-131_290.0),
        ],
    );
    Arc::new(builder.build().expect("system"))
}

#[test]
fn ion_product_of_water_matches_equilibrium_constant() {
    let mut composition = ChemicalComposition::new(system());
    composition
        .set_aqueous_fluid("0.5 molal NaCl")
        .expect("aqueous fluid");
    let problem = composition.to_equilibrium_problem().expect("problem");
    let state = solve_problem(&problem).expect("equilibrium");

    let a_h = extract(&state, "a[H+]").expect("a(H+)");
    let a_oh = extract(&state, "a[OH-]").expect("a(OH-)");
    let a_w = extract(&state, "a[H2O(l)]").expect("a(H2O)");
    let ln_k = -(G_HYDROXIDE - G_WATER) / (GAS_CONSTANT * 298.15);
    let ln_q = (a_h * a_oh / a_w).ln();
    assert!((ln_q - ln_k).abs() < 1e-6, "ln Q = {ln_q}, ln K = {ln_k}");

    let m_na = extract(&state, "m[Na+]").expect("molality");
    assert!((m_na - 0.5).abs() < 1e-6, "m(Na+) = {m_na}");
}

#[test]
fn re_equilibration_after_adding_acid_lowers_ph() {
    let system = system();
    let mut state = ChemicalState::new(system.clone());
    state.set_species_amount("H2O(l)", 55.508).expect("water");
    let solver = EquilibriumSolver::new(system.clone());
    solver.equilibrate_state(&mut state).expect("neutral water");
    let ph_neutral = extract(&state, "pH").expect("pH");

    state.set_species_amount("H+", 1e-3).expect("acid");
    state.set_species_amount("Cl-", 1e-3).expect("counter ion");
    solver.equilibrate_state(&mut state).expect("acidic water");
    let ph_acid = extract(&state, "pH").expect("pH");

    assert!((ph_neutral - 7.0).abs() < 0.05);
    assert!((ph_acid - 3.0).abs() < 0.05, "pH = {ph_acid}");
}

#[test]
fn inert_species_are_untouched() {
    let system = system();
    let mut solver = EquilibriumSolver::new(system.clone());
    solver
        .set_partition(Partition::all_equilibrium_except(&system, &[], &[3, 4]).expect("partition"))
        .expect("set partition");
    solver
        .set_options(EquilibriumOptions {
            tolerance: 1e-12,
            ..Default::default()
        })
        .expect("options");

    let mut state = ChemicalState::new(system);
    for (name, amount) in [("H2O(l)", 55.508), ("Na+", 0.3), ("Cl-", 0.3)] {
        state.set_species_amount(name, amount).expect("amount");
    }
    solver.equilibrate_state(&mut state).expect("equilibrate");

    assert_eq!(state.species_amount("Na+").expect("Na+"), 0.3);
    assert_eq!(state.species_amount("Cl-").expect("Cl-"), 0.3);
    assert!(state.species_amount("OH-").expect("OH-") > 0.0);
}
