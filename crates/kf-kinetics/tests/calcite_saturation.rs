//! Calcite dissolving towards saturation in water at equilibrium.

mod common;

use common::{calcite_dissolution, calcite_system};
use kf_chem::{ChemicalState, extract};
use kf_kinetics::{KineticOptions, KineticSolver};

fn initial_state() -> ChemicalState {
    let mut state = ChemicalState::new(calcite_system());
    for (name, amount) in [
        ("H2O(l)", 55.508),
        ("H+", 1e-7),
        ("OH-", 1e-7),
        ("CaCO3", 1.0),
    ] {
        state
            .set_species_amount(name, amount)
            .expect("amount should be accepted");
    }
    state
}

fn saturation_ratio(solver: &KineticSolver, state: &ChemicalState) -> f64 {
    let t = state.temperature().value;
    let p = state.pressure().value;
    let ln_k = solver
        .reactions()
        .ln_equilibrium_constants(t, p)
        .expect("ln K")[0];
    let a_ca = extract(state, "a[Ca+2]").expect("a[Ca+2]");
    let a_co3 = extract(state, "a[CO3-2]").expect("a[CO3-2]");
    a_ca * a_co3 / ln_k.exp()
}

fn solver() -> KineticSolver {
    let system = calcite_system();
    let mut solver = KineticSolver::new(calcite_dissolution(&system));
    solver
        .set_partition_str("kinetic = CaCO3 Ca+2 CO3-2")
        .expect("descriptor should resolve");
    solver
}

#[test]
fn dissolution_stops_at_saturation() {
    let mut solver = solver();
    let mut state = initial_state();
    solver.initialize(&mut state, 0.0).expect("initialize");
    assert_eq!(saturation_ratio(&solver, &state), 0.0);

    let b0 = state.element_amounts();
    solver.solve(&mut state, 0.0, 2000.0, 20.0).expect("solve");

    let omega = saturation_ratio(&solver, &state);
    assert!((omega - 1.0).abs() < 1e-6, "omega = {omega}");

    let calcium = state.species_amount("Ca+2").expect("Ca+2");
    let carbonate = state.species_amount("CO3-2").expect("CO3-2");
    assert!(calcium > 1e-5 && calcium < 1e-3, "Ca+2 = {calcium}");
    assert!((calcium - carbonate).abs() < 1e-15);

    let b1 = state.element_amounts();
    for j in 0..b0.len() {
        assert!(
            (b1[j] - b0[j]).abs() <= 1e-8 * b0[j].abs().max(1.0),
            "element {j}: {} -> {}",
            b0[j],
            b1[j]
        );
    }
    assert!((state.species_amount("CaCO3").expect("CaCO3") + calcium - 1.0).abs() < 1e-12);
}

#[test]
fn water_stays_neutral_while_calcite_dissolves() {
    let mut solver = solver();
    let mut state = initial_state();
    solver.initialize(&mut state, 0.0).expect("initialize");
    let ph0 = extract(&state, "pH").expect("pH");
    assert!((ph0 - 7.0).abs() < 0.05, "pH = {ph0}");

    solver.solve(&mut state, 0.0, 100.0, 10.0).expect("solve");
    let ph = extract(&state, "pH").expect("pH");
    assert!((ph - ph0).abs() < 1e-4, "pH moved from {ph0} to {ph}");
    assert!(state.element_potentials().iter().all(|y| y.is_finite()));
}

#[test]
fn adaptive_steps_approach_saturation_from_below() {
    let mut solver = solver();
    solver
        .set_options(KineticOptions {
            initial_step: 1.0,
            max_step: 100.0,
            ..Default::default()
        })
        .expect("options");
    let mut state = initial_state();
    solver.initialize(&mut state, 0.0).expect("initialize");

    let mut t = 0.0;
    let mut previous = 0.0;
    while t < 300.0 {
        solver.step(&mut state, &mut t).expect("adaptive step");
        let omega = saturation_ratio(&solver, &state);
        assert!(omega >= previous - 1e-9, "omega decreased: {previous} -> {omega}");
        assert!(omega <= 1.0 + 1e-6, "overshoot: {omega}");
        previous = omega;
    }
    let stats = solver.stats();
    assert!(stats.accepted_steps > 3);
    assert!(stats.last_step <= 100.0);
    assert!(previous > 0.5);
}
