//! End-to-end checks of state mutation and quantity extraction.

mod common;

use kf_chem::{ChemError, extract, format_table, scale_amounts};
use kf_core::units::{k, m3};

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1e-300)
}

#[test]
fn element_balance_follows_species_amounts() {
    let state = common::brine_state();

    let na = extract(&state, "b[Na]").expect("sodium amount");
    assert!(close(na, 1.1, 1e-12), "Na total was {na}");

    let na_aq = extract(&state, "b[Na][Aqueous]").expect("aqueous sodium");
    assert!(close(na_aq, 0.1, 1e-12));

    let charge = extract(&state, "b[Z]").expect("charge balance");
    assert!(charge.abs() < 1e-15, "solution should be neutral, got {charge}");

    let o = state
        .element_amount_in_species("O", &[0, 2, 7])
        .expect("oxygen in water, hydroxide and O2");
    assert!(close(o, 55.508 + 1e-7 + 0.42, 1e-12));
}

#[test]
fn molality_and_ph_of_neutral_brine() {
    let state = common::brine_state();
    let m = extract(&state, "m[Na+]").expect("molality");
    assert!(close(m, 0.1 / (55.508 * 0.018_015_28), 1e-12));

    let ph = extract(&state, "pH").expect("pH");
    let a_h = extract(&state, "a[H+]").expect("activity");
    assert!(close(ph, -a_h.log10(), 1e-14));
    assert!((ph - 7.0).abs() < 0.01, "pH was {ph}");
}

#[test]
fn gas_volume_tracks_temperature() {
    let mut state = common::brine_state();
    let v_cold = state.phase_volumes().expect("volumes")[2];
    state.set_temperature(k(2.0 * 298.15)).expect("temperature");
    let v_hot = state.phase_volumes().expect("volumes")[2];
    assert!(close(v_hot, 2.0 * v_cold, 1e-12));

    state.set_phase_volume("Gaseous", m3(v_cold)).expect("rescale gas");
    let air = extract(&state, "n[N2(g)]").expect("N2") + extract(&state, "n[O2(g)]").expect("O2");
    assert!(close(air, 0.5, 1e-12), "air amount was {air}");
    assert!(close(extract(&state, "n[NaCl]").expect("halite"), 1.0, 1e-15));
}

#[test]
fn failed_mutations_leave_state_unchanged() {
    let mut state = common::brine_state();
    let before = state.species_amounts().clone();

    assert!(matches!(
        state.set_species_amount_in("Na+", 1.0, "K"),
        Err(ChemError::NotAmountOrMass { .. })
    ));
    assert!(state.set_species_amount("NaCl", -0.1).is_err());
    assert!(state.scale_species_amounts_in_phase("Halite", -1.0).is_err());
    assert!(state.set_volume(m3(-1.0)).is_err());
    assert!(matches!(
        extract(&state, "q[Na+]"),
        Err(ChemError::UnsupportedQuantity { .. })
    ));

    assert_eq!(state.species_amounts(), &before);
}

#[test]
fn scaled_copy_and_table() {
    let state = common::brine_state();
    let half = scale_amounts(&state, 0.5).expect("scale");
    assert!(close(
        extract(&half, "n[H2O(l)]").expect("water"),
        0.5 * extract(&state, "n[H2O(l)]").expect("water"),
        1e-15
    ));

    let table = format_table(&half).expect("table");
    assert_eq!(table.lines().count(), 4 + state.system().num_species());
    assert!(table.contains("N2(g)"));
}
