//! Fixed-width diagnostic table of a chemical state.

use std::fmt::{self, Write};

use nalgebra::DVector;

use crate::error::ChemResult;
use crate::state::ChemicalState;

const INDEX_WIDTH: usize = 10;
const COLUMN_WIDTH: usize = 20;

/// Render one row per species with its amount, activity, standard Gibbs
/// energy and chemical potential at the current (T, P, n).
pub fn format_table(state: &ChemicalState) -> ChemResult<String> {
    let system = state.system();
    let t = state.temperature().value;
    let p = state.pressure().value;
    let n = state.species_amounts();
    let activities = system.activities(t, p, n)?;
    let g0 = system.standard_gibbs_energies(t, p)?;
    let mu = system.chemical_potentials(t, p, n)?;
    let rows = Rows {
        names: system.species().iter().map(|s| s.name()).collect(),
        amounts: n,
        activities: &activities.val,
        g0: &g0,
        mu: &mu.val,
    };

    let mut out = String::new();
    rows.write(&mut out)?;
    Ok(out)
}

struct Rows<'a> {
    names: Vec<&'a str>,
    amounts: &'a DVector<f64>,
    activities: &'a DVector<f64>,
    g0: &'a DVector<f64>,
    mu: &'a DVector<f64>,
}

impl Rows<'_> {
    fn write(&self, out: &mut impl Write) -> fmt::Result {
        let rule = "=".repeat(INDEX_WIDTH + 5 * COLUMN_WIDTH);
        writeln!(out, "{rule}")?;
        writeln!(
            out,
            "{:<iw$}{:<cw$}{:<cw$}{:<cw$}{:<cw$}{:<cw$}",
            "Index",
            "Species",
            "Moles",
            "Activity",
            "GibbsEnergy",
            "ChemicalPotential",
            iw = INDEX_WIDTH,
            cw = COLUMN_WIDTH,
        )?;
        writeln!(out, "{rule}")?;
        for (i, name) in self.names.iter().enumerate() {
            writeln!(
                out,
                "{:<iw$}{:<cw$}{:<cw$.6e}{:<cw$.6e}{:<cw$.6e}{:<cw$.6e}",
                i,
                fit(name),
                self.amounts[i],
                self.activities[i],
                self.g0[i],
                self.mu[i],
                iw = INDEX_WIDTH,
                cw = COLUMN_WIDTH,
            )?;
        }
        writeln!(out, "{rule}")
    }
}

/// Clip a name so at least one space separates it from the next column.
fn fit(name: &str) -> &str {
    match name.char_indices().nth(COLUMN_WIDTH - 1) {
        Some((cut, _)) => &name[..cut],
        None => name,
    }
}
