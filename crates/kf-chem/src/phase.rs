//! Phases: homogeneous regions owning a contiguous range of species.

use std::ops::Range;

/// Activity convention family of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Aqueous electrolyte: solvent `H2O(l)` on mole fraction, solutes on molality.
    Aqueous,
    /// Gas mixture: activity = x·P/P°.
    Gaseous,
    /// Non-aqueous liquid solution: activity = x.
    Liquid,
    /// Solid phase: unit activity when pure, x for solid solutions.
    Mineral,
}

/// Phase metadata as stored in a chemical system.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub(crate) name: String,
    pub(crate) kind: PhaseKind,
    pub(crate) first_species: usize,
    pub(crate) num_species: usize,
}

impl Phase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    /// Index of the first species of this phase in the system.
    pub fn first_species(&self) -> usize {
        self.first_species
    }

    pub fn num_species(&self) -> usize {
        self.num_species
    }

    /// System-level species indices belonging to this phase.
    pub fn species_range(&self) -> Range<usize> {
        self.first_species..self.first_species + self.num_species
    }
}
