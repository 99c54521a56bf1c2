//! Immutable chemical system: elements, species, phases, formula matrix and
//! the thermodynamic property model evaluated over them.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::element::Element;
use crate::error::{ChemError, ChemResult};
use crate::ideal::IdealModel;
use crate::model::{ChemicalVector, ThermoModel};
use crate::phase::{Phase, PhaseKind};
use crate::species::Species;

/// Reference to a species/element/phase either by position or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for Key<'_> {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(name: &'a String) -> Self {
        Key::Name(name.as_str())
    }
}

/// Builder for constructing a chemical system phase by phase.
///
/// Species of each phase occupy a contiguous index range in the order
/// phases are added.
#[derive(Debug, Default)]
pub struct ChemicalSystemBuilder {
    phases: Vec<(String, PhaseKind, Vec<Species>)>,
}

impl ChemicalSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phase and return its index.
    pub fn add_phase(
        &mut self,
        name: impl Into<String>,
        kind: PhaseKind,
        species: Vec<Species>,
    ) -> usize {
        self.phases.push((name.into(), kind, species));
        self.phases.len() - 1
    }

    /// Build with the ideal property model.
    pub fn build(self) -> ChemResult<ChemicalSystem> {
        self.build_with(Arc::new(IdealModel))
    }

    /// Build with a custom property model.
    pub fn build_with(self, model: Arc<dyn ThermoModel>) -> ChemResult<ChemicalSystem> {
        let mut phases = Vec::with_capacity(self.phases.len());
        let mut species: Vec<Species> = Vec::new();
        let mut phase_names = HashSet::new();

        for (name, kind, members) in self.phases {
            if members.is_empty() {
                return Err(ChemError::validation(format!("phase '{name}' has no species")));
            }
            if !phase_names.insert(name.clone()) {
                return Err(ChemError::validation(format!("duplicate phase '{name}'")));
            }
            phases.push(Phase {
                name,
                kind,
                first_species: species.len(),
                num_species: members.len(),
            });
            species.extend(members);
        }

        if species.is_empty() {
            return Err(ChemError::validation("chemical system has no species"));
        }

        let mut species_names = HashSet::new();
        for s in &species {
            if !species_names.insert(s.name()) {
                return Err(ChemError::validation(format!(
                    "duplicate species '{}'",
                    s.name()
                )));
            }
        }

        // Elements in order of first appearance, charge last.
        let mut elements: Vec<Element> = Vec::new();
        for s in &species {
            for (symbol, _) in s.elements() {
                if !elements.iter().any(|e| e.symbol() == symbol) {
                    elements.push(Element::lookup(symbol)?);
                }
            }
        }
        if species.iter().any(|s| s.charge() != 0.0) {
            elements.push(Element::charge());
        }

        let formula_matrix = DMatrix::from_fn(elements.len(), species.len(), |j, i| {
            species[i].element_coefficient(elements[j].symbol())
        });
        let molar_masses = DVector::from_iterator(species.len(), species.iter().map(|s| s.molar_mass()));

        Ok(ChemicalSystem {
            elements,
            species,
            phases,
            formula_matrix,
            molar_masses,
            model,
        })
    }
}

/// Elements, species and phases of a chemical system plus its property model.
///
/// Immutable once built; shared between states through `Arc`.
pub struct ChemicalSystem {
    elements: Vec<Element>,
    species: Vec<Species>,
    phases: Vec<Phase>,
    formula_matrix: DMatrix<f64>,
    molar_masses: DVector<f64>,
    model: Arc<dyn ThermoModel>,
}

impl fmt::Debug for ChemicalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChemicalSystem")
            .field("elements", &self.elements)
            .field("species", &self.species.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("phases", &self.phases)
            .field("model", &self.model.name())
            .finish()
    }
}

impl ChemicalSystem {
    pub fn builder() -> ChemicalSystemBuilder {
        ChemicalSystemBuilder::new()
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn model(&self) -> &dyn ThermoModel {
        self.model.as_ref()
    }

    /// Formula matrix `A` (elements × species); the charge row is last when present.
    pub fn formula_matrix(&self) -> &DMatrix<f64> {
        &self.formula_matrix
    }

    /// Species molar masses [kg/mol].
    pub fn molar_masses(&self) -> &DVector<f64> {
        &self.molar_masses
    }

    pub fn index_species(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.name() == name)
    }

    pub fn index_element(&self, symbol: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.symbol() == symbol)
    }

    pub fn index_phase(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name() == name)
    }

    /// Resolve a species key, checking bounds for indices.
    pub fn resolve_species<'a>(&self, key: impl Into<Key<'a>>) -> ChemResult<usize> {
        resolve(key.into(), self.num_species(), "species", |n| self.index_species(n))
    }

    pub fn resolve_element<'a>(&self, key: impl Into<Key<'a>>) -> ChemResult<usize> {
        resolve(key.into(), self.num_elements(), "element", |n| self.index_element(n))
    }

    pub fn resolve_phase<'a>(&self, key: impl Into<Key<'a>>) -> ChemResult<usize> {
        resolve(key.into(), self.num_phases(), "phase", |n| self.index_phase(n))
    }

    /// Species index range of phase `iphase`.
    pub fn phase_species_range(&self, iphase: usize) -> ChemResult<Range<usize>> {
        self.phases
            .get(iphase)
            .map(Phase::species_range)
            .ok_or(ChemError::IndexOob {
                what: "phase",
                index: iphase,
                len: self.num_phases(),
            })
    }

    /// Index of the phase containing species `ispecies`.
    pub fn phase_of_species(&self, ispecies: usize) -> Option<usize> {
        self.phases
            .iter()
            .position(|p| p.species_range().contains(&ispecies))
    }

    /// Whether `other` describes the same species and elements.
    pub fn is_compatible(&self, other: &ChemicalSystem) -> bool {
        std::ptr::eq(self, other)
            || (self.species.len() == other.species.len()
                && self.elements.len() == other.elements.len()
                && self
                    .species
                    .iter()
                    .zip(&other.species)
                    .all(|(a, b)| a.name() == b.name())
                && self
                    .elements
                    .iter()
                    .zip(&other.elements)
                    .all(|(a, b)| a.symbol() == b.symbol()))
    }

    fn check_amounts(&self, n: &DVector<f64>) -> ChemResult<()> {
        if n.len() != self.num_species() {
            return Err(ChemError::DimensionMismatch {
                what: "species amounts",
                expected: self.num_species(),
                actual: n.len(),
            });
        }
        Ok(())
    }

    /// Element amounts `A n` over all species.
    pub fn element_amounts(&self, n: &DVector<f64>) -> ChemResult<DVector<f64>> {
        self.check_amounts(n)?;
        Ok(&self.formula_matrix * n)
    }

    /// Element amounts contributed by the species of one phase.
    pub fn element_amounts_in_phase(&self, iphase: usize, n: &DVector<f64>) -> ChemResult<DVector<f64>> {
        let range = self.phase_species_range(iphase)?;
        self.element_amounts_in_species(&range.collect::<Vec<_>>(), n)
    }

    /// Element amounts contributed by an arbitrary species subset.
    pub fn element_amounts_in_species(&self, indices: &[usize], n: &DVector<f64>) -> ChemResult<DVector<f64>> {
        self.check_amounts(n)?;
        let mut b = DVector::zeros(self.num_elements());
        for &i in indices {
            if i >= self.num_species() {
                return Err(ChemError::IndexOob {
                    what: "species",
                    index: i,
                    len: self.num_species(),
                });
            }
            b.axpy(n[i], &self.formula_matrix.column(i), 1.0);
        }
        Ok(b)
    }

    /// Standard molar Gibbs energies [J/mol] at (T, P).
    pub fn standard_gibbs_energies(&self, t: f64, p: f64) -> ChemResult<DVector<f64>> {
        self.model.standard_gibbs_energies(self, t, p)
    }

    pub fn ln_activities(&self, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<ChemicalVector> {
        self.check_amounts(n)?;
        self.model.ln_activities(self, t, p, n)
    }

    pub fn activities(&self, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<ChemicalVector> {
        self.check_amounts(n)?;
        self.model.activities(self, t, p, n)
    }

    /// Chemical potentials [J/mol] with composition derivatives.
    pub fn chemical_potentials(&self, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<ChemicalVector> {
        self.check_amounts(n)?;
        self.model.chemical_potentials(self, t, p, n)
    }

    /// Phase volumes [m³].
    pub fn phase_volumes(&self, t: f64, p: f64, n: &DVector<f64>) -> ChemResult<DVector<f64>> {
        self.check_amounts(n)?;
        self.model.phase_volumes(self, t, p, n)
    }
}

fn resolve(
    key: Key<'_>,
    len: usize,
    kind: &'static str,
    find: impl Fn(&str) -> Option<usize>,
) -> ChemResult<usize> {
    match key {
        Key::Index(index) if index < len => Ok(index),
        Key::Index(index) => Err(ChemError::IndexOob {
            what: kind,
            index,
            len,
        }),
        Key::Name(name) => find(name).ok_or_else(|| ChemError::Lookup {
            kind,
            name: name.to_string(),
        }),
    }
}
