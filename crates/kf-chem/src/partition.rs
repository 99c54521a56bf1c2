//! Assignment of species to equilibrium, kinetic and inert roles.

use kf_core::indices::{self, Indices};

use crate::error::{ChemError, ChemResult};
use crate::system::ChemicalSystem;

/// Role a species plays while stepping a kinetic problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Equilibrium,
    Kinetic,
    Inert,
}

/// Three pairwise-disjoint sets of species indices.
///
/// Indices are kept sorted and deduplicated. A species in none of the sets
/// is treated as inert by consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    equilibrium: Indices,
    kinetic: Indices,
    inert: Indices,
}

impl Partition {
    /// Build a partition from explicit index sets, rejecting any index
    /// that appears in more than one set.
    pub fn new(
        equilibrium: impl IntoIterator<Item = usize>,
        kinetic: impl IntoIterator<Item = usize>,
        inert: impl IntoIterator<Item = usize>,
    ) -> ChemResult<Self> {
        let partition = Self {
            equilibrium: indices::normalize(equilibrium),
            kinetic: indices::normalize(kinetic),
            inert: indices::normalize(inert),
        };
        partition.check_disjoint()?;
        Ok(partition)
    }

    pub fn all_equilibrium(system: &ChemicalSystem) -> Self {
        Self {
            equilibrium: indices::range(system.num_species()),
            ..Self::default()
        }
    }

    pub fn all_kinetic(system: &ChemicalSystem) -> Self {
        Self {
            kinetic: indices::range(system.num_species()),
            ..Self::default()
        }
    }

    /// Every species is in equilibrium except the given kinetic and inert ones.
    pub fn all_equilibrium_except(
        system: &ChemicalSystem,
        kinetic: &[usize],
        inert: &[usize],
    ) -> ChemResult<Self> {
        check_bounds(system, kinetic)?;
        check_bounds(system, inert)?;
        let equilibrium = indices::difference(
            &indices::range(system.num_species()),
            &indices::unify(kinetic, inert),
        );
        Self::new(equilibrium, kinetic.iter().copied(), inert.iter().copied())
    }

    /// Every species is kinetic except the given equilibrium and inert ones.
    pub fn all_kinetic_except(
        system: &ChemicalSystem,
        equilibrium: &[usize],
        inert: &[usize],
    ) -> ChemResult<Self> {
        check_bounds(system, equilibrium)?;
        check_bounds(system, inert)?;
        let kinetic = indices::difference(
            &indices::range(system.num_species()),
            &indices::unify(equilibrium, inert),
        );
        Self::new(equilibrium.iter().copied(), kinetic, inert.iter().copied())
    }

    /// Parse a descriptor such as `"kinetic = Na+ Cl- NaCl(aq); inert = Quartz"`.
    ///
    /// Clauses are `role = species...` separated by `;`. If only kinetic
    /// and/or inert species are named, all remaining species are equilibrium.
    /// If equilibrium species are named without kinetic ones, all remaining
    /// species are kinetic. If both are named the sets are used as given.
    pub fn parse(system: &ChemicalSystem, descriptor: &str) -> ChemResult<Self> {
        let mut equilibrium = None::<Vec<usize>>;
        let mut kinetic = None::<Vec<usize>>;
        let mut inert = Vec::new();

        for clause in descriptor.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let (role, names) = clause.split_once('=').ok_or_else(|| {
                ChemError::validation(format!(
                    "partition clause '{clause}' must have the form 'role = species...'"
                ))
            })?;
            let resolved = names
                .split_whitespace()
                .map(|name| system.resolve_species(name))
                .collect::<ChemResult<Vec<_>>>()?;
            match role.trim().to_lowercase().as_str() {
                "equilibrium" => equilibrium.get_or_insert_with(Vec::new).extend(resolved),
                "kinetic" => kinetic.get_or_insert_with(Vec::new).extend(resolved),
                "inert" => inert.extend(resolved),
                other => {
                    return Err(ChemError::validation(format!(
                        "unknown partition role '{other}' (expected equilibrium, kinetic or inert)"
                    )));
                }
            }
        }

        match (equilibrium, kinetic) {
            (Some(eq), Some(kin)) => Self::new(eq, kin, inert),
            (Some(eq), None) => Self::all_kinetic_except(system, &eq, &inert),
            (None, kin) => Self::all_equilibrium_except(system, &kin.unwrap_or_default(), &inert),
        }
    }

    pub fn equilibrium(&self) -> &[usize] {
        &self.equilibrium
    }

    pub fn kinetic(&self) -> &[usize] {
        &self.kinetic
    }

    pub fn inert(&self) -> &[usize] {
        &self.inert
    }

    /// Role of species `i`, or `None` if it is in no set.
    pub fn role_of(&self, i: usize) -> Option<Role> {
        if self.equilibrium.binary_search(&i).is_ok() {
            Some(Role::Equilibrium)
        } else if self.kinetic.binary_search(&i).is_ok() {
            Some(Role::Kinetic)
        } else if self.inert.binary_search(&i).is_ok() {
            Some(Role::Inert)
        } else {
            None
        }
    }

    /// Species of a system with `num_species` species that belong to no set.
    pub fn unassigned(&self, num_species: usize) -> Indices {
        let assigned = indices::unify(&indices::unify(&self.equilibrium, &self.kinetic), &self.inert);
        indices::difference(&indices::range(num_species), &assigned)
    }

    /// Check every index is in range for `system`.
    pub fn validate_for(&self, system: &ChemicalSystem) -> ChemResult<()> {
        check_bounds(system, &self.equilibrium)?;
        check_bounds(system, &self.kinetic)?;
        check_bounds(system, &self.inert)
    }

    fn check_disjoint(&self) -> ChemResult<()> {
        let pairs = [
            ("equilibrium", &self.equilibrium, "kinetic", &self.kinetic),
            ("equilibrium", &self.equilibrium, "inert", &self.inert),
            ("kinetic", &self.kinetic, "inert", &self.inert),
        ];
        for (a_name, a, b_name, b) in pairs {
            if let Some(&i) = indices::intersect(a, b).first() {
                return Err(ChemError::validation(format!(
                    "species index {i} is both {a_name} and {b_name}"
                )));
            }
        }
        Ok(())
    }
}

fn check_bounds(system: &ChemicalSystem, indices: &[usize]) -> ChemResult<()> {
    let len = system.num_species();
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(ChemError::IndexOob {
            what: "species",
            index,
            len,
        }),
        None => Ok(()),
    }
}
