use super::editor::{collapse_parallel_bond, renumber};
use super::error::EngineError;
use super::neighbors::neighbors;
use super::templates::Context;
use crate::core::models::molecule::Molecule;
use crate::core::utils::identifiers::{
    CARBONYL_OXYGEN_TYPE, CARBOXYLATE_OXYGEN_TYPE, HYDROXYL_OXYGEN_TYPE,
};
use tracing::{debug, info, instrument};

const CARBONYL_OXYGEN_NAME: &str = "OXT";
const HYDROXYL_OXYGEN_NAME: &str = "O";

/// Outcome of [`resolve_carboxylate`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub molecule: Molecule,
    /// The oxygen retyped to `O.2`, if any.
    pub carbonyl_oxygen: Option<usize>,
    /// The oxygen retyped to `O.3`, if any.
    pub hydroxyl_oxygen: Option<usize>,
    /// Ids (before renumbering) of the duplicate bond records that were dropped.
    pub collapsed_bonds: Vec<usize>,
}

impl Resolution {
    pub fn resolved_oxygens(&self) -> Vec<usize> {
        self.carbonyl_oxygen
            .into_iter()
            .chain(self.hydroxyl_oxygen)
            .collect()
    }

    pub fn changed(&self) -> bool {
        self.carbonyl_oxygen.is_some() || self.hydroxyl_oxygen.is_some()
    }
}

/// True when `carbon_id` carries at least two `O.co2` neighbor entries.
pub fn needs_resolution(molecule: &Molecule, carbon_id: usize) -> Result<bool, EngineError> {
    Ok(neighbors(molecule, carbon_id)?.count_of(CARBOXYLATE_OXYGEN_TYPE) >= 2)
}

/// Rewrites the delocalized `O.co2` pair of a carboxyl carbon into an explicit
/// `O.2` / `O.3` pair.
///
/// The first `O.co2` neighbor becomes `O.2` named `OXT`. When the residue has
/// a free carboxylate the next one becomes `O.3` named `O`; otherwise it is
/// left alone. An oxygen whose only two neighbor entries are both the carbon
/// is joined by a duplicate record, which is collapsed before retyping.
///
/// A carbon with fewer than two `O.co2` entries is returned unchanged.
#[instrument(skip_all, name = "resolve_carboxylate", fields(carbon_id = carbon_id, context = %context))]
pub fn resolve_carboxylate(
    molecule: Molecule,
    carbon_id: usize,
    context: Context,
) -> Result<Resolution, EngineError> {
    let mut resolution = Resolution {
        molecule,
        carbonyl_oxygen: None,
        hydroxyl_oxygen: None,
        collapsed_bonds: Vec::new(),
    };
    if !needs_resolution(&resolution.molecule, carbon_id)? {
        debug!("Carbon has no delocalized carboxylate; nothing to resolve.");
        return Ok(resolution);
    }

    let steps: &[(&str, &str)] = if context.has_free_carboxylate() {
        &[
            (CARBONYL_OXYGEN_TYPE, CARBONYL_OXYGEN_NAME),
            (HYDROXYL_OXYGEN_TYPE, HYDROXYL_OXYGEN_NAME),
        ]
    } else {
        &[(CARBONYL_OXYGEN_TYPE, CARBONYL_OXYGEN_NAME)]
    };

    for (new_type, new_name) in steps {
        let Some(oxygen_id) =
            neighbors(&resolution.molecule, carbon_id)?.first_of(CARBOXYLATE_OXYGEN_TYPE)
        else {
            break;
        };

        let oxygen_neighbors = neighbors(&resolution.molecule, oxygen_id)?;
        if oxygen_neighbors.len() == 2 && oxygen_neighbors.ids.iter().all(|id| *id == carbon_id) {
            let (collapsed, removed) =
                collapse_parallel_bond(resolution.molecule, carbon_id, oxygen_id);
            resolution.molecule = collapsed;
            resolution.collapsed_bonds.extend(removed);
        }

        let oxygen = resolution
            .molecule
            .atom_mut(oxygen_id)
            .ok_or(EngineError::AtomNotFound { atom_id: oxygen_id })?;
        oxygen.atom_type = new_type.to_string();
        oxygen.name = new_name.to_string();
        debug!(oxygen_id, atom_type = new_type, "Retyped carboxylate oxygen.");

        if *new_type == CARBONYL_OXYGEN_TYPE {
            resolution.carbonyl_oxygen = Some(oxygen_id);
        } else {
            resolution.hydroxyl_oxygen = Some(oxygen_id);
        }
    }

    if !resolution.collapsed_bonds.is_empty() {
        // Only bond records were removed, so atom ids are unchanged.
        let (renumbered, _) = renumber(resolution.molecule)?;
        resolution.molecule = renumbered;
    }

    info!(
        carbonyl = ?resolution.carbonyl_oxygen,
        hydroxyl = ?resolution.hydroxyl_oxygen,
        collapsed = resolution.collapsed_bonds.len(),
        "Resolved carboxylate."
    );
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::{Bond, BondType};
    use crate::engine::editor::{parallel_bond_groups, validate_references};
    use nalgebra::Point3;

    fn create_carboxylate(with_duplicate: bool) -> Molecule {
        let origin = Point3::origin();
        let atoms = vec![
            Atom::new(1, "CA", "C.3", origin),
            Atom::new(2, "C", "C.2", origin),
            Atom::new(3, "O", "O.co2", origin),
            Atom::new(4, "OXT", "O.co2", origin),
        ];
        let mut bonds = vec![
            Bond::new(1, 1, 2, BondType::Single),
            Bond::new(2, 2, 3, BondType::Aromatic),
            Bond::new(3, 2, 4, BondType::Aromatic),
        ];
        if with_duplicate {
            bonds.push(Bond::new(4, 3, 2, BondType::Aromatic));
        }
        Molecule::from_tables(atoms, bonds)
    }

    #[test]
    fn free_carboxylate_is_split_into_carbonyl_and_hydroxyl() {
        let resolution =
            resolve_carboxylate(create_carboxylate(false), 2, Context::Individual).unwrap();
        assert_eq!(resolution.carbonyl_oxygen, Some(3));
        assert_eq!(resolution.hydroxyl_oxygen, Some(4));
        assert!(resolution.collapsed_bonds.is_empty());

        let first = resolution.molecule.atom(3).unwrap();
        assert_eq!((first.atom_type.as_str(), first.name.as_str()), ("O.2", "OXT"));
        let second = resolution.molecule.atom(4).unwrap();
        assert_eq!((second.atom_type.as_str(), second.name.as_str()), ("O.3", "O"));
        assert_eq!(resolution.resolved_oxygens(), vec![3, 4]);
    }

    #[test]
    fn duplicate_record_is_collapsed_and_bonds_renumbered() {
        let resolution =
            resolve_carboxylate(create_carboxylate(true), 2, Context::CTerminus).unwrap();
        assert_eq!(resolution.collapsed_bonds, vec![4]);
        assert!(parallel_bond_groups(&resolution.molecule).is_empty());
        assert_eq!(resolution.molecule.bonds().len(), 3);
        assert_eq!(resolution.molecule.max_bond_id(), 3);
        validate_references(&resolution.molecule).unwrap();

        let types = neighbors(&resolution.molecule, 2).unwrap().types;
        assert_eq!(types, vec!["C.3", "O.2", "O.3"]);
    }

    #[test]
    fn linked_carbonyl_only_gets_one_rewrite() {
        let resolution =
            resolve_carboxylate(create_carboxylate(false), 2, Context::AmideLinked).unwrap();
        assert_eq!(resolution.carbonyl_oxygen, Some(3));
        assert_eq!(resolution.hydroxyl_oxygen, None);
        assert_eq!(resolution.molecule.atom(4).unwrap().atom_type, "O.co2");
    }

    #[test]
    fn carbon_without_carboxylate_is_untouched() {
        let molecule = create_carboxylate(false);
        let resolution = resolve_carboxylate(molecule.clone(), 1, Context::Individual).unwrap();
        assert!(!resolution.changed());
        assert_eq!(resolution.molecule, molecule);
    }

    #[test]
    fn needs_resolution_counts_duplicate_entries() {
        let (atoms, mut bonds) = create_carboxylate(false).into_tables();
        bonds.retain(|b| b.id != 3);
        bonds.push(Bond::new(5, 2, 3, BondType::Aromatic));
        let molecule = Molecule::from_tables(atoms, bonds);
        assert!(needs_resolution(&molecule, 2).unwrap());
        assert!(!needs_resolution(&molecule, 1).unwrap());
    }

    #[test]
    fn missing_carbon_is_an_error() {
        assert!(matches!(
            resolve_carboxylate(create_carboxylate(false), 9, Context::Individual),
            Err(EngineError::AtomNotFound { atom_id: 9 })
        ));
    }
}
