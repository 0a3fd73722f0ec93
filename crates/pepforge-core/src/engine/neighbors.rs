use super::error::EngineError;
use crate::core::models::molecule::Molecule;

/// Atoms bonded to one atom, in bond-table order.
///
/// `ids` and `types` are parallel. A pair joined by two bond records shows up
/// twice; nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub ids: Vec<usize>,
    pub types: Vec<String>,
}

impl Neighbors {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn count_of(&self, atom_type: &str) -> usize {
        self.types.iter().filter(|t| *t == atom_type).count()
    }

    /// Ids of neighbors carrying `atom_type`, in order.
    pub fn ids_of(&self, atom_type: &str) -> Vec<usize> {
        self.iter()
            .filter(|(_, t)| *t == atom_type)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn first_of(&self, atom_type: &str) -> Option<usize> {
        self.iter().find(|(_, t)| *t == atom_type).map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.ids
            .iter()
            .copied()
            .zip(self.types.iter().map(String::as_str))
    }
}

/// Collects the bonded neighbors of `atom_id`.
///
/// # Errors
///
/// Returns [`EngineError::AtomNotFound`] if `atom_id` is not in the atom
/// table, or [`EngineError::UnresolvedAtomReference`] if a bond leads to an
/// atom that is missing.
pub fn neighbors(molecule: &Molecule, atom_id: usize) -> Result<Neighbors, EngineError> {
    if molecule.atom(atom_id).is_none() {
        return Err(EngineError::AtomNotFound { atom_id });
    }

    let mut result = Neighbors::default();
    for bond in molecule.bonds() {
        let Some(other) = bond.partner(atom_id) else {
            continue;
        };
        let atom = molecule
            .atom(other)
            .ok_or(EngineError::UnresolvedAtomReference {
                bond_id: bond.id,
                atom_id: other,
            })?;
        result.ids.push(other);
        result.types.push(atom.atom_type.clone());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::{Bond, BondType};
    use nalgebra::Point3;

    fn create_carboxyl_fragment() -> Molecule {
        let origin = Point3::origin();
        let atoms = vec![
            Atom::new(1, "CA", "C.3", origin),
            Atom::new(2, "C", "C.2", origin),
            Atom::new(3, "O", "O.co2", origin),
            Atom::new(4, "OXT", "O.co2", origin),
        ];
        let bonds = vec![
            Bond::new(1, 1, 2, BondType::Single),
            Bond::new(2, 2, 3, BondType::Aromatic),
            Bond::new(3, 4, 2, BondType::Aromatic),
            Bond::new(4, 2, 3, BondType::Aromatic),
        ];
        Molecule::from_tables(atoms, bonds)
    }

    #[test]
    fn neighbors_follow_bond_order_in_both_directions() {
        let molecule = create_carboxyl_fragment();
        let n = neighbors(&molecule, 2).unwrap();
        assert_eq!(n.ids, vec![1, 3, 4, 3]);
        assert_eq!(n.types, vec!["C.3", "O.co2", "O.co2", "O.co2"]);
    }

    #[test]
    fn parallel_records_are_not_deduplicated() {
        let molecule = create_carboxyl_fragment();
        let n = neighbors(&molecule, 3).unwrap();
        assert_eq!(n.ids, vec![2, 2]);
        assert_eq!(n.count_of("C.2"), 2);
    }

    #[test]
    fn type_helpers_filter_in_order() {
        let molecule = create_carboxyl_fragment();
        let n = neighbors(&molecule, 2).unwrap();
        assert_eq!(n.count_of("O.co2"), 3);
        assert_eq!(n.ids_of("O.co2"), vec![3, 4, 3]);
        assert_eq!(n.first_of("C.3"), Some(1));
        assert_eq!(n.first_of("N.3"), None);
        assert_eq!(n.len(), 4);
    }

    #[test]
    fn isolated_atom_has_no_neighbors() {
        let molecule = Molecule::from_tables(vec![Atom::new(7, "X", "H", Point3::origin())], vec![]);
        assert!(neighbors(&molecule, 7).unwrap().is_empty());
    }

    #[test]
    fn missing_atom_is_reported() {
        let molecule = create_carboxyl_fragment();
        assert!(matches!(
            neighbors(&molecule, 99),
            Err(EngineError::AtomNotFound { atom_id: 99 })
        ));
    }

    #[test]
    fn dangling_bond_endpoint_is_reported() {
        let (atoms, mut bonds) = create_carboxyl_fragment().into_tables();
        bonds.push(Bond::new(5, 2, 42, BondType::Single));
        let molecule = Molecule::from_tables(atoms, bonds);
        assert!(matches!(
            neighbors(&molecule, 2),
            Err(EngineError::UnresolvedAtomReference {
                bond_id: 5,
                atom_id: 42
            })
        ));
    }
}
