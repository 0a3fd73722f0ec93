use super::atom::{Atom, AtomStatus};
use super::topology::Bond;
use std::collections::BTreeMap;

/// An atom table and a bond table read from, or destined for, a MOL2 file.
///
/// Table order is meaningful: neighbor lists are reported in bond order and
/// insertions happen at explicit positions, so both tables are plain vectors
/// rather than keyed maps. A `Molecule` is a value; engine transforms take one
/// and hand back a new one instead of sharing mutable state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    /// Atom records in file order.
    atoms: Vec<Atom>,
    /// Bond records in file order.
    bonds: Vec<Bond>,
}

impl Molecule {
    /// Creates an empty molecule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a molecule from already-built tables.
    ///
    /// No validation happens here; use
    /// [`validate_references`](crate::engine::editor::validate_references) to check
    /// that every bond endpoint exists.
    pub fn from_tables(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        Self { atoms, bonds }
    }

    /// Splits the molecule back into its atom and bond tables.
    pub fn into_tables(self) -> (Vec<Atom>, Vec<Bond>) {
        (self.atoms, self.bonds)
    }

    /// Returns the atom table in order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Returns the bond table in order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut Vec<Atom> {
        &mut self.atoms
    }

    pub(crate) fn bonds_mut(&mut self) -> &mut Vec<Bond> {
        &mut self.bonds
    }

    /// Retrieves an atom by its serial id.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom id to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the atom exists, otherwise `None`.
    pub fn atom(&self, id: usize) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    /// Retrieves a mutable reference to an atom by its serial id.
    pub fn atom_mut(&mut self, id: usize) -> Option<&mut Atom> {
        self.atoms.iter_mut().find(|a| a.id == id)
    }

    /// Returns the position of an atom in the atom table.
    pub fn atom_index(&self, id: usize) -> Option<usize> {
        self.atoms.iter().position(|a| a.id == id)
    }

    /// Retrieves a bond by its serial id.
    pub fn bond(&self, id: usize) -> Option<&Bond> {
        self.bonds.iter().find(|b| b.id == id)
    }

    /// Returns the position of the first bond record joining `a` and `b`.
    pub fn bond_index_between(&self, a: usize, b: usize) -> Option<usize> {
        self.bonds.iter().position(|bond| bond.connects(a, b))
    }

    /// Returns an iterator over the atoms of one substructure, in table order.
    pub fn residue_atoms(&self, subst_id: usize) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(move |a| a.subst_id == subst_id)
    }

    /// Returns the distinct substructure ids in ascending order.
    pub fn substructure_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.atoms.iter().map(|a| a.subst_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Largest atom id, or 0 for an empty table.
    pub fn max_atom_id(&self) -> usize {
        self.atoms.iter().map(|a| a.id).max().unwrap_or(0)
    }

    /// Largest bond id, or 0 for an empty table.
    pub fn max_bond_id(&self) -> usize {
        self.bonds.iter().map(|b| b.id).max().unwrap_or(0)
    }

    /// Groups the ids of all backbone atoms by substructure id.
    ///
    /// This is the view consumed by chain-assembly tooling: read the final atom
    /// table, keep `BACKBONE` atoms, group by residue.
    pub fn backbone_atoms_by_residue(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for atom in self.atoms.iter().filter(|a| a.status == AtomStatus::Backbone) {
            grouped.entry(atom.subst_id).or_default().push(atom.id);
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::BondType;
    use nalgebra::Point3;

    fn create_two_residue_molecule() -> Molecule {
        let atoms = vec![
            Atom::new(1, "N", "N.3", Point3::new(0.0, 0.0, 0.0)).in_substructure(1, "GLY1"),
            Atom::new(2, "CA", "C.3", Point3::new(1.4, 0.0, 0.0)).in_substructure(1, "GLY1"),
            Atom::new(3, "N", "N.am", Point3::new(3.0, 0.0, 0.0)).in_substructure(2, "ALA2"),
        ];
        let bonds = vec![
            Bond::new(1, 1, 2, BondType::Single),
            Bond::new(2, 2, 3, BondType::Single),
        ];
        Molecule::from_tables(atoms, bonds)
    }

    #[test]
    fn atom_lookup_by_id_works() {
        let molecule = create_two_residue_molecule();
        assert_eq!(molecule.atom(2).unwrap().name, "CA");
        assert!(molecule.atom(9).is_none());
        assert_eq!(molecule.atom_index(3), Some(2));
    }

    #[test]
    fn bond_index_between_ignores_direction() {
        let molecule = create_two_residue_molecule();
        assert_eq!(molecule.bond_index_between(3, 2), Some(1));
        assert_eq!(molecule.bond_index_between(1, 3), None);
    }

    #[test]
    fn residue_atoms_filters_by_substructure() {
        let molecule = create_two_residue_molecule();
        let ids: Vec<usize> = molecule.residue_atoms(1).map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(molecule.substructure_ids(), vec![1, 2]);
    }

    #[test]
    fn max_ids_are_zero_for_empty_molecule() {
        let molecule = Molecule::new();
        assert_eq!(molecule.max_atom_id(), 0);
        assert_eq!(molecule.max_bond_id(), 0);
    }

    #[test]
    fn backbone_atoms_are_grouped_by_residue() {
        let mut molecule = create_two_residue_molecule();
        molecule.atom_mut(1).unwrap().status = AtomStatus::Backbone;
        molecule.atom_mut(3).unwrap().status = AtomStatus::Backbone;

        let grouped = molecule.backbone_atoms_by_residue();
        assert_eq!(grouped.get(&1), Some(&vec![1]));
        assert_eq!(grouped.get(&2), Some(&vec![3]));
    }
}
