use super::error::EngineError;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondType};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Old-to-new id assignments produced by [`renumber`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    pub atoms: BTreeMap<usize, usize>,
    pub bonds: BTreeMap<usize, usize>,
}

impl IdMap {
    pub fn atom(&self, old_id: usize) -> Option<usize> {
        self.atoms.get(&old_id).copied()
    }

    pub fn bond(&self, old_id: usize) -> Option<usize> {
        self.bonds.get(&old_id).copied()
    }

    /// Maps a list of atom ids, dropping ids that no longer exist.
    pub fn remap_atoms(&self, ids: &[usize]) -> Vec<usize> {
        ids.iter().filter_map(|id| self.atom(*id)).collect()
    }

    /// `self` followed by `later`.
    pub fn then(&self, later: &IdMap) -> IdMap {
        let chain = |first: &BTreeMap<usize, usize>, second: &BTreeMap<usize, usize>| {
            first
                .iter()
                .filter_map(|(old, mid)| second.get(mid).map(|new| (*old, *new)))
                .collect()
        };
        IdMap {
            atoms: chain(&self.atoms, &later.atoms),
            bonds: chain(&self.bonds, &later.bonds),
        }
    }

    /// True when every id maps to itself.
    pub fn is_identity(&self) -> bool {
        self.atoms.iter().all(|(a, b)| a == b) && self.bonds.iter().all(|(a, b)| a == b)
    }
}

/// Checks that every bond endpoint exists in the atom table.
pub fn validate_references(molecule: &Molecule) -> Result<(), EngineError> {
    for bond in molecule.bonds() {
        for endpoint in [bond.origin, bond.target] {
            if molecule.atom(endpoint).is_none() {
                return Err(EngineError::UnresolvedAtomReference {
                    bond_id: bond.id,
                    atom_id: endpoint,
                });
            }
        }
    }
    Ok(())
}

/// Removes an atom and every bond incident to it. Nothing else is touched.
pub fn remove_atom(mut molecule: Molecule, atom_id: usize) -> Result<Molecule, EngineError> {
    let index = molecule
        .atom_index(atom_id)
        .ok_or(EngineError::AtomNotFound { atom_id })?;
    molecule.atoms_mut().remove(index);
    molecule.bonds_mut().retain(|b| !b.contains(atom_id));
    debug!(atom_id, "Removed atom and its incident bonds.");
    Ok(molecule)
}

pub fn remove_bond(mut molecule: Molecule, bond_id: usize) -> Result<Molecule, EngineError> {
    let index = molecule
        .bonds()
        .iter()
        .position(|b| b.id == bond_id)
        .ok_or(EngineError::BondNotFound { bond_id })?;
    molecule.bonds_mut().remove(index);
    Ok(molecule)
}

/// Inserts `atom` directly after the atom `after_id` in table order.
///
/// The inserted atom receives the temporary id `max + 1`, which is returned
/// alongside the new molecule; call [`renumber`] once all edits are done.
pub fn insert_atom_after(
    mut molecule: Molecule,
    after_id: usize,
    mut atom: Atom,
) -> Result<(Molecule, usize), EngineError> {
    let index = molecule
        .atom_index(after_id)
        .ok_or(EngineError::AtomNotFound { atom_id: after_id })?;
    atom.id = molecule.max_atom_id() + 1;
    let new_id = atom.id;
    molecule.atoms_mut().insert(index + 1, atom);
    Ok((molecule, new_id))
}

/// Inserts a bond between `origin` and `target` directly after bond `after_id`.
///
/// Like [`insert_atom_after`], the new record gets the temporary id `max + 1`.
pub fn insert_bond_after(
    mut molecule: Molecule,
    after_id: usize,
    origin: usize,
    target: usize,
    bond_type: BondType,
) -> Result<(Molecule, usize), EngineError> {
    for endpoint in [origin, target] {
        if molecule.atom(endpoint).is_none() {
            return Err(EngineError::AtomNotFound { atom_id: endpoint });
        }
    }
    if origin == target {
        return Err(EngineError::Precondition {
            operation: "insert_bond_after",
            reason: format!("bond would connect atom {} to itself", origin),
        });
    }
    let index = molecule
        .bonds()
        .iter()
        .position(|b| b.id == after_id)
        .ok_or(EngineError::BondNotFound { bond_id: after_id })?;
    let new_id = molecule.max_bond_id() + 1;
    molecule
        .bonds_mut()
        .insert(index + 1, Bond::new(new_id, origin, target, bond_type));
    Ok((molecule, new_id))
}

/// Reassigns atom and bond ids to `1..N` in table order and rewrites bond
/// endpoints through the new atom ids.
///
/// Renumbering an already contiguous molecule yields an identical molecule
/// and an identity map.
///
/// # Errors
///
/// Returns [`EngineError::UnresolvedAtomReference`] if a bond names an atom
/// that is not in the table.
pub fn renumber(mut molecule: Molecule) -> Result<(Molecule, IdMap), EngineError> {
    let mut map = IdMap::default();
    for (index, atom) in molecule.atoms_mut().iter_mut().enumerate() {
        map.atoms.insert(atom.id, index + 1);
        atom.id = index + 1;
    }

    let atoms = &map.atoms;
    for (index, bond) in molecule.bonds_mut().iter_mut().enumerate() {
        let remap = |atom_id: usize| {
            atoms
                .get(&atom_id)
                .copied()
                .ok_or(EngineError::UnresolvedAtomReference {
                    bond_id: bond.id,
                    atom_id,
                })
        };
        let origin = remap(bond.origin)?;
        let target = remap(bond.target)?;
        map.bonds.insert(bond.id, index + 1);
        bond.id = index + 1;
        bond.origin = origin;
        bond.target = target;
    }
    Ok((molecule, map))
}

/// Makes substructure ids contiguous in order of first appearance.
///
/// Each substructure name keeps its first three characters (the residue
/// code) and takes the new id as suffix, so `GLY7` becomes `GLY1`.
pub fn renumber_substructures(mut molecule: Molecule) -> Molecule {
    let mut assigned: HashMap<usize, usize> = HashMap::new();
    for atom in molecule.atoms_mut().iter_mut() {
        let next = assigned.len() + 1;
        let new_id = *assigned.entry(atom.subst_id).or_insert(next);
        let code: String = atom.subst_name.chars().take(3).collect();
        atom.subst_id = new_id;
        atom.subst_name = format!("{}{}", code, new_id);
    }
    molecule
}

/// Bond records grouped by unordered atom pair, keeping only pairs that are
/// joined by more than one record.
pub fn parallel_bond_groups(molecule: &Molecule) -> BTreeMap<(usize, usize), Vec<usize>> {
    let mut groups: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for bond in molecule.bonds() {
        groups.entry(bond.atom_pair()).or_default().push(bond.id);
    }
    groups.retain(|_, ids| ids.len() > 1);
    groups
}

/// Reduces the records joining `a` and `b` to a single one.
///
/// Aromatic records are dropped first, latest first; after that the later of
/// the remaining records goes. Returns the ids of the removed bonds, which is
/// empty when the pair has at most one record.
pub fn collapse_parallel_bond(
    mut molecule: Molecule,
    a: usize,
    b: usize,
) -> (Molecule, Vec<usize>) {
    let mut removed = Vec::new();
    loop {
        let records: Vec<(usize, BondType)> = molecule
            .bonds()
            .iter()
            .enumerate()
            .filter(|(_, bond)| bond.connects(a, b))
            .map(|(index, bond)| (index, bond.bond_type))
            .collect();
        if records.len() < 2 {
            break;
        }
        let victim = records
            .iter()
            .rev()
            .find(|(_, bond_type)| *bond_type == BondType::Aromatic)
            .or(records.last())
            .map(|(index, _)| *index);
        let Some(index) = victim else {
            break;
        };
        let bond = molecule.bonds_mut().remove(index);
        debug!(bond_id = bond.id, a, b, "Collapsed parallel bond record.");
        removed.push(bond.id);
    }
    (molecule, removed)
}

/// Applies [`collapse_parallel_bond`] to every parallel group in the molecule.
pub fn collapse_parallel_bonds(mut molecule: Molecule) -> (Molecule, Vec<usize>) {
    let mut removed = Vec::new();
    let pairs: Vec<(usize, usize)> = parallel_bond_groups(&molecule).into_keys().collect();
    for (a, b) in pairs {
        let (next, ids) = collapse_parallel_bond(molecule, a, b);
        molecule = next;
        removed.extend(ids);
    }
    (molecule, removed)
}
