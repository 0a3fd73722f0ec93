use super::editor::{IdMap, insert_atom_after, insert_bond_after, remove_atom, renumber};
use super::error::EngineError;
use super::neighbors::neighbors;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondType;
use crate::core::utils::geometry::place_third_amine_hydrogen;
use crate::core::utils::identifiers::{ALPHA_CARBON_TYPE, HYDROGEN_TYPE};
use std::collections::HashSet;
use tracing::{info, instrument};

const ADDED_HYDROGEN_NAME: &str = "HE";
const LINKING_HYDROGEN_NAME: &str = "HZ";

#[derive(Debug, Clone)]
pub struct Protonation {
    pub molecule: Molecule,
    /// Id of the added hydrogen after renumbering.
    pub hydrogen_id: usize,
    /// Maps ids of the input molecule to ids of `molecule`.
    pub id_map: IdMap,
}

/// Adds the missing third hydrogen to an N-terminal `-NH2`.
///
/// The new atom `HE` (type `H`, zero charge, substructure of the second
/// hydrogen) is placed opposite the Cα and pushed away from the existing
/// pair. It is inserted right after the second hydrogen, with its `N-HE`
/// single bond right after the `N-H2` bond, and the molecule is renumbered.
///
/// # Errors
///
/// Returns [`EngineError::Precondition`] unless the nitrogen carries exactly
/// two hydrogens and its only `C.3` neighbor is `alpha_carbon_id`.
#[instrument(skip_all, name = "protonate_n_terminus", fields(nitrogen_id = nitrogen_id))]
pub fn protonate_n_terminus(
    molecule: Molecule,
    nitrogen_id: usize,
    alpha_carbon_id: usize,
) -> Result<Protonation, EngineError> {
    let precondition = |reason: String| EngineError::Precondition {
        operation: "protonate_n_terminus",
        reason,
    };

    let bonded = neighbors(&molecule, nitrogen_id)?;
    let hydrogens = bonded.ids_of(HYDROGEN_TYPE);
    let &[h1_id, h2_id] = hydrogens.as_slice() else {
        return Err(precondition(format!(
            "nitrogen {} carries {} hydrogens, expected 2",
            nitrogen_id,
            hydrogens.len()
        )));
    };
    let carbons: HashSet<usize> = bonded.ids_of(ALPHA_CARBON_TYPE).into_iter().collect();
    if !carbons.contains(&alpha_carbon_id) {
        return Err(precondition(format!(
            "atom {} is not a C.3 bonded to nitrogen {}",
            alpha_carbon_id, nitrogen_id
        )));
    }
    if carbons.len() != 1 {
        return Err(precondition(format!(
            "nitrogen {} is bonded to {} C.3 atoms, expected 1",
            nitrogen_id,
            carbons.len()
        )));
    }

    let position_of = |id: usize| {
        molecule
            .atom(id)
            .map(|a| a.position)
            .ok_or(EngineError::AtomNotFound { atom_id: id })
    };
    let position = place_third_amine_hydrogen(
        &position_of(nitrogen_id)?,
        &position_of(alpha_carbon_id)?,
        &position_of(h1_id)?,
        &position_of(h2_id)?,
    );

    let h2 = molecule
        .atom(h2_id)
        .ok_or(EngineError::AtomNotFound { atom_id: h2_id })?;
    let hydrogen = Atom::new(0, ADDED_HYDROGEN_NAME, HYDROGEN_TYPE, position)
        .in_substructure(h2.subst_id, &h2.subst_name);
    let n_h2_bond = molecule
        .bonds()
        .iter()
        .find(|b| b.connects(nitrogen_id, h2_id))
        .map(|b| b.id)
        .ok_or_else(|| {
            EngineError::Internal(format!(
                "no bond record joins {} and {}",
                nitrogen_id, h2_id
            ))
        })?;

    let (molecule, temp_atom_id) = insert_atom_after(molecule, h2_id, hydrogen)?;
    let (molecule, _) =
        insert_bond_after(molecule, n_h2_bond, nitrogen_id, temp_atom_id, BondType::Single)?;
    let (molecule, id_map) = renumber(molecule)?;
    let hydrogen_id = id_map
        .atom(temp_atom_id)
        .ok_or_else(|| EngineError::Internal("added hydrogen lost during renumbering".into()))?;

    info!(hydrogen_id, "Protonated N-terminus.");
    Ok(Protonation {
        molecule,
        hydrogen_id,
        id_map,
    })
}

#[derive(Debug, Clone)]
pub struct AminePreparation {
    pub molecule: Molecule,
    /// The hydrogen that leaves when the amide bond forms.
    pub leaving_hydrogen: usize,
    /// The hydrogen kept on the nitrogen, renamed `HZ`.
    pub retained_hydrogen: usize,
    /// Id, in the input molecule, of the hydrogen deleted from an `-NH3`.
    pub removed_hydrogen: Option<usize>,
    pub id_map: IdMap,
}

/// Prepares a free amine to become the nitrogen of an amide bond.
///
/// On an `-NH3` the middle hydrogen is deleted. The last remaining hydrogen
/// is renamed `HZ`; the first is reported as the one lost on condensation.
/// All returned ids refer to the renumbered molecule.
#[instrument(skip_all, name = "prepare_amine_for_linkage", fields(nitrogen_id = nitrogen_id))]
pub fn prepare_amine_for_linkage(
    molecule: Molecule,
    nitrogen_id: usize,
) -> Result<AminePreparation, EngineError> {
    let hydrogens = neighbors(&molecule, nitrogen_id)?.ids_of(HYDROGEN_TYPE);
    let (leaving, retained, removed) = match hydrogens[..] {
        [first, middle, last] => (first, last, Some(middle)),
        [first, last] => (first, last, None),
        _ => {
            return Err(EngineError::Precondition {
                operation: "prepare_amine_for_linkage",
                reason: format!(
                    "nitrogen {} carries {} hydrogens, expected 2 or 3",
                    nitrogen_id,
                    hydrogens.len()
                ),
            });
        }
    };

    let mut molecule = match removed {
        Some(middle) => remove_atom(molecule, middle)?,
        None => molecule,
    };
    molecule
        .atom_mut(retained)
        .ok_or(EngineError::AtomNotFound { atom_id: retained })?
        .name = LINKING_HYDROGEN_NAME.to_string();

    let (molecule, id_map) = renumber(molecule)?;
    let remap = |id: usize| {
        id_map
            .atom(id)
            .ok_or_else(|| EngineError::Internal(format!("hydrogen {} lost during renumbering", id)))
    };
    let leaving_hydrogen = remap(leaving)?;
    let retained_hydrogen = remap(retained)?;

    info!(leaving_hydrogen, retained_hydrogen, "Prepared amine for linkage.");
    Ok(AminePreparation {
        molecule,
        leaving_hydrogen,
        retained_hydrogen,
        removed_hydrogen: removed,
        id_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::Bond;
    use crate::core::utils::geometry::distance;
    use crate::engine::editor::validate_references;
    use nalgebra::Point3;

    // N(1) with CA(2), H1(3), H2(4), and a trailing atom so insertion shifts ids.
    fn create_amine(extra_hydrogen: bool) -> Molecule {
        let mut atoms = vec![
            Atom::new(1, "N", "N.3", Point3::new(0.0, 0.0, 0.0)).in_substructure(1, "GLY1"),
            Atom::new(2, "CA", "C.3", Point3::new(1.5, 0.0, 0.0)).in_substructure(1, "GLY1"),
            Atom::new(3, "H1", "H", Point3::new(-0.3, 0.9, 0.0)).in_substructure(1, "GLY1"),
            Atom::new(4, "H2", "H", Point3::new(-0.3, -0.9, 0.0)).in_substructure(1, "GLY1"),
            Atom::new(5, "HA2", "H", Point3::new(1.9, 1.0, 0.0)).in_substructure(1, "GLY1"),
        ];
        let mut bonds = vec![
            Bond::new(1, 1, 2, BondType::Single),
            Bond::new(2, 1, 3, BondType::Single),
            Bond::new(3, 1, 4, BondType::Single),
            Bond::new(4, 2, 5, BondType::Single),
        ];
        if extra_hydrogen {
            atoms.push(Atom::new(6, "H3", "H", Point3::new(-0.3, 0.0, 0.9)).in_substructure(1, "GLY1"));
            bonds.push(Bond::new(5, 1, 6, BondType::Single));
        }
        Molecule::from_tables(atoms, bonds)
    }

    #[test]
    fn protonation_inserts_hydrogen_after_second_hydrogen() {
        let result = protonate_n_terminus(create_amine(false), 1, 2).unwrap();
        let molecule = &result.molecule;

        assert_eq!(result.hydrogen_id, 5);
        assert_eq!(result.id_map.atom(5), Some(6));
        let names: Vec<&str> = molecule.atoms().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["N", "CA", "H1", "H2", "HE", "HA2"]);

        let added = molecule.atom(5).unwrap();
        assert_eq!(added.atom_type, "H");
        assert_eq!(added.subst_id, 1);
        assert_eq!(added.subst_name, "GLY1");
        assert_eq!(added.charge, 0.0);
        assert!(distance(&added.position, &Point3::new(-1.2, 0.0, 0.0)) < 1e-9);

        let bond = &molecule.bonds()[3];
        assert_eq!((bond.id, bond.origin, bond.target), (4, 1, 5));
        assert_eq!(bond.bond_type, BondType::Single);
        assert_eq!(molecule.bonds()[4].atom_pair(), (2, 6));
        validate_references(molecule).unwrap();

        let hydrogens = neighbors(molecule, 1).unwrap().ids_of("H");
        assert_eq!(hydrogens, vec![3, 4, 5]);
    }

    #[test]
    fn protonation_requires_exactly_two_hydrogens() {
        let result = protonate_n_terminus(create_amine(true), 1, 2);
        assert!(matches!(result, Err(EngineError::Precondition { .. })));
    }

    #[test]
    fn protonation_requires_bonded_alpha_carbon() {
        let result = protonate_n_terminus(create_amine(false), 1, 5);
        assert!(matches!(result, Err(EngineError::Precondition { .. })));
    }

    #[test]
    fn protonation_rejects_secondary_amine() {
        let (mut atoms, mut bonds) = create_amine(false).into_tables();
        atoms.push(Atom::new(6, "CD", "C.3", Point3::new(-0.5, 0.0, 1.4)).in_substructure(1, "PRO1"));
        bonds.push(Bond::new(5, 1, 6, BondType::Single));

        let result = protonate_n_terminus(Molecule::from_tables(atoms, bonds), 1, 2);
        assert!(matches!(result, Err(EngineError::Precondition { .. })));
    }

    #[test]
    fn linkage_prep_on_ammonium_removes_middle_hydrogen() {
        let prep = prepare_amine_for_linkage(create_amine(true), 1).unwrap();
        assert_eq!(prep.removed_hydrogen, Some(4));
        assert_eq!(prep.leaving_hydrogen, 3);
        // H3 (old id 6) shifts down by one after H2 is removed.
        assert_eq!(prep.retained_hydrogen, 5);
        assert_eq!(prep.molecule.atom(5).unwrap().name, "HZ");
        assert_eq!(prep.molecule.atoms().len(), 5);
        assert_eq!(neighbors(&prep.molecule, 1).unwrap().count_of("H"), 2);
        validate_references(&prep.molecule).unwrap();
    }

    #[test]
    fn linkage_prep_on_amine_only_renames() {
        let prep = prepare_amine_for_linkage(create_amine(false), 1).unwrap();
        assert_eq!(prep.removed_hydrogen, None);
        assert_eq!(prep.leaving_hydrogen, 3);
        assert_eq!(prep.retained_hydrogen, 4);
        assert_eq!(prep.molecule.atom(4).unwrap().name, "HZ");
        assert_eq!(prep.molecule.atoms().len(), 5);
    }

    #[test]
    fn linkage_prep_rejects_other_hydrogen_counts() {
        let result = prepare_amine_for_linkage(create_amine(false), 2);
        assert!(matches!(result, Err(EngineError::Precondition { .. })));
    }
}
