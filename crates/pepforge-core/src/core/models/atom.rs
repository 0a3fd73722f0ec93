use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

/// Labeling state of an atom after backbone identification.
///
/// MOL2 files carry a free-form status column; only the backbone flag is
/// meaningful to the labeling engine, so every other value collapses to
/// [`AtomStatus::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomStatus {
    /// No labeling information.
    #[default]
    None,
    /// Atom is part of an identified N–Cα–C(=O) backbone.
    Backbone,
}

impl FromStr for AtomStatus {
    type Err = ();

    /// Parses a MOL2 status column.
    ///
    /// Matching is case-insensitive. `BACKBONE` maps to [`AtomStatus::Backbone`];
    /// the sentinels `none`, `****` and the empty string map to [`AtomStatus::None`].
    ///
    /// # Errors
    ///
    /// Returns `()` for any other status token so callers can decide whether to
    /// discard it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomStatus::Backbone),
            "" | "none" | "****" => Ok(AtomStatus::None),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AtomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AtomStatus::None => "NONE",
            AtomStatus::Backbone => "BACKBONE",
        })
    }
}

/// A single record of the MOL2 atom table.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial id, unique and contiguous (1..N) after any edit.
    pub id: usize,
    /// The atom label (e.g. "CA", "HZ", "OXT").
    pub name: String,
    /// The SYBYL atom type (e.g. "C.3", "N.am", "O.co2", "H").
    pub atom_type: String,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Id of the substructure (residue) this atom belongs to.
    pub subst_id: usize,
    /// Name of the substructure (e.g. "GLY1").
    pub subst_name: String,
    /// Partial charge in elementary charge units.
    pub charge: f64,
    /// Labeling status.
    pub status: AtomStatus,
    /// Raw `UNITY_ATOM_ATTR` property lines attached to this atom.
    pub unity_attributes: Vec<String>,
}

impl Atom {
    /// Creates an atom with zero charge, no status and no unity attributes.
    ///
    /// # Arguments
    ///
    /// * `id` - The serial id of the atom.
    /// * `name` - The atom label.
    /// * `atom_type` - The SYBYL atom type.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(id: usize, name: &str, atom_type: &str, position: Point3<f64>) -> Self {
        Self {
            id,
            name: name.to_string(),
            atom_type: atom_type.to_string(),
            position,
            subst_id: 1,
            subst_name: String::new(),
            charge: 0.0,
            status: AtomStatus::default(),
            unity_attributes: Vec::new(),
        }
    }

    /// Sets the substructure this atom belongs to.
    pub fn in_substructure(mut self, subst_id: usize, subst_name: &str) -> Self {
        self.subst_id = subst_id;
        self.subst_name = subst_name.to_string();
        self
    }

    pub fn is_backbone(&self) -> bool {
        self.status == AtomStatus::Backbone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new(3, "CA", "C.3", Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.id, 3);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.atom_type, "C.3");
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.subst_id, 1);
        assert_eq!(atom.charge, 0.0);
        assert_eq!(atom.status, AtomStatus::None);
        assert!(atom.unity_attributes.is_empty());
        assert!(!atom.is_backbone());
    }

    #[test]
    fn in_substructure_sets_residue_fields() {
        let atom = Atom::new(1, "N", "N.3", Point3::origin()).in_substructure(4, "LYS4");
        assert_eq!(atom.subst_id, 4);
        assert_eq!(atom.subst_name, "LYS4");
    }

    #[test]
    fn status_from_str_parses_known_tokens() {
        assert_eq!(AtomStatus::from_str("BACKBONE"), Ok(AtomStatus::Backbone));
        assert_eq!(AtomStatus::from_str("backbone"), Ok(AtomStatus::Backbone));
        assert_eq!(AtomStatus::from_str("None"), Ok(AtomStatus::None));
        assert_eq!(AtomStatus::from_str("****"), Ok(AtomStatus::None));
        assert_eq!(AtomStatus::from_str(""), Ok(AtomStatus::None));
    }

    #[test]
    fn status_from_str_rejects_unknown_tokens() {
        assert_eq!(AtomStatus::from_str("DSPMOD"), Err(()));
        assert_eq!(AtomStatus::from_str("side chain"), Err(()));
    }

    #[test]
    fn status_display_round_trips() {
        for status in [AtomStatus::None, AtomStatus::Backbone] {
            assert_eq!(AtomStatus::from_str(&status.to_string()), Ok(status));
        }
    }
}
