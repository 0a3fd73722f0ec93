use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Atom {atom_id} not found in structure")]
    AtomNotFound { atom_id: usize },

    #[error("Bond {bond_id} references atom {atom_id}, which is not in the atom table")]
    UnresolvedAtomReference { bond_id: usize, atom_id: usize },

    #[error("Bond {bond_id} not found in structure")]
    BondNotFound { bond_id: usize },

    #[error("Residue {subst_id} has no atoms in structure")]
    ResidueNotFound { subst_id: usize },

    #[error("Precondition failed for {operation}: {reason}")]
    Precondition {
        operation: &'static str,
        reason: String,
    },

    #[error("Repair of nitrogen {nitrogen_id} did not take effect: {reason}")]
    RepairPostcondition { nitrogen_id: usize, reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
