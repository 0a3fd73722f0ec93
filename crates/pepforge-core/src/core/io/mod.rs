//! Input/output for molecular structure files.
//!
//! Formats implement [`traits::MolecularFile`]; [`mol2`] provides the TRIPOS
//! MOL2 reader and writer used throughout the crate.

pub mod mol2;
pub mod traits;
