//! # Core Models Module
//!
//! Plain data structures for MOL2 amino-acid structures: atoms, bonds and the
//! ordered tables that hold them.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom records with coordinates, SYBYL types and labeling status
//! - [`topology`] - Bond records and SYBYL bond types
//! - [`molecule`] - The atom and bond tables of one structure
//!
//! ## Usage
//!
//! ```ignore
//! use pepforge::core::models::{atom::Atom, molecule::Molecule, topology::{Bond, BondType}};
//!
//! let atoms = vec![
//!     Atom::new(1, "N", "N.3", Point3::new(0.0, 0.0, 0.0)),
//!     Atom::new(2, "CA", "C.3", Point3::new(1.47, 0.0, 0.0)),
//! ];
//! let bonds = vec![Bond::new(1, 1, 2, BondType::Single)];
//! let molecule = Molecule::from_tables(atoms, bonds);
//! ```

pub mod atom;
pub mod molecule;
pub mod topology;
