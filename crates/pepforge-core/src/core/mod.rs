//! # Core Module
//!
//! Data structures and file handling shared by the labeling engine.
//!
//! - **Structure Representation** ([`models`]) - Atom and bond tables of one structure
//! - **File I/O** ([`io`]) - MOL2 reading and writing behind the [`io::traits::MolecularFile`] trait
//! - **Utilities** ([`utils`]) - Geometry helpers and SYBYL atom type identifiers

pub mod io;
pub mod models;
pub mod utils;
