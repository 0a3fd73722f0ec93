//! # pepforge Core Library
//!
//! Backbone labeling and repair for amino-acid residues stored as TRIPOS MOL2
//! structures.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer split so each concern can be tested on
//! its own.
//!
//! - **[`core`]: The Foundation.** Plain atom and bond tables (`Molecule`), the
//!   MOL2 reader and writer, geometry helpers and SYBYL type identifiers.
//!
//! - **[`engine`]: The Logic Core.** Neighbor classification, neighbor-template
//!   matching, the backbone locator and the two repairs it can trigger
//!   (N-terminus protonation and carboxylate resolution), all built on the
//!   atom/bond editor.
//!
//! - **[`workflows`]: The Public API.** Labels every selected residue of a
//!   structure and reports per-residue outcomes without halting on a single
//!   failure.

pub mod core;
pub mod engine;
pub mod workflows;
