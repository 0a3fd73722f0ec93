//! # Engine Module
//!
//! Backbone identification and the structural repairs it depends on.
//!
//! ## Overview
//!
//! The [`locator`] walks a residue from its nitrogen to its carbonyl carbon,
//! consulting the [`neighbors`] classifier and the ordered neighbor
//! [`templates`] at each step. Along the way it may call the [`carboxylate`]
//! resolver or the [`protonation`] repairer, both of which edit the atom and
//! bond tables through the [`editor`].
//!
//! - **Configuration** ([`config`]) - Residue selection, context inference and repair switches
//! - **Error Handling** ([`error`]) - Graph and precondition errors raised by the engine
//! - **Progress Reporting** ([`progress`]) - Per-residue events for front ends
//!
//! Every transform takes a [`Molecule`](crate::core::models::molecule::Molecule)
//! by value and returns a new one; nothing is shared between calls.

pub mod carboxylate;
pub mod config;
pub mod editor;
pub mod error;
pub mod locator;
pub mod neighbors;
pub mod progress;
pub mod protonation;
pub mod templates;
