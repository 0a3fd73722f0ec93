//! Batch drivers built on the engine.
//!
//! [`label::run`] labels every selected residue of a structure and collects
//! per-residue reports; [`report`] exports those reports as CSV.

pub mod label;
pub mod report;
