pub mod label;
pub mod templates;
