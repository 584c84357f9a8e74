//! Shared infrastructure for the tensile crates: the contract-violation
//! taxonomy and the report sink it is delivered through.

pub mod diag;
pub mod error;
pub mod macros;
