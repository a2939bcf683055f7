//! # Input/output helpers
//!
//! `bed` reads the optional include-region file, `vcf` writes the final
//! variant calls.
pub mod bed;
pub mod vcf;
