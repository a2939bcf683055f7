//! # Candidate clustering
//!
//! One sub-module per SV class turns a chromosome's sorted signature stream
//! into [`Candidate`] records: position-gap clustering with per-class
//! refinements (length similarity for INS/DEL, interval overlap for DUP/INV,
//! breakend-form agreement for TRA).
pub mod dup;
pub mod indel;
pub mod inv;
pub mod tra;

use crate::{
    signature::{BndForm, StrandPair, SvType},
    utils,
};

/// A clustered SV candidate awaiting genotyping.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub chrom: String,
    pub sv_type: SvType,
    pub pos: i64,
    pub len: i64,
    /// Distinct supporting read tags, sorted.
    pub support: Vec<String>,
    pub cipos: String,
    pub cilen: String,
    /// Representative inserted sequence (INS only).
    pub seq: Option<String>,
    /// Junction orientation (INV only).
    pub strands: Option<StrandPair>,
    /// Mate breakend (TRA only): form, partner chromosome, partner position.
    pub mate: Option<(BndForm, String, i64)>,
}

/// Supporting read sets above this size are thinned.
const READ_CAP: usize = 500;

/// Distinct supporting read tags in sorted order.
pub(crate) fn distinct_reads<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut reads: Vec<String> = tags.map(str::to_string).collect();
    reads.sort();
    reads.dedup();
    reads
}

/// Thin an oversized supporting set, keeping every `ceil(1/ratio)`-th tag of
/// the sorted list. A ratio of 1 keeps everything.
pub(crate) fn thin_reads(mut reads: Vec<String>, remain_reads_ratio: f64) -> Vec<String> {
    if reads.len() > READ_CAP && remain_reads_ratio > 0.0 {
        let step = (1.0 / remain_reads_ratio).ceil() as usize;
        if step > 1 {
            reads = reads.into_iter().step_by(step).collect();
        }
    }
    reads
}

/// `1.96·σ/√n` confidence radius, formatted `-X,X`.
pub(crate) fn confidence_interval(values: &[i64]) -> String {
    let radius = (1.96 * utils::std_dev(values) / (values.len() as f64).sqrt()) as i64;
    format!("-{radius},{radius}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_interval_of_identical_positions_is_zero() {
        assert_eq!(confidence_interval(&[100, 100, 100]), "-0,0");
    }

    #[test]
    fn thinning_only_kicks_in_above_the_cap() {
        let reads: Vec<String> = (0..600).map(|i| format!("r{i:03}:")).collect();
        let kept = thin_reads(reads.clone(), 0.5);
        assert_eq!(kept.len(), 300);
        assert_eq!(kept[0], "r000:");
        assert_eq!(kept[1], "r002:");

        let small: Vec<String> = reads[..100].to_vec();
        assert_eq!(thin_reads(small.clone(), 0.5), small);
    }
}
