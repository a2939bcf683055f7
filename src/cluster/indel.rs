//! # INS/DEL resolution
//!
//! Signatures arrive sorted by position. A coarse pass groups them while the
//! gap between neighbours stays within `max_cluster_bias`; each group is then
//! subdivided on length similarity, because one locus can carry alleles of
//! clearly different sizes.
use crate::{
    signature::SvType,
    utils,
};

use super::{confidence_interval, distinct_reads, thin_reads, Candidate};

/// One INS or DEL signature restricted to a `(chromosome, type)` task.
#[derive(Debug, Clone, PartialEq)]
pub struct IndelSig {
    pub pos: i64,
    pub len: i64,
    pub read: String,
    /// Inserted sequence; empty for deletions.
    pub seq: String,
}

#[derive(Debug, Clone)]
pub struct IndelParams {
    pub min_support: usize,
    pub max_cluster_bias: i64,
    /// Two signatures share a sub-cluster when `min/max >= 1 - ratio`.
    pub diff_ratio_merging: f64,
    pub remain_reads_ratio: f64,
}

/// Cluster a chromosome's position-sorted INS or DEL signatures.
pub fn cluster(sigs: &[IndelSig], chrom: &str, sv_type: SvType, params: &IndelParams) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut block_start = 0;
    for i in 1..=sigs.len() {
        let flush = i == sigs.len() || sigs[i].pos - sigs[i - 1].pos > params.max_cluster_bias;
        if flush {
            split_by_length(&sigs[block_start..i], chrom, sv_type, params, &mut out);
            block_start = i;
        }
    }
    out
}

/// Subdivide one positional block on length similarity. Members are chained
/// in length-sorted order: a signature joins the open sub-cluster when it is
/// similar enough to the previously added (next-shorter) one.
fn split_by_length(
    block: &[IndelSig],
    chrom: &str,
    sv_type: SvType,
    params: &IndelParams,
    out: &mut Vec<Candidate>,
) {
    if block.is_empty() {
        return;
    }
    let mut order: Vec<usize> = (0..block.len()).collect();
    order.sort_by_key(|&i| (block[i].len, i));

    let mut sub: Vec<usize> = vec![order[0]];
    for &i in &order[1..] {
        let prev = block[sub[sub.len() - 1]].len;
        let len = block[i].len;
        let similar =
            prev.min(len) as f64 / prev.max(len) as f64 >= 1.0 - params.diff_ratio_merging;
        if similar {
            sub.push(i);
        } else {
            emit(&sub, block, chrom, sv_type, params, out);
            sub = vec![i];
        }
    }
    emit(&sub, block, chrom, sv_type, params, out);
}

fn emit(
    members: &[usize],
    block: &[IndelSig],
    chrom: &str,
    sv_type: SvType,
    params: &IndelParams,
    out: &mut Vec<Candidate>,
) {
    let reads = distinct_reads(members.iter().map(|&i| block[i].read.as_str()));
    if reads.len() < params.min_support {
        return;
    }
    let support = thin_reads(reads, params.remain_reads_ratio);

    // restore positional order within the sub-cluster
    let mut members: Vec<usize> = members.to_vec();
    members.sort();

    let positions: Vec<i64> = members.iter().map(|&i| block[i].pos).collect();
    let mut lens: Vec<i64> = members.iter().map(|&i| block[i].len).collect();
    lens.sort();
    let median_len = utils::median_of_sorted(&lens);

    let seq = match sv_type {
        SvType::Ins => members
            .iter()
            .map(|&i| &block[i])
            .min_by_key(|s| (s.len - median_len).abs())
            .map(|s| s.seq.clone()),
        _ => None,
    };

    out.push(Candidate {
        chrom: chrom.to_string(),
        sv_type,
        pos: utils::floor_mean(&positions),
        len: median_len,
        support,
        cipos: confidence_interval(&positions),
        cilen: confidence_interval(&lens),
        seq,
        strands: None,
        mate: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(pos: i64, len: i64, read: &str) -> IndelSig {
        IndelSig {
            pos,
            len,
            read: read.to_string(),
            seq: String::new(),
        }
    }

    fn params(min_support: usize) -> IndelParams {
        IndelParams {
            min_support,
            max_cluster_bias: 200,
            diff_ratio_merging: 0.5,
            remain_reads_ratio: 1.0,
        }
    }

    #[test]
    fn two_agreeing_deletions_make_one_candidate() {
        let sigs = vec![sig(1000, 60, "r1:"), sig(1000, 60, "r2:")];
        let cands = cluster(&sigs, "chr1", SvType::Del, &params(2));
        assert_eq!(cands.len(), 1);
        let c = &cands[0];
        assert_eq!((c.pos, c.len), (1000, 60));
        assert_eq!(c.support, vec!["r1:".to_string(), "r2:".to_string()]);
        assert_eq!(c.cipos, "-0,0");
        assert_eq!(c.cilen, "-0,0");
    }

    #[test]
    fn support_below_threshold_is_dropped() {
        let sigs = vec![sig(1000, 60, "r1:")];
        assert!(cluster(&sigs, "chr1", SvType::Del, &params(2)).is_empty());
    }

    #[test]
    fn one_read_with_two_signatures_counts_once() {
        let sigs = vec![sig(1000, 60, "r1:"), sig(1010, 60, "r1:")];
        assert!(cluster(&sigs, "chr1", SvType::Del, &params(2)).is_empty());
    }

    #[test]
    fn distant_blocks_stay_separate() {
        let sigs = vec![
            sig(1000, 60, "r1:"),
            sig(1020, 60, "r2:"),
            sig(9000, 60, "r3:"),
            sig(9010, 60, "r4:"),
        ];
        let cands = cluster(&sigs, "chr1", SvType::Del, &params(2));
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].pos, 1010);
        assert_eq!(cands[1].pos, 9005);
    }

    #[test]
    fn dissimilar_lengths_split_within_a_block() {
        let sigs = vec![
            sig(1000, 60, "r1:"),
            sig(1005, 62, "r2:"),
            sig(1010, 400, "r3:"),
            sig(1015, 410, "r4:"),
        ];
        let cands = cluster(&sigs, "chr1", SvType::Del, &params(2));
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].len, 61);
        assert_eq!(cands[1].len, 405);
    }

    #[test]
    fn representative_sequence_is_nearest_to_the_median_length() {
        let sigs = vec![
            IndelSig { pos: 1000, len: 90, read: "r1:".into(), seq: "A".repeat(90) },
            IndelSig { pos: 1002, len: 100, read: "r2:".into(), seq: "C".repeat(100) },
            IndelSig { pos: 1004, len: 130, read: "r3:".into(), seq: "G".repeat(130) },
        ];
        let cands = cluster(&sigs, "chr1", SvType::Ins, &params(3));
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].len, 100);
        assert_eq!(cands[0].seq.as_deref(), Some("C".repeat(100).as_str()));
    }
}
