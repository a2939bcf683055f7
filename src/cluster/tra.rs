//! # TRA resolution
//!
//! Breakend signatures for one ordered chromosome pair, sorted by `pos1`.
//! Signatures only cluster when their breakend form matches and both
//! junction coordinates agree within `max_cluster_bias`; a cluster whose
//! partner coordinates scatter unevenly is discarded.
use crate::{
    signature::BndForm,
    signature::SvType,
    utils,
};

use super::{confidence_interval, distinct_reads, thin_reads, Candidate};

#[derive(Debug, Clone, PartialEq)]
pub struct TraSig {
    pub form: BndForm,
    pub pos1: i64,
    pub pos2: i64,
    pub read: String,
}

#[derive(Debug, Clone)]
pub struct TraParams {
    pub min_support: usize,
    pub max_cluster_bias: i64,
    /// Minimum `median gap / max gap` over the sorted partner coordinates.
    pub diff_ratio_filtering: f64,
    pub remain_reads_ratio: f64,
}

#[derive(Debug)]
struct OpenCluster {
    members: Vec<usize>,
    last_pos1: i64,
    pos2_sum: i64,
}

impl OpenCluster {
    fn mean_pos2(&self) -> i64 {
        self.pos2_sum / self.members.len() as i64
    }
}

/// Cluster one `(chrom1, chrom2)` pair's `pos1`-sorted breakend signatures.
pub fn cluster(
    sigs: &[TraSig],
    chrom1: &str,
    chrom2: &str,
    params: &TraParams,
) -> Vec<Candidate> {
    let mut open: [Option<OpenCluster>; 4] = [None, None, None, None];
    let mut out = Vec::new();

    for (i, sig) in sigs.iter().enumerate() {
        let slot = &mut open[sig.form as usize];
        match slot {
            Some(c)
                if sig.pos1 - c.last_pos1 <= params.max_cluster_bias
                    && (sig.pos2 - c.mean_pos2()).abs() <= params.max_cluster_bias =>
            {
                c.members.push(i);
                c.last_pos1 = sig.pos1;
                c.pos2_sum += sig.pos2;
            }
            _ => {
                if let Some(c) = slot.take() {
                    emit(&c.members, sigs, chrom1, chrom2, params, &mut out);
                }
                *slot = Some(OpenCluster {
                    members: vec![i],
                    last_pos1: sig.pos1,
                    pos2_sum: sig.pos2,
                });
            }
        }
    }
    for slot in open.into_iter().flatten() {
        emit(&slot.members, sigs, chrom1, chrom2, params, &mut out);
    }

    out.sort_by(|a, b| (a.pos, &a.mate).cmp(&(b.pos, &b.mate)));
    out
}

fn emit(
    members: &[usize],
    sigs: &[TraSig],
    chrom1: &str,
    chrom2: &str,
    params: &TraParams,
    out: &mut Vec<Candidate>,
) {
    let reads = distinct_reads(members.iter().map(|&i| sigs[i].read.as_str()));
    if reads.len() < params.min_support {
        return;
    }
    let pos1s: Vec<i64> = members.iter().map(|&i| sigs[i].pos1).collect();
    let pos2s: Vec<i64> = members.iter().map(|&i| sigs[i].pos2).collect();
    if !gap_ratio_ok(&pos2s, params.diff_ratio_filtering) {
        return;
    }

    out.push(Candidate {
        chrom: chrom1.to_string(),
        sv_type: SvType::Tra,
        pos: utils::floor_mean(&pos1s),
        len: 0,
        support: thin_reads(reads, params.remain_reads_ratio),
        cipos: confidence_interval(&pos1s),
        cilen: confidence_interval(&pos2s),
        seq: None,
        strands: None,
        mate: Some((
            sigs[members[0]].form,
            chrom2.to_string(),
            utils::floor_mean(&pos2s),
        )),
    });
}

/// Partner-coordinate scatter test: the sorted `pos2` values' consecutive
/// gaps must be uniform — clusters pass when the gaps are all zero or the
/// median gap reaches `ratio` of the largest one.
fn gap_ratio_ok(pos2s: &[i64], ratio: f64) -> bool {
    if pos2s.len() < 2 {
        return true;
    }
    let mut sorted = pos2s.to_vec();
    sorted.sort();
    let mut gaps: Vec<i64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    gaps.sort();
    let max_gap = gaps[gaps.len() - 1];
    if max_gap == 0 {
        return true;
    }
    utils::median_of_sorted(&gaps) as f64 >= ratio * max_gap as f64
}
