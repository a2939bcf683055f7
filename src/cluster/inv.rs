//! # INV resolution
//!
//! Inversion signatures carry a junction orientation; only signatures with
//! the same orientation may cluster, using the same interval-overlap rule as
//! duplications.
use crate::{signature::{StrandPair, SvType}, utils};

use super::{confidence_interval, distinct_reads, thin_reads, Candidate};
use super::dup::IntervalParams;

#[derive(Debug, Clone, PartialEq)]
pub struct InvSig {
    pub strands: StrandPair,
    pub pos1: i64,
    pub pos2: i64,
    pub read: String,
}

/// Cluster a chromosome's inversion signatures, sorted by
/// `(strand pair, pos1, pos2)`.
pub fn cluster(sigs: &[InvSig], chrom: &str, params: &IntervalParams) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut members: Vec<usize> = Vec::new();
    let mut min_start = 0;
    let mut max_end = 0;
    for (i, sig) in sigs.iter().enumerate() {
        if members.is_empty() {
            members.push(i);
            min_start = sig.pos1;
            max_end = sig.pos2;
            continue;
        }
        let same_strands = sigs[members[0]].strands == sig.strands;
        let joins = same_strands
            && sig.pos1.max(min_start) <= sig.pos2.min(max_end) + params.max_cluster_bias;
        if joins {
            members.push(i);
            max_end = max_end.max(sig.pos2);
        } else {
            emit(&members, sigs, chrom, params, &mut out);
            members = vec![i];
            min_start = sig.pos1;
            max_end = sig.pos2;
        }
    }
    emit(&members, sigs, chrom, params, &mut out);
    out
}

fn emit(
    members: &[usize],
    sigs: &[InvSig],
    chrom: &str,
    params: &IntervalParams,
    out: &mut Vec<Candidate>,
) {
    if members.is_empty() {
        return;
    }
    let reads = distinct_reads(members.iter().map(|&i| sigs[i].read.as_str()));
    if reads.len() < params.min_support {
        return;
    }

    let mut starts: Vec<i64> = members.iter().map(|&i| sigs[i].pos1).collect();
    let mut ends: Vec<i64> = members.iter().map(|&i| sigs[i].pos2).collect();
    let pos = *starts.iter().min().unwrap_or(&0);
    starts.sort();
    ends.sort();
    let len = utils::median_of_sorted(&ends) - utils::median_of_sorted(&starts);
    if len < params.sv_size || (params.max_size != -1 && len > params.max_size) {
        return;
    }

    out.push(Candidate {
        chrom: chrom.to_string(),
        sv_type: SvType::Inv,
        pos,
        len,
        support: thin_reads(reads, params.remain_reads_ratio),
        cipos: confidence_interval(&starts),
        cilen: confidence_interval(&ends),
        seq: None,
        strands: Some(sigs[members[0]].strands),
        mate: None,
    });
}
