//! # DUP resolution
//!
//! Duplication signatures are `[start, end]` intervals; a cluster grows while
//! the next interval still overlaps the cluster's span within
//! `max_cluster_bias`.
use crate::{signature::SvType, utils};

use super::{confidence_interval, distinct_reads, thin_reads, Candidate};

#[derive(Debug, Clone, PartialEq)]
pub struct DupSig {
    pub start: i64,
    pub end: i64,
    pub read: String,
}

#[derive(Debug, Clone)]
pub struct IntervalParams {
    pub min_support: usize,
    pub max_cluster_bias: i64,
    pub sv_size: i64,
    /// `-1` disables the upper bound.
    pub max_size: i64,
    pub remain_reads_ratio: f64,
}

/// Cluster a chromosome's `(start, end)`-sorted duplication signatures.
pub fn cluster(sigs: &[DupSig], chrom: &str, params: &IntervalParams) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut members: Vec<usize> = Vec::new();
    let mut min_start = 0;
    let mut max_end = 0;
    for (i, sig) in sigs.iter().enumerate() {
        if members.is_empty() {
            members.push(i);
            min_start = sig.start;
            max_end = sig.end;
            continue;
        }
        let joins = sig.start.max(min_start) <= sig.end.min(max_end) + params.max_cluster_bias;
        if joins {
            members.push(i);
            max_end = max_end.max(sig.end);
        } else {
            emit(&members, sigs, chrom, params, &mut out);
            members = vec![i];
            min_start = sig.start;
            max_end = sig.end;
        }
    }
    emit(&members, sigs, chrom, params, &mut out);
    out
}

fn emit(
    members: &[usize],
    sigs: &[DupSig],
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

    let mut starts: Vec<i64> = members.iter().map(|&i| sigs[i].start).collect();
    let mut ends: Vec<i64> = members.iter().map(|&i| sigs[i].end).collect();
    let pos = *starts.iter().min().unwrap_or(&0);
    starts.sort();
    ends.sort();
    let len = utils::median_of_sorted(&ends) - utils::median_of_sorted(&starts);
    if len < params.sv_size || (params.max_size != -1 && len > params.max_size) {
        return;
    }

    out.push(Candidate {
        chrom: chrom.to_string(),
        sv_type: SvType::Dup,
        pos,
        len,
        support: thin_reads(reads, params.remain_reads_ratio),
        cipos: confidence_interval(&starts),
        cilen: confidence_interval(&ends),
        seq: None,
        strands: None,
        mate: None,
    });
}
