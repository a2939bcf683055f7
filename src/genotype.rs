//! # Coverage counting and genotyping
//!
//! For every candidate the caller needs two counts: `DV`, the distinct reads
//! whose signatures built the candidate, and `DR`, the primary reads that
//! span the candidate's interval without supporting it. A single sweep over
//! position-sorted events yields the spanning cover set for every candidate
//! of a chromosome at once; the genotype then follows from a three-state
//! likelihood model kept in log10 space.
use std::collections::HashSet;

use log::debug;

use crate::{
    cluster::Candidate,
    signature::{ReadSpan, SvType},
};

/// Sequencing error rate of the likelihood model.
const SEQ_ERR: f64 = 0.1;
/// Prior probability of the heterozygous genotype.
const PRIOR: f64 = 1.0 / 3.0;
/// Read counts are rescaled so `DR + DV` never exceeds this.
const MAX_SCALED_READS: usize = 100;

const GENOTYPES: [&str; 3] = ["0/0", "0/1", "1/1"];

/// A genotyped candidate, ready for output.
#[derive(Debug, Clone, PartialEq)]
pub struct SvCall {
    pub candidate: Candidate,
    pub dv: usize,
    /// `None` when genotyping is disabled.
    pub dr: Option<usize>,
    pub gt: String,
    pub pl: String,
    pub gq: String,
    pub qual: Option<f64>,
}

/// Sweep-line event kinds, ordered so that at one position a candidate's
/// right edge closes first, read edges move next, and a candidate's left
/// edge opens last — the open reads at `sv_left` are exactly the ones
/// reaching it.
const SV_RIGHT: u8 = 0;
const READ_LEFT: u8 = 1;
const READ_RIGHT: u8 = 2;
const SV_LEFT: u8 = 3;

/// For each `[left, right]` candidate interval, the tags of primary reads
/// spanning it: open at `left` and still open at `right`.
pub fn overlap_cover(svs: &[(i64, i64)], reads: &[ReadSpan]) -> Vec<HashSet<String>> {
    let mut events: Vec<(i64, u8, usize)> = Vec::with_capacity(2 * (svs.len() + reads.len()));
    for (idx, span) in reads.iter().enumerate() {
        events.push((span.start, READ_LEFT, idx));
        events.push((span.end, READ_RIGHT, idx));
    }
    for (idx, sv) in svs.iter().enumerate() {
        events.push((sv.0, SV_LEFT, idx));
        events.push((sv.1, SV_RIGHT, idx));
    }
    events.sort_by_key(|&(pos, kind, _)| (pos, kind));

    let mut open_reads: HashSet<usize> = HashSet::new();
    let mut cover: Vec<HashSet<usize>> = vec![HashSet::new(); svs.len()];
    for (_, kind, idx) in events {
        match kind {
            READ_LEFT => {
                open_reads.insert(idx);
            }
            READ_RIGHT => {
                open_reads.remove(&idx);
            }
            SV_LEFT => {
                cover[idx] = open_reads.clone();
            }
            _ => {
                // SV_RIGHT: only reads still open span the whole interval
                cover[idx].retain(|r| open_reads.contains(r));
            }
        }
    }

    cover
        .into_iter()
        .map(|set| {
            set.into_iter()
                .filter(|&r| reads[r].is_primary)
                .map(|r| reads[r].read.clone())
                .collect()
        })
        .collect()
}

/// Above this spanning-read total a candidate counts as highly supported.
pub fn high_coverage_bound(min_support: usize) -> usize {
    match min_support {
        0..=2 => 20 * min_support,
        3..=5 => 9 * min_support,
        6..=15 => 7 * min_support,
        _ => 5 * min_support,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeCall {
    pub gt: &'static str,
    pub pl: [i64; 3],
    pub gq: i64,
    pub qual: f64,
}

fn rescale_read_counts(c0: usize, c1: usize) -> (usize, usize) {
    let total = c0 + c1;
    if total > MAX_SCALED_READS {
        let c0 = (MAX_SCALED_READS as f64 * c0 as f64 / total as f64) as usize;
        (c0, MAX_SCALED_READS - c0)
    } else {
        (c0, c1)
    }
}

fn log10_sum_exp(values: &[f64]) -> f64 {
    let m = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    m + values
        .iter()
        .map(|v| 10f64.powf(v - m))
        .sum::<f64>()
        .log10()
}

/// Genotype from `c0` non-supporting and `c1` supporting spanning reads.
/// Returns `None` when the likelihoods degenerate.
pub fn call_genotype(c0: usize, c1: usize) -> Option<GenotypeCall> {
    let (c0, c1) = rescale_read_counts(c0, c1);
    let (c0, c1) = (c0 as f64, c1 as f64);
    let homozygous_prior = ((1.0 - PRIOR) / 2.0).log10();
    let log10_likelihoods = [
        c0 * (1.0 - SEQ_ERR).log10() + c1 * SEQ_ERR.log10() + homozygous_prior,
        (c0 + c1) * 0.5f64.log10() + PRIOR.log10(),
        c0 * SEQ_ERR.log10() + c1 * (1.0 - SEQ_ERR).log10() + homozygous_prior,
    ];
    let lse = log10_sum_exp(&log10_likelihoods);
    let normalized = log10_likelihoods.map(|l| (l - lse).min(0.0));
    if normalized.iter().any(|p| !p.is_finite()) {
        return None;
    }

    // ties resolve toward the first genotype in 0/0, 0/1, 1/1 order
    let mut best = 0;
    for i in 1..3 {
        if normalized[i] > normalized[best] {
            best = i;
        }
    }

    let probs = normalized.map(|p| 10f64.powf(p));
    let others: f64 = probs
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != best)
        .map(|(_, p)| p)
        .sum();
    let gq = (-10.0 * others.log10()) as i64;
    let pl = normalized.map(|p| (-10.0 * p).round() as i64);
    let qual = ((-10.0 * normalized[0]) * 10.0).round() / 10.0;

    Some(GenotypeCall {
        gt: GENOTYPES[best],
        pl,
        gq,
        qual: qual.abs(),
    })
}

/// Reference interval a spanning read must cover for this candidate.
fn spanning_interval(candidate: &Candidate, bias: i64) -> (i64, i64) {
    let end = match candidate.sv_type {
        SvType::Ins | SvType::Tra => candidate.pos,
        _ => candidate.pos + candidate.len,
    };
    ((candidate.pos - bias).max(0), end + bias)
}

/// Attach DR/DV and genotype fields to a task's candidates. `reads` are the
/// chromosome's collected read spans; with genotyping disabled the counts
/// degrade to missing values.
pub fn annotate_candidates(
    candidates: Vec<Candidate>,
    reads: &[ReadSpan],
    max_cluster_bias: i64,
    min_support: usize,
    genotype: bool,
) -> Vec<SvCall> {
    if !genotype {
        return candidates
            .into_iter()
            .map(|candidate| SvCall {
                dv: candidate.support.len(),
                dr: None,
                gt: "./.".to_string(),
                pl: ".,.,.".to_string(),
                gq: ".".to_string(),
                qual: None,
                candidate,
            })
            .collect();
    }

    let intervals: Vec<(i64, i64)> = candidates
        .iter()
        .map(|c| spanning_interval(c, max_cluster_bias))
        .collect();
    let covers = overlap_cover(&intervals, reads);
    let bound = high_coverage_bound(min_support);

    candidates
        .into_iter()
        .zip(covers)
        .map(|(candidate, cover)| {
            let support: HashSet<&str> =
                candidate.support.iter().map(String::as_str).collect();
            let dv = candidate.support.len();
            let dr = cover
                .iter()
                .filter(|tag| !support.contains(tag.as_str()))
                .count();
            if dr + dv > bound {
                debug!(
                    "Highly supported candidate {}:{} ({} spanning reads)",
                    candidate.chrom,
                    candidate.pos,
                    dr + dv
                );
            }
            match call_genotype(dr, dv) {
                Some(call) => SvCall {
                    dv,
                    dr: Some(dr),
                    gt: call.gt.to_string(),
                    pl: format!("{},{},{}", call.pl[0], call.pl[1], call.pl[2]),
                    gq: call.gq.to_string(),
                    qual: Some(call.qual),
                    candidate,
                },
                None => SvCall {
                    dv,
                    dr: Some(dr),
                    gt: "./.".to_string(),
                    pl: ".,.,.".to_string(),
                    gq: ".".to_string(),
                    qual: None,
                    candidate,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: i64, end: i64, primary: bool, read: &str) -> ReadSpan {
        ReadSpan {
            chrom: "chr1".to_string(),
            start,
            end,
            is_primary: primary,
            read: read.to_string(),
        }
    }

    #[test]
    fn cover_keeps_only_spanning_primaries() {
        let reads = vec![
            span(900, 1200, true, "spanning:"),
            span(1010, 1200, true, "late:"),
            span(900, 1040, true, "early:"),
            span(900, 1200, false, "supplementary:"),
        ];
        let cover = overlap_cover(&[(1000, 1060)], &reads);
        assert_eq!(cover.len(), 1);
        assert_eq!(cover[0], HashSet::from(["spanning:".to_string()]));
    }

    #[test]
    fn read_ending_on_the_left_edge_does_not_span() {
        let reads = vec![span(900, 1000, true, "r:")];
        let cover = overlap_cover(&[(1000, 1060)], &reads);
        assert!(cover[0].is_empty());
    }

    #[test]
    fn pure_variant_support_is_homozygous_alt() {
        let call = call_genotype(0, 10).unwrap();
        assert_eq!(call.gt, "1/1");
        assert!(call.pl[0] > call.pl[2]);
        assert!(call.qual >= 40.0);
    }

    #[test]
    fn balanced_support_is_heterozygous() {
        let call = call_genotype(5, 5).unwrap();
        assert_eq!(call.gt, "0/1");
        assert_eq!(call.pl[1], 0);
    }

    #[test]
    fn overwhelming_reference_support_is_homozygous_ref() {
        // 180 reference vs 20 variant reads, rescaled to 90/10
        let call = call_genotype(180, 20).unwrap();
        assert_eq!(call.gt, "0/0");
    }

    #[test]
    fn zero_counts_still_produce_a_call() {
        let call = call_genotype(0, 0).unwrap();
        assert_eq!(call.gt, "0/0");
    }

    #[test]
    fn high_coverage_ladder() {
        assert_eq!(high_coverage_bound(2), 40);
        assert_eq!(high_coverage_bound(5), 45);
        assert_eq!(high_coverage_bound(10), 70);
        assert_eq!(high_coverage_bound(20), 100);
    }
}
