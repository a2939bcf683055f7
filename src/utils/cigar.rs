//! # CIGAR Utils
//!
//! Functions to check which category CIGAR operations fall into and to
//! extract clip/span geometry from the CIGAR strings carried in `SA` tags.
use anyhow::{bail, Result};
use rust_htslib::bam::record::Cigar;

/// Check if the provided cigar operation `cigar` advances the
/// position in the reference sequence.
pub fn consumes_ref(cigar: &Cigar) -> bool {
    matches!(
        cigar,
        Cigar::Match(_) | Cigar::Del(_) | Cigar::RefSkip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Check if the provided cigar operation `cigar` advances the
/// position in the query sequence.
pub fn consumes_query(cigar: &Cigar) -> bool {
    matches!(
        cigar,
        Cigar::Match(_) | Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Query length inferred from the CIGAR, excluding hard-clipped bases.
pub fn inferred_read_length(cigar: &[Cigar]) -> i64 {
    cigar
        .iter()
        .filter(|op| consumes_query(op))
        .map(|op| i64::from(op.len()))
        .sum()
}

pub fn soft_clip(op: &Cigar) -> i64 {
    match op {
        Cigar::SoftClip(l) => i64::from(*l),
        _ => 0,
    }
}

pub fn hard_clip(op: &Cigar) -> i64 {
    match op {
        Cigar::HardClip(l) => i64::from(*l),
        _ => 0,
    }
}

/// Clip and span geometry of a supplementary alignment, read off the CIGAR
/// string inside an `SA` tag. Only soft clips at the outermost operations
/// count as clips, matching how upstream aligners encode `SA` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaCigar {
    pub clip_left: i64,
    pub clip_right: i64,
    pub ref_len: i64,
}

/// Parse the CIGAR string of an `SA` entry. Returns an error on operation
/// characters outside `MIDNSHP=X`; callers treat that as a recoverable
/// per-alignment condition and skip the entry.
pub fn scan_sa_cigar(cigar: &str) -> Result<SaCigar> {
    let mut ops: Vec<(i64, char)> = Vec::new();
    let mut num: i64 = 0;
    let mut have_num = false;
    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            num = num * 10 + i64::from(d);
            have_num = true;
        } else {
            if !have_num {
                bail!("CIGAR operation '{c}' without length in '{cigar}'");
            }
            if !"MIDNSHP=X".contains(c) {
                bail!("Unexpected CIGAR operation '{c}' in '{cigar}'");
            }
            ops.push((num, c));
            num = 0;
            have_num = false;
        }
    }
    if have_num || ops.is_empty() {
        bail!("Truncated CIGAR string '{cigar}'");
    }

    let clip_left = match ops.first() {
        Some(&(l, 'S')) => l,
        _ => 0,
    };
    let clip_right = match ops.last() {
        Some(&(l, 'S')) => l,
        _ => 0,
    };
    let ref_len = ops
        .iter()
        .filter(|(_, op)| matches!(op, 'M' | 'D' | 'N' | '=' | 'X'))
        .map(|(l, _)| *l)
        .sum();

    Ok(SaCigar {
        clip_left,
        clip_right,
        ref_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sa_cigar_spans() {
        let sa = scan_sa_cigar("100S50M2D10M500S").unwrap();
        assert_eq!(sa.clip_left, 100);
        assert_eq!(sa.clip_right, 500);
        assert_eq!(sa.ref_len, 62);
    }

    #[test]
    fn sa_cigar_hard_clips_do_not_count() {
        let sa = scan_sa_cigar("30H70M").unwrap();
        assert_eq!(sa.clip_left, 0);
        assert_eq!(sa.ref_len, 70);
    }

    #[test]
    fn sa_cigar_rejects_garbage() {
        assert!(scan_sa_cigar("50Q30M").is_err());
        assert!(scan_sa_cigar("50M3").is_err());
        assert!(scan_sa_cigar("").is_err());
    }

    #[test]
    fn read_length_skips_hard_clips() {
        let cigar = vec![
            Cigar::HardClip(20),
            Cigar::SoftClip(10),
            Cigar::Match(70),
            Cigar::Ins(5),
        ];
        assert_eq!(inferred_read_length(&cigar), 85);
    }
}
