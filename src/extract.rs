//! # Per-alignment signature extraction
//!
//! Turns one non-secondary alignment into typed SV signatures: insertions and
//! deletions read directly off the CIGAR, and split-read signals derived from
//! the `SA` tag (see [`crate::split`]). Extraction is pure over an
//! [`AlignedRead`], so the geometry can be tested on synthetic CIGARs without
//! touching an alignment file.
use rust_htslib::bam::{
    ext::BamRecordExtensions,
    record::{Aux, Cigar},
    Record,
};

use crate::{
    signature::Signature,
    split,
    utils::cigar,
};

/// Extraction thresholds, handed down from the command line.
#[derive(Debug, Clone)]
pub struct ExtractParams {
    /// Minimum SV length for split-read signals (`--min-size`).
    pub sv_size: i64,
    pub min_mapq: u8,
    /// Maximum number of split segments per read; `-1` disables the cap.
    pub max_split_parts: i64,
    pub min_read_len: i64,
    /// Minimum operation length for in-CIGAR signals.
    pub min_siglength: i64,
    pub merge_del_threshold: i64,
    pub merge_ins_threshold: i64,
    /// Upper SV length bound; `-1` disables it.
    pub max_size: i64,
}

/// The fields of one alignment record the extractor consumes.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    pub chrom: String,
    pub ref_start: i64,
    pub ref_end: i64,
    pub mapq: u8,
    pub flag: u16,
    pub is_reverse: bool,
    pub cigar: Vec<Cigar>,
    /// Stored sequence, hard clips excluded. May be empty.
    pub seq: Vec<u8>,
    pub sa: Option<String>,
    /// `query_name:read_group`
    pub read_tag: String,
}

impl AlignedRead {
    pub fn from_record(record: &Record, chrom: &str) -> Self {
        let sa = match record.aux(b"SA") {
            Ok(Aux::String(s)) => Some(s.to_string()),
            _ => None,
        };
        let rg = match record.aux(b"RG") {
            Ok(Aux::String(s)) => s.to_string(),
            _ => String::new(),
        };
        let read_tag = format!("{}:{}", String::from_utf8_lossy(record.qname()), rg);
        AlignedRead {
            chrom: chrom.to_string(),
            ref_start: record.pos(),
            ref_end: record.reference_end(),
            mapq: record.mapq(),
            flag: record.flags(),
            is_reverse: record.is_reverse(),
            cigar: record.cigar().iter().copied().collect(),
            seq: record.seq().as_bytes(),
            sa,
            read_tag,
        }
    }

    /// Query length from the CIGAR, excluding hard clips.
    pub fn query_length(&self) -> i64 {
        cigar::inferred_read_length(&self.cigar)
    }

    /// Primary, unpaired, non-supplementary, non-duplicate alignment.
    pub fn is_primary(&self) -> bool {
        self.flag == 0 || self.flag == 16
    }
}

/// Extract every SV signature carried by `read`.
pub fn signatures_from_read(read: &AlignedRead, params: &ExtractParams) -> Vec<Signature> {
    let mut out = Vec::new();
    if read.query_length() < params.min_read_len {
        return out;
    }
    if is_false_1d2(read) {
        return out;
    }

    let mut ins_sigs: Vec<(i64, i64, String)> = Vec::new();
    let mut del_sigs: Vec<(i64, i64)> = Vec::new();
    let mut softclip_left: i64 = 0;
    let mut softclip_right: i64 = 0;

    if read.mapq >= params.min_mapq {
        let pos_start = read.ref_start;
        let mut shift_del: i64 = 0;
        let mut shift_ins: i64 = 0;
        // read-coordinate cursor for slicing inserted sequence; advances on
        // every operation except deletions
        let mut shift_ins_read: i64 = 0;
        let mut hardclip_left: i64 = 0;
        let mut hardclip_right: i64 = 0;
        if let Some(first) = read.cigar.first() {
            softclip_left = cigar::soft_clip(first);
            hardclip_left = cigar::hard_clip(first);
        }

        for op in &read.cigar {
            let len = i64::from(op.len());
            match op {
                Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_) => shift_del += len,
                Cigar::Del(_) => {
                    if len >= params.min_siglength {
                        del_sigs.push((pos_start + shift_del, len));
                    }
                    shift_del += len;
                }
                _ => {}
            }

            if !matches!(op, Cigar::Del(_)) {
                shift_ins_read += len;
            }
            if matches!(
                op,
                Cigar::Match(_) | Cigar::Del(_) | Cigar::Equal(_) | Cigar::Diff(_)
            ) {
                shift_ins += len;
            }
            if matches!(op, Cigar::Ins(_)) && len >= params.min_siglength {
                let seq = slice_seq(
                    &read.seq,
                    shift_ins_read - len - hardclip_left,
                    shift_ins_read - hardclip_left,
                );
                ins_sigs.push((pos_start + shift_ins, len, seq));
            }
        }

        if let Some(last) = read.cigar.last() {
            softclip_right = cigar::soft_clip(last);
            hardclip_right = cigar::hard_clip(last);
        }
        if hardclip_left != 0 {
            softclip_left = hardclip_left;
        }
        if hardclip_right != 0 {
            softclip_right = hardclip_right;
        }
    }

    combine_ins(
        ins_sigs,
        &read.chrom,
        &read.read_tag,
        params.merge_ins_threshold,
        &mut out,
    );
    combine_del(
        del_sigs,
        &read.chrom,
        &read.read_tag,
        params.merge_del_threshold,
        &mut out,
    );

    if read.is_primary() {
        let primary = if read.mapq >= params.min_mapq {
            let query_length = read.query_length();
            let (read_start, read_end) = if read.is_reverse {
                (softclip_right, query_length - softclip_left)
            } else {
                (softclip_left, query_length - softclip_right)
            };
            Some(split::SplitSegment {
                read_start,
                read_end,
                ref_start: read.ref_start,
                ref_end: read.ref_end,
                chrom: read.chrom.clone(),
                forward: !read.is_reverse,
            })
        } else {
            None
        };
        if let Some(sa) = &read.sa {
            split::analyze_split_read(
                primary,
                sa,
                read.query_length(),
                &read.seq,
                &read.read_tag,
                params,
                &mut out,
            );
        }
    }

    out
}

/// A false 1d2 read is aligned in two overlapping parts on opposite strands
/// of the same chromosome: the primary span overlaps a not-shorter
/// supplementary span for at least 95% of the shorter one. Such reads carry
/// no usable SV signal.
pub fn is_false_1d2(read: &AlignedRead) -> bool {
    const OVERLAP_THRESHOLD: f64 = 0.95;
    let Some(sa) = &read.sa else {
        return false;
    };
    let ref_span = read.ref_end - read.ref_start;
    for entry in sa.trim_end_matches(';').split(';') {
        let fields: Vec<&str> = entry.split(',').collect();
        if fields.len() < 5 {
            continue;
        }
        if fields[0] != read.chrom {
            continue;
        }
        let sa_forward = fields[2] == "+";
        if sa_forward == !read.is_reverse {
            continue;
        }
        let Ok(sa_pos) = fields[1].parse::<i64>() else {
            continue;
        };
        let sa_start = sa_pos - 1;
        let Ok(sa_cigar) = cigar::scan_sa_cigar(fields[3]) else {
            continue;
        };
        if ref_span > sa_cigar.ref_len {
            continue;
        }
        let sa_end = sa_start + sa_cigar.ref_len;
        let overlap = read.ref_end.min(sa_end) - read.ref_start.max(sa_start);
        let shorter = ref_span.min(sa_cigar.ref_len);
        if shorter <= 0 {
            continue;
        }
        if overlap as f64 / shorter as f64 >= OVERLAP_THRESHOLD {
            return true;
        }
    }
    false
}

/// Collapse consecutive insertion signals whose gap to the previously merged
/// position stays within `merge_dis`. Lengths are summed, sequences
/// concatenated; the reported position is the last merged one.
fn combine_ins(
    sigs: Vec<(i64, i64, String)>,
    chrom: &str,
    read_tag: &str,
    merge_dis: i64,
    out: &mut Vec<Signature>,
) {
    let mut iter = sigs.into_iter();
    let Some((mut cur_pos, mut cur_len, mut cur_seq)) = iter.next() else {
        return;
    };
    for (pos, len, seq) in iter {
        if pos - cur_pos <= merge_dis {
            cur_len += len;
            cur_seq.push_str(&seq);
            cur_pos = pos;
        } else {
            out.push(Signature::Ins {
                chrom: chrom.to_string(),
                pos: cur_pos,
                len: cur_len,
                read: read_tag.to_string(),
                seq: cur_seq,
            });
            cur_pos = pos;
            cur_len = len;
            cur_seq = seq;
        }
    }
    out.push(Signature::Ins {
        chrom: chrom.to_string(),
        pos: cur_pos,
        len: cur_len,
        read: read_tag.to_string(),
        seq: cur_seq,
    });
}

/// Collapse consecutive deletion signals. The merge anchor for an open run is
/// the end (`pos + len`) of the last merged deletion; after a flush the
/// anchor restarts at the new signal's bare position. The reported position
/// is the first member's.
fn combine_del(
    sigs: Vec<(i64, i64)>,
    chrom: &str,
    read_tag: &str,
    merge_dis: i64,
    out: &mut Vec<Signature>,
) {
    let mut iter = sigs.into_iter();
    let Some((first_pos, first_len)) = iter.next() else {
        return;
    };
    let mut rep_pos = first_pos;
    let mut cur_len = first_len;
    let mut anchor = first_pos + first_len;
    for (pos, len) in iter {
        if pos - anchor <= merge_dis {
            cur_len += len;
            anchor = pos + len;
        } else {
            out.push(Signature::Del {
                chrom: chrom.to_string(),
                pos: rep_pos,
                len: cur_len,
                read: read_tag.to_string(),
            });
            rep_pos = pos;
            cur_len = len;
            anchor = pos;
        }
    }
    out.push(Signature::Del {
        chrom: chrom.to_string(),
        pos: rep_pos,
        len: cur_len,
        read: read_tag.to_string(),
    });
}

/// Python-style clamped slice of the stored sequence. Out-of-range or
/// inverted bounds yield an empty string, as does an absent sequence.
pub(crate) fn slice_seq(seq: &[u8], start: i64, end: i64) -> String {
    if seq.is_empty() {
        return String::new();
    }
    let n = seq.len() as i64;
    let s = start.clamp(0, n);
    let e = end.clamp(0, n);
    if s >= e {
        return String::new();
    }
    String::from_utf8_lossy(&seq[s as usize..e as usize]).into_owned()
}
