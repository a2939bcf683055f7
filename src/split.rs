//! # Split-read geometry
//!
//! A read aligned in several parts describes its own rearrangement: the way
//! the parts tile the read versus the reference decides between INS, DEL,
//! DUP, INV and translocation breakends. Segments come from the primary
//! alignment plus the `SA` tag entries; everything below operates on
//! [`SplitSegment`] descriptors in read coordinates so reverse-strand reads
//! can be reflected through the read length and handled uniformly.
//!
//! The multi-segment control flow (triple slide, last-triple reassignment,
//! strand reflection) intentionally mirrors long-standing caller behaviour,
//! including its odd corners; regression tests pin it down.
use log::debug;

use crate::{
    extract::{slice_seq, ExtractParams},
    signature::{BndForm, Signature, StrandPair},
    utils::cigar,
};

/// One aligned part of a split read.
/// `read_start`/`read_end` are offsets on the query (hard clips excluded),
/// `ref_start`/`ref_end` the half-open reference span.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSegment {
    pub read_start: i64,
    pub read_end: i64,
    pub ref_start: i64,
    pub ref_end: i64,
    pub chrom: String,
    pub forward: bool,
}

impl SplitSegment {
    /// Mirror the read-coordinate span through the read length.
    fn reflected(&self, read_len: i64) -> SplitSegment {
        SplitSegment {
            read_start: read_len - self.read_end,
            read_end: read_len - self.read_start,
            ..self.clone()
        }
    }
}

/// Build the segment list and run the split-read analysis for one primary
/// alignment. `primary` is `None` when the primary itself failed the mapping
/// quality gate; `SA` entries are gated individually.
pub fn analyze_split_read(
    primary: Option<SplitSegment>,
    sa_tag: &str,
    read_len: i64,
    query: &[u8],
    read_tag: &str,
    params: &ExtractParams,
    out: &mut Vec<Signature>,
) {
    let mut segs: Vec<SplitSegment> = Vec::new();
    if let Some(p) = primary {
        segs.push(p);
    }
    for entry in sa_tag.trim_end_matches(';').split(';') {
        let fields: Vec<&str> = entry.split(',').collect();
        if fields.len() < 5 {
            debug!("Skipping malformed SA entry '{entry}' of read {read_tag}");
            continue;
        }
        let (Ok(sa_pos), Ok(sa_mapq)) = (fields[1].parse::<i64>(), fields[4].parse::<i64>()) else {
            debug!("Skipping malformed SA entry '{entry}' of read {read_tag}");
            continue;
        };
        if sa_mapq < i64::from(params.min_mapq) {
            continue;
        }
        let sa_cigar = match cigar::scan_sa_cigar(fields[3]) {
            Ok(c) => c,
            Err(e) => {
                debug!("Skipping SA entry of read {read_tag}: {e}");
                continue;
            }
        };
        let (read_start, read_end) = if fields[2] == "+" {
            (sa_cigar.clip_left, read_len - sa_cigar.clip_right)
        } else {
            (sa_cigar.clip_right, read_len - sa_cigar.clip_left)
        };
        segs.push(SplitSegment {
            read_start,
            read_end,
            ref_start: sa_pos - 1,
            ref_end: sa_pos - 1 + sa_cigar.ref_len,
            chrom: fields[0].to_string(),
            forward: fields[2] == "+",
        });
    }

    if params.max_split_parts != -1 && segs.len() as i64 > params.max_split_parts {
        debug!(
            "Read {read_tag} split into {} parts, above the cap; skipping split analysis",
            segs.len()
        );
        return;
    }
    segs.sort_by_key(|s| s.read_start);

    let mut query = query.to_vec();
    match segs.len() {
        0 | 1 => {}
        2 => analyze_pair(&segs, read_len, &mut query, read_tag, params, out),
        _ => analyze_multi(&segs, read_len, &mut query, read_tag, params, out),
    }
}

fn analyze_pair(
    segs: &[SplitSegment],
    read_len: i64,
    query: &mut Vec<u8>,
    read_tag: &str,
    params: &ExtractParams,
    out: &mut Vec<Signature>,
) {
    let e1 = &segs[0];
    let e2 = &segs[1];
    if e1.chrom != e2.chrom {
        emit_bnd(e1, e2, read_tag, out);
        return;
    }
    if e1.forward != e2.forward {
        emit_inv(e1, e2, read_tag, params.sv_size, out);
        return;
    }
    let (e1, e2) = if e1.forward {
        (e1.clone(), e2.clone())
    } else {
        query.reverse();
        (segs[1].reflected(read_len), segs[0].reflected(read_len))
    };
    emit_dup_or_ins(&e1, &e2, query, read_tag, params, out);
    emit_indel_between(&e1, &e2, query, read_tag, params, None, out);
}

fn analyze_multi(
    segs: &[SplitSegment],
    read_len: i64,
    query: &mut Vec<u8>,
    read_tag: &str,
    params: &ExtractParams,
    out: &mut Vec<Signature>,
) {
    let n = segs.len();
    let mut trigger_ins_tra = false;

    for a in 0..n - 2 {
        let mut e1 = segs[a].clone();
        let mut e2 = segs[a + 1].clone();
        let e3_orig = segs[a + 2].clone();
        let mut e3: Option<SplitSegment> = Some(e3_orig.clone());
        let last = a == n - 3;

        if e1.chrom != e2.chrom {
            trigger_ins_tra = true;
            emit_bnd(&e1, &e2, read_tag, out);
            if last && e2.chrom != e3_orig.chrom {
                emit_bnd(&e2, &e3_orig, read_tag, out);
            }
            continue;
        }
        if e2.chrom != e3_orig.chrom {
            continue;
        }

        // +-+ / -+- : a fully inverted middle segment gives a paired
        // head-to-head + tail-to-tail signal
        if e1.forward == e3_orig.forward && e1.forward != e2.forward {
            if !e2.forward {
                let d = (e3_orig.ref_start - e1.ref_end) as f64;
                if e2.read_start as f64 + 0.5 * d >= e1.read_end as f64
                    && e3_orig.read_start as f64 + 0.5 * d >= e2.read_end as f64
                    && e2.ref_start >= e1.ref_end
                    && e3_orig.ref_start >= e2.ref_end
                {
                    out.push(Signature::Inv {
                        chrom: e1.chrom.clone(),
                        strands: StrandPair::HeadToHead,
                        pos1: e1.ref_end,
                        pos2: e2.ref_end,
                        read: read_tag.to_string(),
                    });
                    out.push(Signature::Inv {
                        chrom: e1.chrom.clone(),
                        strands: StrandPair::TailToTail,
                        pos1: e2.ref_start,
                        pos2: e3_orig.ref_start,
                        read: read_tag.to_string(),
                    });
                }
            } else {
                let d = (e1.ref_start - e3_orig.ref_end) as f64;
                if e1.read_end as f64 <= e2.read_start as f64 + 0.5 * d
                    && e3_orig.read_start as f64 + 0.5 * d >= e2.read_end as f64
                    && e2.ref_start - e3_orig.ref_end >= -50
                    && e1.ref_start - e2.ref_end >= -50
                {
                    out.push(Signature::Inv {
                        chrom: e1.chrom.clone(),
                        strands: StrandPair::HeadToHead,
                        pos1: e3_orig.ref_end,
                        pos2: e2.ref_end,
                        read: read_tag.to_string(),
                    });
                    out.push(Signature::Inv {
                        chrom: e1.chrom.clone(),
                        strands: StrandPair::TailToTail,
                        pos1: e2.ref_start,
                        pos2: e1.ref_start,
                        read: read_tag.to_string(),
                    });
                }
            }
        }

        if last && e1.forward != e3_orig.forward {
            if e2.forward == e1.forward {
                emit_inv(&e2, &e3_orig, read_tag, params.sv_size, out);
            } else {
                emit_inv(&e1, &e2, read_tag, params.sv_size, out);
            }
        }

        if e1.forward == e3_orig.forward && e1.forward == e2.forward {
            if !e1.forward {
                e1 = segs[a + 2].reflected(read_len);
                e2 = segs[a + 1].reflected(read_len);
                e3 = Some(segs[a].reflected(read_len));
                query.reverse();
            }
            let Some(e3v) = e3.clone() else { continue };

            if e2.ref_end - e3v.ref_start >= params.sv_size && e2.ref_start < e3v.ref_end {
                out.push(Signature::Dup {
                    chrom: e2.chrom.clone(),
                    start: e3v.ref_start,
                    end: e2.ref_end,
                    read: read_tag.to_string(),
                });
            }
            if a == 0 && e1.ref_end - e2.ref_start >= params.sv_size {
                out.push(Signature::Dup {
                    chrom: e2.chrom.clone(),
                    start: e2.ref_start,
                    end: e1.ref_end,
                    read: read_tag.to_string(),
                });
            }

            emit_indel_between(&e1, &e2, query, read_tag, params, Some(&e3v), out);

            if last {
                // the closing pair of the read re-runs the INS/DEL rules
                // with the segments shifted by one
                e1 = e2.clone();
                e2 = e3v;
                emit_indel_between(&e1, &e2, query, read_tag, params, None, out);
            }
        }

        if last
            && e1.forward != e2.forward
            && e3.as_ref().is_some_and(|e3v| e2.forward == e3v.forward)
        {
            if let Some(e3v) = e3.take() {
                e1 = e2.clone();
                e2 = e3v;
            }
        }
        let tail_pair = match &e3 {
            None => true,
            Some(e3v) => e1.forward == e2.forward && e2.forward != e3v.forward,
        };
        if tail_pair {
            if !e1.forward {
                // reflection rebuilds from the raw segment list; for some
                // strand patterns this pairs a+2 with a+1 rather than the
                // segments currently in hand (see DESIGN.md, kept as-is)
                e1 = segs[a + 2].reflected(read_len);
                e2 = segs[a + 1].reflected(read_len);
                query.reverse();
            }
            emit_indel_between(&e1, &e2, query, read_tag, params, None, out);
        }
    }

    // a read that leaves and re-enters the same chromosome may still carry a
    // plain insertion or duplication between its outermost segments
    if trigger_ins_tra {
        let first = &segs[0];
        let final_seg = &segs[n - 1];
        if first.chrom == final_seg.chrom && first.forward == final_seg.forward {
            let (e1, e2) = if first.forward {
                (first.clone(), final_seg.clone())
            } else {
                query.reverse();
                (final_seg.reflected(read_len), first.reflected(read_len))
            };
            let dis_ref = e2.ref_start - e1.ref_end;
            let dis_read = e2.read_start - e1.read_end;
            let size = dis_read - dis_ref;
            if dis_ref < 100 && size >= params.sv_size && (size <= params.max_size || params.max_size == -1)
            {
                let half = dis_ref / 2;
                out.push(Signature::Ins {
                    chrom: e2.chrom.clone(),
                    pos: e2.ref_start.min(e1.ref_end),
                    len: size,
                    read: read_tag.to_string(),
                    seq: slice_seq(query, e1.read_end + half, e2.read_start - half),
                });
            }
            if dis_ref <= -params.sv_size {
                out.push(Signature::Dup {
                    chrom: e2.chrom.clone(),
                    start: e2.ref_start,
                    end: e1.ref_end,
                    read: read_tag.to_string(),
                });
            }
        }
    }
}

/// Head-to-head / tail-to-tail inversion signal from an opposite-strand pair.
fn emit_inv(
    e1: &SplitSegment,
    e2: &SplitSegment,
    read_tag: &str,
    sv_size: i64,
    out: &mut Vec<Signature>,
) {
    if e1.forward {
        if e1.ref_end - e2.ref_end >= sv_size
            && e2.read_start as f64 + 0.5 * (e1.ref_end - e2.ref_end) as f64 >= e1.read_end as f64
        {
            out.push(Signature::Inv {
                chrom: e1.chrom.clone(),
                strands: StrandPair::HeadToHead,
                pos1: e2.ref_end,
                pos2: e1.ref_end,
                read: read_tag.to_string(),
            });
        }
        if e2.ref_end - e1.ref_end >= sv_size
            && e2.read_start as f64 + 0.5 * (e2.ref_end - e1.ref_end) as f64 >= e1.read_end as f64
        {
            out.push(Signature::Inv {
                chrom: e1.chrom.clone(),
                strands: StrandPair::HeadToHead,
                pos1: e1.ref_end,
                pos2: e2.ref_end,
                read: read_tag.to_string(),
            });
        }
    } else {
        if e2.ref_start - e1.ref_start >= sv_size
            && e2.read_start as f64 + 0.5 * (e2.ref_start - e1.ref_start) as f64 >= e1.read_end as f64
        {
            out.push(Signature::Inv {
                chrom: e1.chrom.clone(),
                strands: StrandPair::TailToTail,
                pos1: e1.ref_start,
                pos2: e2.ref_start,
                read: read_tag.to_string(),
            });
        }
        if e1.ref_start - e2.ref_start >= sv_size
            && e2.read_start as f64 + 0.5 * (e1.ref_start - e2.ref_start) as f64 >= e1.read_end as f64
        {
            out.push(Signature::Inv {
                chrom: e1.chrom.clone(),
                strands: StrandPair::TailToTail,
                pos1: e2.ref_start,
                pos2: e1.ref_start,
                read: read_tag.to_string(),
            });
        }
    }
}

/// Breakend pair across chromosomes. The adjacency is only trusted when the
/// two parts sit within 100 bp of each other on the read.
fn emit_bnd(e1: &SplitSegment, e2: &SplitSegment, read_tag: &str, out: &mut Vec<Signature>) {
    if e2.read_start - e1.read_end > 100 {
        return;
    }
    let read = read_tag.to_string();
    let sig = match (e1.forward, e2.forward) {
        (true, true) => {
            if e1.chrom < e2.chrom {
                Signature::Tra {
                    chrom1: e1.chrom.clone(),
                    form: BndForm::A,
                    pos1: e1.ref_end,
                    chrom2: e2.chrom.clone(),
                    pos2: e2.ref_start,
                    read,
                }
            } else {
                Signature::Tra {
                    chrom1: e2.chrom.clone(),
                    form: BndForm::D,
                    pos1: e2.ref_start,
                    chrom2: e1.chrom.clone(),
                    pos2: e1.ref_end,
                    read,
                }
            }
        }
        (true, false) => {
            if e1.chrom < e2.chrom {
                Signature::Tra {
                    chrom1: e1.chrom.clone(),
                    form: BndForm::B,
                    pos1: e1.ref_end,
                    chrom2: e2.chrom.clone(),
                    pos2: e2.ref_end,
                    read,
                }
            } else {
                Signature::Tra {
                    chrom1: e2.chrom.clone(),
                    form: BndForm::B,
                    pos1: e2.ref_end,
                    chrom2: e1.chrom.clone(),
                    pos2: e1.ref_end,
                    read,
                }
            }
        }
        (false, true) => {
            if e1.chrom < e2.chrom {
                Signature::Tra {
                    chrom1: e1.chrom.clone(),
                    form: BndForm::C,
                    pos1: e1.ref_start,
                    chrom2: e2.chrom.clone(),
                    pos2: e2.ref_start,
                    read,
                }
            } else {
                Signature::Tra {
                    chrom1: e2.chrom.clone(),
                    form: BndForm::C,
                    pos1: e2.ref_start,
                    chrom2: e1.chrom.clone(),
                    pos2: e1.ref_start,
                    read,
                }
            }
        }
        (false, false) => {
            if e1.chrom < e2.chrom {
                Signature::Tra {
                    chrom1: e1.chrom.clone(),
                    form: BndForm::D,
                    pos1: e1.ref_start,
                    chrom2: e2.chrom.clone(),
                    pos2: e2.ref_end,
                    read,
                }
            } else {
                Signature::Tra {
                    chrom1: e2.chrom.clone(),
                    form: BndForm::A,
                    pos1: e2.ref_end,
                    chrom2: e1.chrom.clone(),
                    pos2: e1.ref_start,
                    read,
                }
            }
        }
    };
    out.push(sig);
}

/// Overlapping same-strand pair: the reference overlap either marks a tandem
/// duplication, or (when the read gap outgrows it) a plain insertion in
/// duplicated context.
fn emit_dup_or_ins(
    e1: &SplitSegment,
    e2: &SplitSegment,
    query: &[u8],
    read_tag: &str,
    params: &ExtractParams,
    out: &mut Vec<Signature>,
) {
    let overlap = e1.ref_end - e2.ref_start;
    if overlap < params.sv_size {
        return;
    }
    if e2.read_start - e1.read_end >= overlap {
        let half = overlap / 2;
        out.push(Signature::Ins {
            chrom: e2.chrom.clone(),
            pos: (e1.ref_end + e2.ref_start) / 2,
            len: e2.read_start + e1.ref_end - e2.ref_start - e1.read_end,
            read: read_tag.to_string(),
            seq: slice_seq(query, e1.read_end + half, e2.read_start - half),
        });
    } else {
        out.push(Signature::Dup {
            chrom: e2.chrom.clone(),
            start: e2.ref_start,
            end: e1.ref_end,
            read: read_tag.to_string(),
        });
    }
}

/// INS/DEL between a same-strand pair. `following` optionally requires the
/// next segment to resume at or after `e2`'s reference end before anything
/// is emitted.
fn emit_indel_between(
    e1: &SplitSegment,
    e2: &SplitSegment,
    query: &[u8],
    read_tag: &str,
    params: &ExtractParams,
    following: Option<&SplitSegment>,
    out: &mut Vec<Signature>,
) {
    let gap = (e1.ref_end - e2.ref_start) as f64;
    let guard_ok = following.map_or(true, |e3| e3.ref_start >= e2.ref_end);

    let delta_ins = e2.read_start + e1.ref_end - e2.ref_start - e1.read_end;
    if gap < (params.sv_size as f64).max(delta_ins as f64 / 5.0)
        && delta_ins >= params.sv_size
        && (e2.ref_start - e1.ref_end) as f64 <= 100f64.max(delta_ins as f64 / 5.0)
        && (delta_ins <= params.max_size || params.max_size == -1)
        && guard_ok
    {
        let half = (e2.ref_start - e1.ref_end) / 2;
        out.push(Signature::Ins {
            chrom: e2.chrom.clone(),
            pos: (e2.ref_start + e1.ref_end) / 2,
            len: delta_ins,
            read: read_tag.to_string(),
            seq: slice_seq(query, e1.read_end + half, e2.read_start - half),
        });
    }

    let delta_del = e2.ref_start - e2.read_start + e1.read_end - e1.ref_end;
    if gap < (params.sv_size as f64).max(delta_del as f64 / 5.0)
        && delta_del >= params.sv_size
        && (e2.read_start - e1.read_end) as f64 <= 100f64.max(delta_del as f64 / 5.0)
        && (delta_del <= params.max_size || params.max_size == -1)
        && guard_ok
    {
        out.push(Signature::Del {
            chrom: e2.chrom.clone(),
            pos: e1.ref_end,
            len: delta_del,
            read: read_tag.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ExtractParams {
        ExtractParams {
            sv_size: 30,
            min_mapq: 20,
            max_split_parts: 7,
            min_read_len: 100,
            min_siglength: 30,
            merge_del_threshold: 0,
            merge_ins_threshold: 100,
            max_size: 100_000,
        }
    }

    fn seg(rs: i64, re: i64, fs: i64, fe: i64, chrom: &str, forward: bool) -> SplitSegment {
        SplitSegment {
            read_start: rs,
            read_end: re,
            ref_start: fs,
            ref_end: fe,
            chrom: chrom.to_string(),
            forward,
        }
    }

    #[test]
    fn split_pair_deletion() {
        let primary = seg(0, 500, 1000, 1500, "chr1", true);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr1,2001,+,500S500M,60,0;",
            1000,
            &vec![b'A'; 1000],
            "r:",
            &params(),
            &mut out,
        );
        assert_eq!(
            out,
            vec![Signature::Del {
                chrom: "chr1".into(),
                pos: 1500,
                len: 500,
                read: "r:".into(),
            }]
        );
    }

    #[test]
    fn split_pair_insertion_takes_the_read_gap() {
        let primary = seg(0, 500, 1000, 1500, "chr1", true);
        let mut query = vec![b'A'; 500];
        query.extend(vec![b'G'; 200]);
        query.extend(vec![b'A'; 500]);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr1,1501,+,700S500M,60,0;",
            1200,
            &query,
            "r:",
            &params(),
            &mut out,
        );
        assert_eq!(
            out,
            vec![Signature::Ins {
                chrom: "chr1".into(),
                pos: 1500,
                len: 200,
                read: "r:".into(),
                seq: "G".repeat(200),
            }]
        );
    }

    #[test]
    fn split_pair_reverse_strand_reflects_to_the_same_deletion() {
        // both parts on the reverse strand; reflection through the read
        // length recovers the forward geometry of `split_pair_deletion`
        let primary = seg(0, 500, 2000, 2500, "chr1", false);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr1,1001,-,500M500S,60,0;",
            1000,
            &vec![b'A'; 1000],
            "r:",
            &params(),
            &mut out,
        );
        assert_eq!(
            out,
            vec![Signature::Del {
                chrom: "chr1".into(),
                pos: 1500,
                len: 500,
                read: "r:".into(),
            }]
        );
    }

    #[test]
    fn split_pair_overlap_is_a_duplication() {
        let primary = seg(0, 500, 1000, 1500, "chr1", true);
        let mut out = Vec::new();
        // supplementary rewinds 200 bp on the reference
        analyze_split_read(
            Some(primary),
            "chr1,1301,+,500S500M,60,0;",
            1000,
            &vec![b'A'; 1000],
            "r:",
            &params(),
            &mut out,
        );
        assert_eq!(
            out,
            vec![Signature::Dup {
                chrom: "chr1".into(),
                start: 1300,
                end: 1500,
                read: "r:".into(),
            }]
        );
    }

    #[test]
    fn split_pair_across_chromosomes_is_a_breakend() {
        let primary = seg(0, 500, 0, 500, "chr1", true);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr2,2001,+,500S500M,60,0;",
            1000,
            &vec![b'A'; 1000],
            "r:",
            &params(),
            &mut out,
        );
        assert_eq!(
            out,
            vec![Signature::Tra {
                chrom1: "chr1".into(),
                form: BndForm::A,
                pos1: 500,
                chrom2: "chr2".into(),
                pos2: 2000,
                read: "r:".into(),
            }]
        );
    }

    #[test]
    fn inverted_middle_segment_yields_paired_inversions() {
        let primary = seg(0, 100, 100, 200, "chr1", true);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr1,251,-,100S100M100S,60,0;chr1,401,+,200S100M,60,0;",
            300,
            &vec![b'A'; 300],
            "r:",
            &params(),
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                Signature::Inv {
                    chrom: "chr1".into(),
                    strands: StrandPair::HeadToHead,
                    pos1: 200,
                    pos2: 350,
                    read: "r:".into(),
                },
                Signature::Inv {
                    chrom: "chr1".into(),
                    strands: StrandPair::TailToTail,
                    pos1: 250,
                    pos2: 400,
                    read: "r:".into(),
                },
            ]
        );
    }

    #[test]
    fn translocated_insertion_is_recovered_between_outer_segments() {
        let primary = seg(0, 400, 1000, 1400, "chr1", true);
        let mut query = vec![b'A'; 400];
        query.extend(vec![b'G'; 300]);
        query.extend(vec![b'A'; 300]);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr2,5001,+,400S200M400S,60,0;chr1,1451,+,700S300M,60,0;",
            1000,
            &query,
            "r:",
            &params(),
            &mut out,
        );
        let tra: Vec<_> = out
            .iter()
            .filter(|s| matches!(s, Signature::Tra { .. }))
            .collect();
        assert_eq!(tra.len(), 2);
        assert!(out.contains(&Signature::Tra {
            chrom1: "chr1".into(),
            form: BndForm::A,
            pos1: 1400,
            chrom2: "chr2".into(),
            pos2: 5000,
            read: "r:".into(),
        }));
        let ins: Vec<_> = out
            .iter()
            .filter_map(|s| match s {
                Signature::Ins { pos, len, seq, .. } => Some((*pos, *len, seq.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(ins, vec![(1400, 250, String::from_utf8(query[425..675].to_vec()).unwrap())]);
    }

    #[test]
    fn too_many_parts_abort_split_analysis() {
        let primary = seg(0, 100, 100, 200, "chr1", true);
        let mut p = params();
        p.max_split_parts = 2;
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr1,251,-,100S100M100S,60,0;chr1,401,+,200S100M,60,0;",
            300,
            &vec![b'A'; 300],
            "r:",
            &p,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn uniform_triple_emits_duplication_between_backtracking_segments() {
        // third segment rewinds on the reference behind the second
        let primary = seg(0, 400, 1000, 1400, "chr1", true);
        let mut out = Vec::new();
        analyze_split_read(
            Some(primary),
            "chr1,1401,+,400S400M200S,60,0;chr1,1501,+,800S200M,60,0;",
            1000,
            &vec![b'A'; 1000],
            "r:",
            &params(),
            &mut out,
        );
        assert!(out.contains(&Signature::Dup {
            chrom: "chr1".into(),
            start: 1500,
            end: 1800,
            read: "r:".into(),
        }));
    }
}
