//! # VCF output
//!
//! Textual VCFv4.2 writer for the genotyped calls. Breakend ALT notation and
//! the field layout are assembled by hand; the reference genome supplies
//! REF alleles (falling back to `N` where it cannot).
use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
};

use anyhow::{Context, Result};
use log::debug;
use rust_htslib::faidx;

use crate::{genotype::SvCall, signature::SvType};

/// The VCF ALT lines to be included in the header.
const VCF_ALT_LINES: &[&str] = &[
    r#"##ALT=<ID=INS,Description="Insertion of novel sequence relative to the reference">"#,
    r#"##ALT=<ID=DEL,Description="Deletion relative to the reference">"#,
    r#"##ALT=<ID=DUP,Description="Region of elevated copy number relative to the reference">"#,
    r#"##ALT=<ID=INV,Description="Inversion of reference sequence">"#,
    r#"##ALT=<ID=BND,Description="Breakend of translocation">"#,
];

/// The VCF info lines to be included in the header.
const VCF_INFO_LINES: &[&str] = &[
    r#"##INFO=<ID=PRECISE,Number=0,Type=Flag,Description="Precise structural variant">"#,
    r#"##INFO=<ID=IMPRECISE,Number=0,Type=Flag,Description="Imprecise structural variant">"#,
    r#"##INFO=<ID=SVTYPE,Number=1,Type=String,Description="Type of structural variant">"#,
    r#"##INFO=<ID=SVLEN,Number=1,Type=Integer,Description="Difference in length between REF and ALT alleles">"#,
    r#"##INFO=<ID=END,Number=1,Type=Integer,Description="End position of the variant described in this record">"#,
    r#"##INFO=<ID=CIPOS,Number=2,Type=Integer,Description="Confidence interval around POS">"#,
    r#"##INFO=<ID=CILEN,Number=2,Type=Integer,Description="Confidence interval around inserted/deleted material between breakends">"#,
    r#"##INFO=<ID=RE,Number=1,Type=Integer,Description="Number of reads supporting this record">"#,
    r#"##INFO=<ID=STRAND,Number=A,Type=String,Description="Strand orientation of the adjacency in BEDPE format (DEL:+-, DUP:-+, INV:++/--)">"#,
    r#"##INFO=<ID=RNAMES,Number=.,Type=String,Description="Supporting read names of SVs (comma separated)">"#,
    r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Allele frequency">"#,
];

/// The VCF filter lines to be included in the header.
const VCF_FILTER_LINES: &[&str] = &[r#"##FILTER=<ID=q5,Description="Quality below 5">"#];

/// The VCF format lines to be included in the header.
const VCF_FORMAT_LINES: &[&str] = &[
    r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#,
    r#"##FORMAT=<ID=DR,Number=1,Type=Integer,Description="Number of high-quality reference reads">"#,
    r#"##FORMAT=<ID=DV,Number=1,Type=Integer,Description="Number of high-quality variant reads">"#,
    r#"##FORMAT=<ID=PL,Number=G,Type=Integer,Description="Phred-scaled genotype likelihoods rounded to the closest integer">"#,
    r#"##FORMAT=<ID=GQ,Number=1,Type=Integer,Description="Genotype quality">"#,
];

#[derive(Debug, Clone)]
pub struct VcfOptions {
    pub sample: String,
    pub genotype: bool,
    pub report_readid: bool,
    pub min_size: i64,
    /// `-1` disables the upper bound.
    pub max_size: i64,
    /// Deletions longer than this report a symbolic ALT instead of the full
    /// reference allele.
    pub max_ref_allele: i64,
}

/// Write the final calls, already sorted, to `output`.
pub fn write_vcf(
    output: &str,
    reference_path: &str,
    contigs: &[(String, u64)],
    calls: &[SvCall],
    opts: &VcfOptions,
) -> Result<()> {
    let reference = faidx::Reader::from_path(reference_path)
        .with_context(|| format!("Could not open reference {reference_path}"))?;
    let file = File::create(output).with_context(|| format!("Could not create {output}"))?;
    let mut w = BufWriter::new(file);

    write_header(&mut w, contigs, &opts.sample)?;

    let mut id_counters: HashMap<&'static str, usize> = HashMap::new();
    for call in calls {
        let len = call.candidate.len;
        if matches!(
            call.candidate.sv_type,
            SvType::Ins | SvType::Del | SvType::Dup | SvType::Inv
        ) && opts.max_size != -1
            && len.abs() > opts.max_size
        {
            debug!("Skipping call of size {} above --max-size", len.abs());
            continue;
        }
        if matches!(call.candidate.sv_type, SvType::Ins | SvType::Del) && len.abs() < opts.min_size
        {
            debug!("Skipping call of size {} below --min-size", len.abs());
            continue;
        }
        match call.candidate.sv_type {
            SvType::Ins | SvType::Del => write_indel(&mut w, &reference, call, opts, &mut id_counters)?,
            SvType::Dup | SvType::Inv => {
                write_symbolic(&mut w, &reference, call, opts, &mut id_counters)?
            }
            SvType::Tra => write_bnd(&mut w, &reference, call, opts, &mut id_counters)?,
        }
    }

    w.flush()?;
    Ok(())
}

fn write_header(w: &mut impl Write, contigs: &[(String, u64)], sample: &str) -> Result<()> {
    writeln!(w, "##fileformat=VCFv4.2")?;
    writeln!(w, "##source=longsv-{}", env!("CARGO_PKG_VERSION"))?;
    for (name, length) in contigs {
        writeln!(w, "##contig=<ID={name},length={length}>")?;
    }
    for line in VCF_ALT_LINES
        .iter()
        .chain(VCF_INFO_LINES)
        .chain(VCF_FILTER_LINES)
        .chain(VCF_FORMAT_LINES)
    {
        writeln!(w, "{line}")?;
    }
    writeln!(
        w,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{sample}"
    )?;
    Ok(())
}

fn write_indel(
    w: &mut impl Write,
    reference: &faidx::Reader,
    call: &SvCall,
    opts: &VcfOptions,
    id_counters: &mut HashMap<&'static str, usize>,
) -> Result<()> {
    let c = &call.candidate;
    let is_ins = c.sv_type == SvType::Ins;
    let (svlen, end) = if is_ins {
        (c.len, c.pos)
    } else {
        (-c.len, c.pos + c.len)
    };

    let mut info = format!(
        "{};SVTYPE={};SVLEN={};END={};CIPOS={};CILEN={};RE={};RNAMES={}",
        precision(&call.gt),
        c.sv_type,
        svlen,
        end,
        c.cipos,
        c.cilen,
        call.dv,
        rnames(call, opts),
    );
    if opts.genotype {
        info.push_str(&af_field(call));
    }
    if !is_ins {
        info.push_str(";STRAND=+-");
    }

    let anchor = (c.pos - 1).max(0);
    let anchor_base = fetch_base(reference, &c.chrom, anchor);
    let (ref_allele, alt_allele) = if is_ins {
        let seq = c.seq.as_deref().unwrap_or("");
        let base = anchor_base.unwrap_or_else(|| "N".to_string());
        if seq.is_empty() {
            (base, "<INS>".to_string())
        } else {
            (base.clone(), format!("{base}{seq}"))
        }
    } else if c.len <= opts.max_ref_allele {
        match fetch_range(reference, &c.chrom, anchor, c.pos + c.len - 1) {
            Some(slice) => {
                let base = anchor_base.unwrap_or_else(|| "N".to_string());
                (slice, base)
            }
            None => ("N".to_string(), "<DEL>".to_string()),
        }
    } else {
        let base = anchor_base.unwrap_or_else(|| "N".to_string());
        (base, "<DEL>".to_string())
    };

    write_record(
        w,
        &c.chrom,
        c.pos,
        next_id(id_counters, c.sv_type),
        &ref_allele,
        &alt_allele,
        call,
        &info,
    )
}

fn write_symbolic(
    w: &mut impl Write,
    reference: &faidx::Reader,
    call: &SvCall,
    opts: &VcfOptions,
    id_counters: &mut HashMap<&'static str, usize>,
) -> Result<()> {
    let c = &call.candidate;
    let end = c.pos + 1 + c.len;
    let strand = match c.sv_type {
        SvType::Dup => "-+".to_string(),
        _ => c
            .strands
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| ".".to_string()),
    };
    let mut info = format!(
        "{};SVTYPE={};SVLEN={};END={};RE={};STRAND={};RNAMES={}",
        precision(&call.gt),
        c.sv_type,
        c.len,
        end,
        call.dv,
        strand,
        rnames(call, opts),
    );
    if opts.genotype {
        info.push_str(&af_field(call));
    }

    let ref_allele = fetch_base(reference, &c.chrom, c.pos).unwrap_or_else(|| "N".to_string());
    let alt_allele = format!("<{}>", c.sv_type);
    write_record(
        w,
        &c.chrom,
        c.pos + 1,
        next_id(id_counters, c.sv_type),
        &ref_allele,
        &alt_allele,
        call,
        &info,
    )
}

fn write_bnd(
    w: &mut impl Write,
    reference: &faidx::Reader,
    call: &SvCall,
    opts: &VcfOptions,
    id_counters: &mut HashMap<&'static str, usize>,
) -> Result<()> {
    let c = &call.candidate;
    let Some((form, chrom2, pos2)) = &c.mate else {
        debug!("Breakend candidate without a mate at {}:{}", c.chrom, c.pos);
        return Ok(());
    };
    let mut info = format!(
        "{};SVTYPE=BND;RE={};RNAMES={}",
        precision(&call.gt),
        call.dv,
        rnames(call, opts),
    );
    if opts.genotype {
        info.push_str(&af_field(call));
    }

    let ref_allele = fetch_base(reference, &c.chrom, c.pos).unwrap_or_else(|| "N".to_string());
    let alt_allele = form.alt(chrom2, *pos2);
    write_record(
        w,
        &c.chrom,
        c.pos + 1,
        next_id(id_counters, c.sv_type),
        &ref_allele,
        &alt_allele,
        call,
        &info,
    )
}

#[allow(clippy::too_many_arguments)]
fn write_record(
    w: &mut impl Write,
    chrom: &str,
    pos: i64,
    id: String,
    ref_allele: &str,
    alt_allele: &str,
    call: &SvCall,
    info: &str,
) -> Result<()> {
    let qual = match call.qual {
        Some(q) => format!("{q:.1}"),
        None => ".".to_string(),
    };
    let filter = match call.qual {
        None => "PASS",
        Some(q) if q >= 5.0 => "PASS",
        Some(_) => "q5",
    };
    let dr = match call.dr {
        Some(dr) => dr.to_string(),
        None => ".".to_string(),
    };
    writeln!(
        w,
        "{chrom}\t{pos}\t{id}\t{ref_allele}\t{alt_allele}\t{qual}\t{filter}\t{info}\tGT:DR:DV:PL:GQ\t{}:{}:{}:{}:{}",
        call.gt, dr, call.dv, call.pl, call.gq
    )?;
    Ok(())
}

/// Per-type running IDs, `cuteSV.<TYPE>.<n>` counted from zero.
fn next_id(id_counters: &mut HashMap<&'static str, usize>, sv_type: SvType) -> String {
    let label = match sv_type {
        SvType::Tra => "BND",
        other => other.as_str(),
    };
    let n = id_counters.entry(label).or_insert(0);
    let id = format!("cuteSV.{label}.{n}");
    *n += 1;
    id
}

fn precision(gt: &str) -> &'static str {
    if gt == "0/0" {
        "IMPRECISE"
    } else {
        "PRECISE"
    }
}

fn rnames(call: &SvCall, opts: &VcfOptions) -> String {
    if opts.report_readid {
        call.candidate.support.join(",")
    } else {
        "NULL".to_string()
    }
}

fn af_field(call: &SvCall) -> String {
    let Some(dr) = call.dr else {
        return ";AF=.".to_string();
    };
    let total = call.dv + dr;
    if total == 0 {
        return ";AF=.".to_string();
    }
    let af = (call.dv as f64 / total as f64 * 10_000.0).round() / 10_000.0;
    if af == af.trunc() {
        format!(";AF={af:.1}")
    } else {
        format!(";AF={af}")
    }
}

/// One reference base at a 0-based position, `None` when the contig or the
/// position is unavailable.
fn fetch_base(reference: &faidx::Reader, chrom: &str, pos: i64) -> Option<String> {
    fetch_range(reference, chrom, pos, pos)
}

/// 0-based inclusive reference range.
fn fetch_range(reference: &faidx::Reader, chrom: &str, start: i64, end: i64) -> Option<String> {
    if start < 0 || end < start {
        return None;
    }
    match reference.fetch_seq_string(chrom, start as usize, end as usize) {
        Ok(seq) if !seq.is_empty() => Some(seq),
        _ => None,
    }
}
