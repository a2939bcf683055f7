//! # longsv
//!
//! Library backbone of the `longsv` binary, a structural variant caller for
//! long-read alignments. The pipeline runs in two parallel phases: phase 1
//! scans alignment windows and writes per-window signature shards, phase 2
//! clusters the merged signature streams per chromosome and SV type and
//! genotypes the resulting candidates. Both phases are meant to be called
//! from inside rayon parallel iterators; every worker opens its own
//! alignment reader.
pub mod cli;
pub mod cluster;
pub mod extract;
pub mod genotype;
pub mod io;
pub mod signature;
pub mod split;
pub mod utils;
pub mod work_dir;

use anyhow::{Context, Result};
use log::{debug, info};
use rust_htslib::bam::{self, ext::BamRecordExtensions, Read};

use crate::{
    cli::Cli,
    cluster::{dup::DupSig, indel::IndelSig, inv::InvSig, tra::TraSig, Candidate},
    extract::AlignedRead,
    genotype::SvCall,
    signature::{ReadSpan, Signature, SvType},
    work_dir::WorkDir,
};

/// One phase-1 extraction window, with the include regions intersecting it
/// (`None` when no include file was given).
#[derive(Debug, Clone)]
pub struct Window {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub regions: Option<Vec<(i64, i64)>>,
}

/// Phase-1 worker: scan one window's alignments, extract signatures and read
/// spans, and write the window's shard files. Reads are handled by the
/// window containing their start so no alignment is processed twice.
pub fn scan_window(cli: &Cli, window: &Window, work: &WorkDir) -> Result<()> {
    let mut bam = bam::IndexedReader::from_path(&cli.input)
        .with_context(|| format!("Could not open alignment file {}", cli.input))?;
    bam.fetch((window.chrom.as_str(), window.start, window.end))
        .with_context(|| {
            format!(
                "Could not fetch {}:{}-{}",
                window.chrom, window.start, window.end
            )
        })?;

    let params = cli.extract_params();
    let mut sigs: Vec<Signature> = Vec::new();
    let mut spans: Vec<ReadSpan> = Vec::new();
    let mut record = bam::Record::new();
    while let Some(result) = bam.read(&mut record) {
        result.with_context(|| {
            format!(
                "Faulty alignment record in {}:{}-{}",
                window.chrom, window.start, window.end
            )
        })?;
        if record.is_secondary() {
            continue;
        }
        let pos_start = record.pos();
        let pos_end = record.reference_end();
        if pos_start < window.start {
            continue;
        }
        let in_included_region = match &window.regions {
            None => true,
            Some(regions) => regions
                .iter()
                .any(|(rs, re)| !(pos_end <= *rs || pos_start >= *re)),
        };
        if !in_included_region {
            continue;
        }

        let read = AlignedRead::from_record(&record, &window.chrom);
        sigs.extend(extract::signatures_from_read(&read, &params));
        if read.mapq >= cli.min_mapq {
            spans.push(ReadSpan {
                chrom: window.chrom.clone(),
                start: pos_start,
                end: pos_end,
                is_primary: read.is_primary(),
                read: read.read_tag.clone(),
            });
        }
    }

    if sigs.is_empty() {
        debug!("Skip {}:{}-{}.", window.chrom, window.start, window.end);
        return Ok(());
    }
    work.write_window_shards(&window.chrom, window.start, window.end, &sigs, &spans)?;
    info!("Finished {}:{}-{}.", window.chrom, window.start, window.end);
    Ok(())
}

/// One phase-2 clustering + genotyping task.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTask {
    Indel { chrom: String, sv_type: SvType },
    Dup { chrom: String },
    Inv { chrom: String },
    Tra { chrom1: String, chrom2: String },
}

/// Phase-2 worker: load the task's slice of the merged signature streams,
/// cluster, and genotype against the chromosome's read spans.
pub fn run_call_task(cli: &Cli, work: &WorkDir, task: &CallTask) -> Result<Vec<SvCall>> {
    let (candidates, chrom, sv_type) = match task {
        CallTask::Indel { chrom, sv_type } => {
            let sigs: Vec<IndelSig> = work
                .load_signatures(*sv_type, chrom)?
                .into_iter()
                .filter_map(|sig| match sig {
                    Signature::Ins { pos, len, read, seq, .. } => Some(IndelSig { pos, len, read, seq }),
                    Signature::Del { pos, len, read, .. } => Some(IndelSig {
                        pos,
                        len,
                        read,
                        seq: String::new(),
                    }),
                    _ => None,
                })
                .collect();
            let params = cli.indel_params(*sv_type);
            (
                cluster::indel::cluster(&sigs, chrom, *sv_type, &params),
                chrom.clone(),
                *sv_type,
            )
        }
        CallTask::Dup { chrom } => {
            let sigs: Vec<DupSig> = work
                .load_signatures(SvType::Dup, chrom)?
                .into_iter()
                .filter_map(|sig| match sig {
                    Signature::Dup { start, end, read, .. } => Some(DupSig { start, end, read }),
                    _ => None,
                })
                .collect();
            let params = cli.interval_params(SvType::Dup);
            (
                cluster::dup::cluster(&sigs, chrom, &params),
                chrom.clone(),
                SvType::Dup,
            )
        }
        CallTask::Inv { chrom } => {
            let sigs: Vec<InvSig> = work
                .load_signatures(SvType::Inv, chrom)?
                .into_iter()
                .filter_map(|sig| match sig {
                    Signature::Inv { strands, pos1, pos2, read, .. } => Some(InvSig {
                        strands,
                        pos1,
                        pos2,
                        read,
                    }),
                    _ => None,
                })
                .collect();
            let params = cli.interval_params(SvType::Inv);
            (
                cluster::inv::cluster(&sigs, chrom, &params),
                chrom.clone(),
                SvType::Inv,
            )
        }
        CallTask::Tra { chrom1, chrom2 } => {
            let sigs: Vec<TraSig> = work
                .load_tra_signatures(chrom1, chrom2)?
                .into_iter()
                .filter_map(|sig| match sig {
                    Signature::Tra { form, pos1, pos2, read, .. } => Some(TraSig {
                        form,
                        pos1,
                        pos2,
                        read,
                    }),
                    _ => None,
                })
                .collect();
            let params = cli.tra_params();
            (
                cluster::tra::cluster(&sigs, chrom1, chrom2, &params),
                chrom1.clone(),
                SvType::Tra,
            )
        }
    };

    annotate(cli, work, candidates, &chrom, sv_type)
}

fn annotate(
    cli: &Cli,
    work: &WorkDir,
    candidates: Vec<Candidate>,
    chrom: &str,
    sv_type: SvType,
) -> Result<Vec<SvCall>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let reads = work
        .load_read_spans(chrom)
        .with_context(|| format!("Could not load read spans for {chrom}"))?;
    Ok(genotype::annotate_candidates(
        candidates,
        &reads,
        cli.cluster_bias(sv_type),
        cli.min_support,
        cli.genotype,
    ))
}
