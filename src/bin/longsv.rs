use std::{
    collections::HashMap,
    path::Path,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use rayon::{prelude::*, ThreadPoolBuilder};
use rust_htslib::bam::{self, Read};

use longsv::{
    cli::Cli,
    genotype::SvCall,
    io::{bed::IncludeRegions, vcf},
    run_call_task, scan_window,
    signature::SvType,
    work_dir::{ChromIndex, WorkDir},
    CallTask, Window,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let started = Instant::now();
    run(&cli)?;
    info!("Finished in {:.2} seconds.", started.elapsed().as_secs_f64());
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    if !Path::new(&cli.reference).is_file() {
        bail!("Reference file '{}' not found", cli.reference);
    }
    if cli.ivcf.is_some() {
        bail!("Force calling an input VCF is not supported");
    }
    let contigs = contigs_from_header(&cli.input)?;
    info!("The total number of chromosomes: {}", contigs.len());
    let work = WorkDir::new(Path::new(&cli.work_dir))?;

    ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .context("Could not build the worker thread pool")?;

    let mut retain_work_dir = cli.retain_work_dir;
    if work.has_merged_streams() {
        info!("Using existing signature streams in {}.", cli.work_dir);
        retain_work_dir = true;
    } else {
        info!("Extracting SV signatures on {} thread(s).", cli.threads);
        let windows = build_windows(cli, &contigs)?;
        windows
            .par_iter()
            .try_for_each(|window| scan_window(cli, window, &work))?;
        info!("Merging signatures of structural variants.");
        work.merge_shards()?;
    }

    let index = work.chromosome_index()?;
    let tasks = build_tasks(&index);
    info!("Clustering structural variants across {} tasks.", tasks.len());
    let results: Vec<Vec<SvCall>> = tasks
        .par_iter()
        .map(|task| run_call_task(cli, &work, task))
        .collect::<Result<_>>()?;

    let mut calls: Vec<SvCall> = results.into_iter().flatten().collect();
    sort_calls(&mut calls, &contigs);

    info!("Writing {} calls to {}.", calls.len(), cli.output);
    vcf::write_vcf(
        &cli.output,
        &cli.reference,
        &contigs,
        &calls,
        &cli.vcf_options(),
    )?;

    if retain_work_dir {
        info!("Keeping the working directory {}.", cli.work_dir);
    } else {
        info!("Cleaning temporary files.");
        work.cleanup()?;
    }
    Ok(())
}

/// Contig names and lengths in alignment-header order. Rejects alignment
/// files with more than one read group.
fn contigs_from_header(alignment_path: &str) -> Result<Vec<(String, u64)>> {
    let reader = bam::Reader::from_path(alignment_path)
        .with_context(|| format!("Could not open alignment file {alignment_path}"))?;
    let header_view = reader.header();

    let header_map = bam::Header::from_template(header_view).to_hashmap();
    let read_groups = header_map.get("RG").map_or(0, Vec::len);
    if read_groups > 1 {
        bail!("Alignment file should have at most one read group, found {read_groups}");
    }

    let mut contigs = Vec::new();
    for tid in 0..header_view.target_count() {
        let name = std::str::from_utf8(header_view.tid2name(tid))
            .context("Contig name is not valid UTF-8")?
            .to_string();
        let length = header_view
            .target_len(tid)
            .context("Could not get contig length from header")?;
        contigs.push((name, length));
    }
    Ok(contigs)
}

/// Split every contig into windows of `--batches` base pairs, attaching the
/// include regions overlapping each window.
fn build_windows(cli: &Cli, contigs: &[(String, u64)]) -> Result<Vec<Window>> {
    let include = match &cli.include_bed {
        Some(path) => Some(IncludeRegions::load(path)?),
        None => None,
    };
    let mut windows = Vec::new();
    for (chrom, length) in contigs {
        let length = *length as i64;
        let mut pos = 0;
        while pos < length {
            let end = (pos + cli.batches).min(length);
            windows.push(Window {
                chrom: chrom.clone(),
                start: pos,
                end,
                regions: include.as_ref().map(|inc| inc.for_window(chrom, pos, end)),
            });
            pos = end;
        }
    }
    Ok(windows)
}

fn build_tasks(index: &ChromIndex) -> Vec<CallTask> {
    let mut tasks = Vec::new();
    for sv_type in [SvType::Del, SvType::Ins] {
        if let Some(chroms) = index.per_type.get(&sv_type) {
            for chrom in chroms {
                tasks.push(CallTask::Indel {
                    chrom: chrom.clone(),
                    sv_type,
                });
            }
        }
    }
    if let Some(chroms) = index.per_type.get(&SvType::Inv) {
        for chrom in chroms {
            tasks.push(CallTask::Inv { chrom: chrom.clone() });
        }
    }
    if let Some(chroms) = index.per_type.get(&SvType::Dup) {
        for chrom in chroms {
            tasks.push(CallTask::Dup { chrom: chrom.clone() });
        }
    }
    for (chrom1, chrom2) in &index.tra_pairs {
        tasks.push(CallTask::Tra {
            chrom1: chrom1.clone(),
            chrom2: chrom2.clone(),
        });
    }
    tasks
}

/// Sort by contig rank in the alignment header, then position, with stable
/// tie-breaking so reruns are byte-identical.
fn sort_calls(calls: &mut [SvCall], contigs: &[(String, u64)]) {
    let rank: HashMap<&str, usize> = contigs
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.as_str(), i))
        .collect();
    calls.sort_by(|a, b| {
        let ra = rank.get(a.candidate.chrom.as_str()).copied().unwrap_or(usize::MAX);
        let rb = rank.get(b.candidate.chrom.as_str()).copied().unwrap_or(usize::MAX);
        ra.cmp(&rb)
            .then_with(|| a.candidate.pos.cmp(&b.candidate.pos))
            .then_with(|| a.candidate.sv_type.cmp(&b.candidate.sv_type))
            .then_with(|| a.candidate.len.cmp(&b.candidate.len))
            .then_with(|| a.candidate.mate.cmp(&b.candidate.mate))
            .then_with(|| a.candidate.support.cmp(&b.candidate.support))
    });
}
