//! # Command line interface for `longsv`
use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::{
    cluster::{dup::IntervalParams, indel::IndelParams, tra::TraParams},
    extract::ExtractParams,
    io::vcf::VcfOptions,
    signature::SvType,
};

#[derive(Parser, Debug)]
#[command(
    name = "longsv",
    author,
    version,
    about = "Structural variant calling from long-read alignments",
    long_about = None
)]
pub struct Cli {
    /// Sorted and indexed alignment file to call SVs from (BAM)
    #[arg(short, long)]
    pub input: String,

    /// Reference genome (FASTA, index created next to it if missing)
    #[arg(short, long)]
    pub reference: String,

    /// Output VCF path
    #[arg(short, long)]
    pub output: String,

    /// Working directory for signature shards and merged streams
    #[arg(short, long)]
    pub work_dir: String,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 16, value_parser = threads_in_range)]
    pub threads: usize,

    /// Window size (bp) processed per extraction task
    #[arg(long, default_value_t = 10_000_000)]
    pub batches: i64,

    /// Minimum SV length to report
    #[arg(short = 's', long, default_value_t = 30)]
    pub min_size: i64,

    /// Maximum SV length to report (-1 disables the bound)
    #[arg(short = 'L', long, default_value_t = 100_000, allow_hyphen_values = true)]
    pub max_size: i64,

    /// Minimum mapping quality of considered alignments
    #[arg(short = 'q', long, default_value_t = 20)]
    pub min_mapq: u8,

    /// Minimum read length of considered alignments
    #[arg(short = 'm', long, default_value_t = 500)]
    pub min_read_len: i64,

    /// Maximum number of split segments per read (-1 disables the cap)
    #[arg(long, default_value_t = 7, allow_hyphen_values = true)]
    pub max_split_parts: i64,

    /// Minimum number of supporting reads per call
    #[arg(long, default_value_t = 10)]
    pub min_support: usize,

    /// Minimum length of in-alignment INS/DEL signals
    #[arg(long, default_value_t = 10)]
    pub min_siglength: i64,

    /// Maximum gap when merging deletion signals within one read
    #[arg(long, default_value_t = 0)]
    pub merge_del_threshold: i64,

    /// Maximum gap when merging insertion signals within one read
    #[arg(long, default_value_t = 100)]
    pub merge_ins_threshold: i64,

    /// Length-similarity ratio for merging INS signatures
    #[arg(long, default_value_t = 0.3)]
    pub diff_ratio_merging_ins: f64,

    /// Length-similarity ratio for merging DEL signatures
    #[arg(long, default_value_t = 0.5)]
    pub diff_ratio_merging_del: f64,

    /// Positional clustering window for INS signatures
    #[arg(long, default_value_t = 100)]
    pub max_cluster_bias_ins: i64,

    /// Positional clustering window for DEL signatures
    #[arg(long, default_value_t = 200)]
    pub max_cluster_bias_del: i64,

    /// Positional clustering window for DUP signatures
    #[arg(long, default_value_t = 500)]
    pub max_cluster_bias_dup: i64,

    /// Positional clustering window for INV signatures
    #[arg(long, default_value_t = 500)]
    pub max_cluster_bias_inv: i64,

    /// Positional clustering window for TRA signatures
    #[arg(long, default_value_t = 50)]
    pub max_cluster_bias_tra: i64,

    /// Scatter-ratio filter for TRA clusters
    #[arg(long, default_value_t = 0.6)]
    pub diff_ratio_filtering_tra: f64,

    /// Genotyping iteration bound, kept for interface compatibility
    #[arg(long, default_value_t = 500)]
    pub gt_round: usize,

    /// Fraction of an oversized supporting-read set to keep
    #[arg(long, default_value_t = 1.0)]
    pub remain_reads_ratio: f64,

    /// BED file restricting extraction to the listed regions (padded 1 kb)
    #[arg(long)]
    pub include_bed: Option<String>,

    /// Input VCF for force calling (not supported)
    #[arg(long = "Ivcf")]
    pub ivcf: Option<String>,

    /// Sample name written to the VCF header
    #[arg(long, default_value = "NULL")]
    pub sample: String,

    /// Report supporting read names in the INFO column
    #[arg(long, default_value_t = false)]
    pub report_readid: bool,

    /// Enable genotyping
    #[arg(long, default_value_t = false)]
    pub genotype: bool,

    /// Keep the working directory after the run
    #[arg(long, default_value_t = false)]
    pub retain_work_dir: bool,

    /// Maximum reported reference-allele length for deletions
    #[arg(long, default_value_t = 100_000)]
    pub max_ref_allele: i64,

    /// Verbose (debug) logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn extract_params(&self) -> ExtractParams {
        ExtractParams {
            sv_size: self.min_size,
            min_mapq: self.min_mapq,
            max_split_parts: self.max_split_parts,
            min_read_len: self.min_read_len,
            min_siglength: self.min_siglength,
            merge_del_threshold: self.merge_del_threshold,
            merge_ins_threshold: self.merge_ins_threshold,
            max_size: self.max_size,
        }
    }

    pub fn indel_params(&self, sv_type: SvType) -> IndelParams {
        let (diff_ratio_merging, max_cluster_bias) = match sv_type {
            SvType::Ins => (self.diff_ratio_merging_ins, self.max_cluster_bias_ins),
            _ => (self.diff_ratio_merging_del, self.max_cluster_bias_del),
        };
        IndelParams {
            min_support: self.min_support,
            max_cluster_bias,
            diff_ratio_merging,
            remain_reads_ratio: self.remain_reads_ratio,
        }
    }

    pub fn interval_params(&self, sv_type: SvType) -> IntervalParams {
        IntervalParams {
            min_support: self.min_support,
            max_cluster_bias: match sv_type {
                SvType::Dup => self.max_cluster_bias_dup,
                _ => self.max_cluster_bias_inv,
            },
            sv_size: self.min_size,
            max_size: self.max_size,
            remain_reads_ratio: self.remain_reads_ratio,
        }
    }

    pub fn tra_params(&self) -> TraParams {
        TraParams {
            min_support: self.min_support,
            max_cluster_bias: self.max_cluster_bias_tra,
            diff_ratio_filtering: self.diff_ratio_filtering_tra,
            remain_reads_ratio: self.remain_reads_ratio,
        }
    }

    /// Clustering window of one SV type; also the slack a spanning read gets
    /// during coverage counting.
    pub fn cluster_bias(&self, sv_type: SvType) -> i64 {
        match sv_type {
            SvType::Ins => self.max_cluster_bias_ins,
            SvType::Del => self.max_cluster_bias_del,
            SvType::Dup => self.max_cluster_bias_dup,
            SvType::Inv => self.max_cluster_bias_inv,
            SvType::Tra => self.max_cluster_bias_tra,
        }
    }

    pub fn vcf_options(&self) -> VcfOptions {
        VcfOptions {
            sample: self.sample.clone(),
            genotype: self.genotype,
            report_readid: self.report_readid,
            min_size: self.min_size,
            max_size: self.max_size,
            max_ref_allele: self.max_ref_allele,
        }
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let threads = s
        .parse()
        .context("Could not parse value passed to --threads to integer")?;
    if threads < 1 {
        bail!("--threads must be at least 1");
    }
    Ok(threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_documented_configuration() {
        let cli = Cli::parse_from([
            "longsv", "-i", "in.bam", "-r", "ref.fa", "-o", "out.vcf", "-w", "wd",
        ]);
        assert_eq!(cli.min_support, 10);
        assert_eq!(cli.min_size, 30);
        assert_eq!(cli.max_cluster_bias_tra, 50);
        assert!(!cli.genotype);
    }
}
