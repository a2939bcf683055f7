//! # Working directory
//!
//! The single shared mutable resource of the pipeline. Phase-1 workers each
//! write uniquely named shard files under `signatures/`; a streaming k-way
//! merge then produces one sorted stream per SV type (`INS.sigs`, …) plus
//! `reads.sigs`, which phase 2 consumes. A directory left behind by an
//! earlier run is reused as-is.
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;

use crate::signature::{ReadSpan, SigKey, Signature, SvType};

pub struct WorkDir {
    root: PathBuf,
}

/// Which chromosomes carry signal, per SV type; TRA tracks ordered pairs.
#[derive(Debug, Default)]
pub struct ChromIndex {
    pub per_type: BTreeMap<SvType, Vec<String>>,
    pub tra_pairs: Vec<(String, String)>,
}

impl WorkDir {
    pub fn new(root: &Path) -> Result<WorkDir> {
        let signatures = root.join("signatures");
        fs::create_dir_all(&signatures)
            .with_context(|| format!("Could not create work directory {}", signatures.display()))?;
        Ok(WorkDir {
            root: root.to_path_buf(),
        })
    }

    pub fn merged_path(&self, sv_type: SvType) -> PathBuf {
        self.root.join(format!("{}.sigs", sv_type.as_str()))
    }

    pub fn reads_path(&self) -> PathBuf {
        self.root.join("reads.sigs")
    }

    fn signatures_dir(&self) -> PathBuf {
        self.root.join("signatures")
    }

    /// True when an earlier run already merged its signature streams here.
    pub fn has_merged_streams(&self) -> bool {
        SvType::ALL.iter().all(|t| self.merged_path(*t).is_file()) && self.reads_path().is_file()
    }

    /// Write one window's shards: one pre-sorted file per SV type with
    /// signal, plus the window's read spans.
    pub fn write_window_shards(
        &self,
        chrom: &str,
        start: i64,
        end: i64,
        sigs: &[Signature],
        reads: &[ReadSpan],
    ) -> Result<()> {
        let stem = format!("_{chrom}_{start}_{end}");
        for sv_type in SvType::ALL {
            let mut lines: Vec<(SigKey, String)> = sigs
                .iter()
                .filter(|s| s.sv_type() == sv_type)
                .map(|s| (s.key(), s.to_line()))
                .collect();
            if lines.is_empty() {
                continue;
            }
            lines.sort();
            let path = self
                .signatures_dir()
                .join(format!("{stem}.{}.sigs", sv_type.as_str()));
            write_lines(&path, lines.into_iter().map(|(_, l)| l))?;
        }

        let mut read_lines: Vec<(SigKey, String)> =
            reads.iter().map(|r| (r.key(), r.to_line())).collect();
        read_lines.sort();
        let path = self.signatures_dir().join(format!("{stem}.reads"));
        write_lines(&path, read_lines.into_iter().map(|(_, l)| l))?;
        Ok(())
    }

    /// K-way merge of the per-window shards into one sorted stream per SV
    /// type (deduplicated by full-line equality) and one read-span stream.
    pub fn merge_shards(&self) -> Result<()> {
        let mut names: Vec<PathBuf> = fs::read_dir(self.signatures_dir())
            .with_context(|| "Could not list signature shards")?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        names.sort();

        for sv_type in SvType::ALL {
            let suffix = format!(".{}.sigs", sv_type.as_str());
            let shards: Vec<&PathBuf> = names
                .iter()
                .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(&suffix)))
                .collect();
            merge_files(
                &shards,
                &self.merged_path(sv_type),
                |line| Signature::from_line(line).map(|s| s.key()),
                true,
            )?;
        }

        let read_shards: Vec<&PathBuf> = names
            .iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("reads"))
            .collect();
        merge_files(
            &read_shards,
            &self.reads_path(),
            |line| ReadSpan::from_line(line).map(|r| r.key()),
            false,
        )?;

        info!("Merged {} signature shard files.", names.len());
        Ok(())
    }

    /// Scan the merged streams for the chromosomes (and TRA chromosome
    /// pairs) that actually carry signal.
    pub fn chromosome_index(&self) -> Result<ChromIndex> {
        let mut index = ChromIndex::default();
        for sv_type in [SvType::Ins, SvType::Del, SvType::Dup, SvType::Inv] {
            let mut chroms = BTreeSet::new();
            for line in read_lines(&self.merged_path(sv_type))? {
                let line = line?;
                if let Some(chrom) = line.split('\t').nth(1) {
                    chroms.insert(chrom.to_string());
                }
            }
            index
                .per_type
                .insert(sv_type, chroms.into_iter().collect());
        }

        let mut pairs = BTreeSet::new();
        for line in read_lines(&self.merged_path(SvType::Tra))? {
            let line = line?;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() >= 5 {
                pairs.insert((fields[1].to_string(), fields[4].to_string()));
            }
        }
        index.tra_pairs = pairs.into_iter().collect();
        Ok(index)
    }

    /// Load one chromosome's signatures of the given type, in stream order.
    pub fn load_signatures(&self, sv_type: SvType, chrom: &str) -> Result<Vec<Signature>> {
        let mut out = Vec::new();
        for line in read_lines(&self.merged_path(sv_type))? {
            let line = line?;
            if line.split('\t').nth(1) != Some(chrom) {
                continue;
            }
            out.push(Signature::from_line(&line)?);
        }
        Ok(out)
    }

    /// Load one ordered chromosome pair's TRA signatures.
    pub fn load_tra_signatures(&self, chrom1: &str, chrom2: &str) -> Result<Vec<Signature>> {
        let mut out = Vec::new();
        for line in read_lines(&self.merged_path(SvType::Tra))? {
            let line = line?;
            let fields: Vec<&str> = line.splitn(6, '\t').collect();
            if fields.len() < 6 || fields[1] != chrom1 || fields[4] != chrom2 {
                continue;
            }
            out.push(Signature::from_line(&line)?);
        }
        Ok(out)
    }

    /// Load one chromosome's read spans.
    pub fn load_read_spans(&self, chrom: &str) -> Result<Vec<ReadSpan>> {
        let mut out = Vec::new();
        for line in read_lines(&self.reads_path())? {
            let line = line?;
            if line.split('\t').next() != Some(chrom) {
                continue;
            }
            out.push(ReadSpan::from_line(&line)?);
        }
        Ok(out)
    }

    /// Remove the shard directory and merged streams, keeping the directory
    /// itself.
    pub fn cleanup(&self) -> Result<()> {
        fs::remove_dir_all(self.signatures_dir())
            .with_context(|| "Could not remove signature shards")?;
        for sv_type in SvType::ALL {
            let path = self.merged_path(sv_type);
            if path.is_file() {
                fs::remove_file(&path)
                    .with_context(|| format!("Could not remove {}", path.display()))?;
            }
        }
        let reads = self.reads_path();
        if reads.is_file() {
            fs::remove_file(&reads).with_context(|| format!("Could not remove {}", reads.display()))?;
        }
        Ok(())
    }
}

fn write_lines(path: &Path, lines: impl Iterator<Item = String>) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Could not create shard file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

fn read_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Could not open signature stream {}", path.display()))?;
    Ok(BufReader::new(file).lines())
}

/// Merge pre-sorted shard files into `out`. Each line is decorated with its
/// sort key; identical lines collapse to one when `dedup` is set.
fn merge_files<F>(shards: &[&PathBuf], out: &Path, parse_key: F, dedup: bool) -> Result<()>
where
    F: Fn(&str) -> Result<SigKey>,
{
    let mut decorated: Vec<Vec<(SigKey, String)>> = Vec::with_capacity(shards.len());
    for shard in shards {
        let mut lines = Vec::new();
        for line in read_lines(shard)? {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let key = parse_key(&line)
                .with_context(|| format!("Malformed shard line in {}", shard.display()))?;
            lines.push((key, line));
        }
        decorated.push(lines);
    }

    let merged = decorated
        .into_iter()
        .map(Vec::into_iter)
        .kmerge_by(|a, b| a <= b);
    let file = fs::File::create(out)
        .with_context(|| format!("Could not create signature stream {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    if dedup {
        for (_, line) in merged.dedup_by(|a, b| a.1 == b.1) {
            writeln!(writer, "{line}")?;
        }
    } else {
        for (_, line) in merged {
            writeln!(writer, "{line}")?;
        }
    }
    writer.flush()?;
    Ok(())
}
