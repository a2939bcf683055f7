//! End-to-end tests of the clustering + genotyping + output half of the
//! pipeline, driven from hand-written signature streams. The two phases are
//! decoupled through the on-disk formats, so these fixtures stand in for a
//! full extraction run.
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;

use longsv::{
    cli::Cli,
    io::vcf,
    run_call_task,
    signature::SvType,
    work_dir::WorkDir,
    CallTask,
};

struct Fixture {
    _dir: tempfile::TempDir,
    work_root: PathBuf,
    reference: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let work_root = dir.path().join("work");
        fs::create_dir_all(&work_root).unwrap();
        let reference = dir.path().join("ref.fa");
        write_reference(&reference);
        let output = dir.path().join("calls.vcf");
        Fixture {
            work_root,
            reference,
            output,
            _dir: dir,
        }
    }

    fn cli(&self, extra: &[&str]) -> Cli {
        let mut args: Vec<String> = [
            "longsv",
            "-i",
            "input.bam",
            "-r",
            self.reference.to_str().unwrap(),
            "-o",
            self.output.to_str().unwrap(),
            "-w",
            self.work_root.to_str().unwrap(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::parse_from(args)
    }

    fn work(&self) -> WorkDir {
        WorkDir::new(&self.work_root).unwrap()
    }

    fn write_stream(&self, name: &str, lines: &[String]) {
        let path = self.work_root.join(name);
        let mut file = fs::File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    fn vcf_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// chr1: 4000 bp of A with markers at 0-based 999 (C) and 2999 (T);
/// chr2: 3000 bp of G.
fn write_reference(path: &Path) {
    let mut chr1 = vec![b'A'; 4000];
    chr1[999] = b'C';
    chr1[2999] = b'T';
    let chr2 = vec![b'G'; 3000];
    let mut file = fs::File::create(path).unwrap();
    writeln!(file, ">chr1").unwrap();
    for chunk in chr1.chunks(60) {
        writeln!(file, "{}", std::str::from_utf8(chunk).unwrap()).unwrap();
    }
    writeln!(file, ">chr2").unwrap();
    for chunk in chr2.chunks(60) {
        writeln!(file, "{}", std::str::from_utf8(chunk).unwrap()).unwrap();
    }
}

fn contigs() -> Vec<(String, u64)> {
    vec![("chr1".to_string(), 4000), ("chr2".to_string(), 3000)]
}

fn spanning_reads(chrom: &str, start: i64, end: i64, tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| format!("{chrom}\t{start}\t{end}\t1\t{t}"))
        .collect()
}

#[test]
fn two_supporting_deletions_become_one_homozygous_call() {
    let fx = Fixture::new();
    fx.write_stream(
        "DEL.sigs",
        &[
            "DEL\tchr1\t1000\t60\tr1:rg0".to_string(),
            "DEL\tchr1\t1000\t60\tr2:rg0".to_string(),
        ],
    );
    let tags = vec!["r1:rg0".to_string(), "r2:rg0".to_string()];
    fx.write_stream("reads.sigs", &spanning_reads("chr1", 700, 1500, &tags));

    let cli = fx.cli(&["--min-support", "2", "--genotype"]);
    let calls = run_call_task(
        &cli,
        &fx.work(),
        &CallTask::Indel {
            chrom: "chr1".to_string(),
            sv_type: SvType::Del,
        },
    )
    .unwrap();

    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.candidate.pos, 1000);
    assert_eq!(call.candidate.len, 60);
    assert_eq!(call.dv, 2);
    assert_eq!(call.dr, Some(0));
    assert_eq!(call.gt, "1/1");

    vcf::write_vcf(
        fx.output.to_str().unwrap(),
        fx.reference.to_str().unwrap(),
        &contigs(),
        &calls,
        &cli.vcf_options(),
    )
    .unwrap();

    let expected = format!(
        "chr1\t1000\tcuteSV.DEL.0\tC{}\tC\t20.3\tPASS\t\
         PRECISE;SVTYPE=DEL;SVLEN=-60;END=1060;CIPOS=-0,0;CILEN=-0,0;RE=2;\
         RNAMES=NULL;AF=1.0;STRAND=+-\tGT:DR:DV:PL:GQ\t1/1:0:2:20,6,1:6",
        "A".repeat(60)
    );
    let lines = fx.vcf_lines();
    assert!(lines.contains(&expected), "missing line in: {lines:#?}");
}

#[test]
fn identical_breakends_report_one_bnd_record() {
    let fx = Fixture::new();
    let tags: Vec<String> = (1..=3).map(|i| format!("r{i}:")).collect();
    fx.write_stream(
        "TRA.sigs",
        &tags
            .iter()
            .map(|t| format!("TRA\tchrX\tA\t499\tchr2\t1999\t{t}"))
            .collect::<Vec<_>>(),
    );
    fx.write_stream("reads.sigs", &spanning_reads("chrX", 300, 700, &tags));

    let cli = fx.cli(&["--min-support", "3", "--genotype"]);
    let calls = run_call_task(
        &cli,
        &fx.work(),
        &CallTask::Tra {
            chrom1: "chrX".to_string(),
            chrom2: "chr2".to_string(),
        },
    )
    .unwrap();

    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dv, 3);
    assert_eq!(calls[0].dr, Some(0));

    vcf::write_vcf(
        fx.output.to_str().unwrap(),
        fx.reference.to_str().unwrap(),
        &contigs(),
        &calls,
        &cli.vcf_options(),
    )
    .unwrap();

    let line = fx
        .vcf_lines()
        .into_iter()
        .find(|l| l.starts_with("chrX\t"))
        .expect("BND line missing");
    let fields: Vec<&str> = line.split('\t').collect();
    // the fixture chromosome is absent from the reference: REF falls back to N
    assert_eq!(&fields[..5], &["chrX", "500", "cuteSV.BND.0", "N", "N[chr2:2000["]);
    assert!(fields[7].contains("SVTYPE=BND"));
    assert!(fields[7].contains("RE=3"));
    assert!(fields[9].starts_with("1/1:0:3:"));
}

#[test]
fn insertion_alt_is_anchor_base_plus_sequence() {
    let fx = Fixture::new();
    let seq = format!("ACG{}", "T".repeat(77));
    fx.write_stream("INS.sigs", &[format!("INS\tchr1\t3000\t80\tr1:\t{seq}")]);
    fx.write_stream(
        "reads.sigs",
        &spanning_reads("chr1", 2000, 3500, &["r1:".to_string()]),
    );

    let cli = fx.cli(&["--min-support", "1", "--genotype"]);
    let calls = run_call_task(
        &cli,
        &fx.work(),
        &CallTask::Indel {
            chrom: "chr1".to_string(),
            sv_type: SvType::Ins,
        },
    )
    .unwrap();

    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].candidate.pos, 3000);
    assert_eq!(calls[0].candidate.len, 80);

    vcf::write_vcf(
        fx.output.to_str().unwrap(),
        fx.reference.to_str().unwrap(),
        &contigs(),
        &calls,
        &cli.vcf_options(),
    )
    .unwrap();

    let line = fx
        .vcf_lines()
        .into_iter()
        .find(|l| l.starts_with("chr1\t3000\t"))
        .expect("INS line missing");
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields[2], "cuteSV.INS.0");
    assert_eq!(fields[3], "T");
    assert_eq!(fields[4], format!("T{seq}"));
    assert!(fields[7].contains("SVTYPE=INS"));
    assert!(fields[7].contains("SVLEN=80"));
    assert!(fields[7].contains("END=3000"));
}

#[test]
fn high_reference_coverage_genotypes_homozygous_reference() {
    let fx = Fixture::new();
    let supporting: Vec<String> = (0..20).map(|i| format!("r{i:03}:")).collect();
    fx.write_stream(
        "INS.sigs",
        &supporting
            .iter()
            .map(|t| format!("INS\tchr1\t3000\t200\t{t}\t{}", "G".repeat(200)))
            .collect::<Vec<_>>(),
    );
    let all: Vec<String> = (0..200).map(|i| format!("r{i:03}:")).collect();
    fx.write_stream("reads.sigs", &spanning_reads("chr1", 2500, 3500, &all));

    let cli = fx.cli(&["--genotype"]);
    let calls = run_call_task(
        &cli,
        &fx.work(),
        &CallTask::Indel {
            chrom: "chr1".to_string(),
            sv_type: SvType::Ins,
        },
    )
    .unwrap();

    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.dv, 20);
    assert_eq!(call.dr, Some(180));
    assert_eq!(call.gt, "0/0");
}

#[test]
fn paired_inversion_junctions_become_two_candidates() {
    let fx = Fixture::new();
    fx.write_stream(
        "INV.sigs",
        &[
            "INV\tchr1\t++\t200\t350\tr1:".to_string(),
            "INV\tchr1\t--\t250\t400\tr1:".to_string(),
        ],
    );
    fx.write_stream(
        "reads.sigs",
        &spanning_reads("chr1", 0, 1200, &["r1:".to_string()]),
    );

    let cli = fx.cli(&["--min-support", "1", "--genotype"]);
    let calls = run_call_task(
        &cli,
        &fx.work(),
        &CallTask::Inv {
            chrom: "chr1".to_string(),
        },
    )
    .unwrap();

    assert_eq!(calls.len(), 2);
    assert_eq!(
        (calls[0].candidate.pos, calls[0].candidate.len),
        (200, 150)
    );
    assert_eq!(
        (calls[1].candidate.pos, calls[1].candidate.len),
        (250, 150)
    );

    vcf::write_vcf(
        fx.output.to_str().unwrap(),
        fx.reference.to_str().unwrap(),
        &contigs(),
        &calls,
        &cli.vcf_options(),
    )
    .unwrap();

    let lines = fx.vcf_lines();
    let head_to_head = lines
        .iter()
        .find(|l| l.contains("cuteSV.INV.0"))
        .expect("INV line missing");
    assert!(head_to_head.starts_with("chr1\t201\t"));
    assert!(head_to_head.contains("SVLEN=150"));
    assert!(head_to_head.contains("END=351"));
    assert!(head_to_head.contains("STRAND=++"));
    assert!(head_to_head.contains("\t<INV>\t"));
}

#[test]
fn genotyping_disabled_reports_missing_fields() {
    let fx = Fixture::new();
    fx.write_stream(
        "DEL.sigs",
        &[
            "DEL\tchr1\t1000\t60\tr1:".to_string(),
            "DEL\tchr1\t1000\t60\tr2:".to_string(),
        ],
    );
    fx.write_stream("reads.sigs", &[]);

    let cli = fx.cli(&["--min-support", "2"]);
    let calls = run_call_task(
        &cli,
        &fx.work(),
        &CallTask::Indel {
            chrom: "chr1".to_string(),
            sv_type: SvType::Del,
        },
    )
    .unwrap();

    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].gt, "./.");
    assert_eq!(calls[0].dr, None);

    vcf::write_vcf(
        fx.output.to_str().unwrap(),
        fx.reference.to_str().unwrap(),
        &contigs(),
        &calls,
        &cli.vcf_options(),
    )
    .unwrap();

    let line = fx
        .vcf_lines()
        .into_iter()
        .find(|l| l.starts_with("chr1\t1000\t"))
        .expect("DEL line missing");
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields[5], ".");
    assert_eq!(fields[6], "PASS");
    assert!(!fields[7].contains("AF="));
    assert_eq!(fields[9], "./.:.:2:.,.,.:.");
}

#[test]
fn vcf_header_lists_contigs_and_fields() {
    let fx = Fixture::new();
    let cli = fx.cli(&[]);
    vcf::write_vcf(
        fx.output.to_str().unwrap(),
        fx.reference.to_str().unwrap(),
        &contigs(),
        &[],
        &cli.vcf_options(),
    )
    .unwrap();

    let lines = fx.vcf_lines();
    assert_eq!(lines[0], "##fileformat=VCFv4.2");
    assert!(lines.iter().any(|l| l == "##contig=<ID=chr1,length=4000>"));
    assert!(lines.iter().any(|l| l.starts_with("##INFO=<ID=SVTYPE")));
    assert!(lines.iter().any(|l| l.starts_with("##FORMAT=<ID=GT")));
    assert!(lines.iter().any(|l| l.starts_with("##FILTER=<ID=q5")));
    assert_eq!(
        lines.last().unwrap(),
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNULL"
    );
}
