//! # Signature records
//!
//! Module containing the typed SV evidence records that flow between the
//! extraction and clustering phases. A [`Signature`] is derived from a single
//! read; a [`ReadSpan`] describes one alignment used later for coverage
//! counting. Both have a stable tab-separated line form used for the
//! per-window shard files and the merged per-type streams.
use std::fmt;

use anyhow::{anyhow, bail, Context, Result};

/// The five SV classes the caller emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SvType {
    Ins,
    Del,
    Dup,
    Inv,
    Tra,
}

impl SvType {
    pub const ALL: [SvType; 5] = [SvType::Ins, SvType::Del, SvType::Dup, SvType::Inv, SvType::Tra];

    pub fn as_str(self) -> &'static str {
        match self {
            SvType::Ins => "INS",
            SvType::Del => "DEL",
            SvType::Dup => "DUP",
            SvType::Inv => "INV",
            SvType::Tra => "TRA",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "INS" => Ok(SvType::Ins),
            "DEL" => Ok(SvType::Del),
            "DUP" => Ok(SvType::Dup),
            "INV" => Ok(SvType::Inv),
            "TRA" => Ok(SvType::Tra),
            _ => bail!("Unknown SV type '{s}'"),
        }
    }
}

impl fmt::Display for SvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Junction orientation of an inversion signature.
/// `HeadToHead` joins two 5' ends (`++`), `TailToTail` two 3' ends (`--`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrandPair {
    HeadToHead,
    TailToTail,
}

impl StrandPair {
    pub fn as_str(self) -> &'static str {
        match self {
            StrandPair::HeadToHead => "++",
            StrandPair::TailToTail => "--",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "++" => Ok(StrandPair::HeadToHead),
            "--" => Ok(StrandPair::TailToTail),
            _ => bail!("Unknown strand pair '{s}'"),
        }
    }
}

/// The four breakend orientations of the VCF spec:
/// `A` = `N[chr:pos[`, `B` = `N]chr:pos]`, `C` = `[chr:pos[N`, `D` = `]chr:pos]N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BndForm {
    A,
    B,
    C,
    D,
}

impl BndForm {
    pub fn as_str(self) -> &'static str {
        match self {
            BndForm::A => "A",
            BndForm::B => "B",
            BndForm::C => "C",
            BndForm::D => "D",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "A" => Ok(BndForm::A),
            "B" => Ok(BndForm::B),
            "C" => Ok(BndForm::C),
            "D" => Ok(BndForm::D),
            _ => bail!("Unknown breakend form '{s}'"),
        }
    }

    /// Bracketed ALT notation for a mate at `chrom2:pos2` (0-based, printed 1-based).
    pub fn alt(self, chrom2: &str, pos2: i64) -> String {
        let p = pos2 + 1;
        match self {
            BndForm::A => format!("N[{chrom2}:{p}["),
            BndForm::B => format!("N]{chrom2}:{p}]"),
            BndForm::C => format!("[{chrom2}:{p}[N"),
            BndForm::D => format!("]{chrom2}:{p}]N"),
        }
    }
}

/// SV evidence derived from a single read.
#[derive(Debug, Clone, PartialEq)]
pub enum Signature {
    Ins {
        chrom: String,
        pos: i64,
        len: i64,
        read: String,
        seq: String,
    },
    Del {
        chrom: String,
        pos: i64,
        len: i64,
        read: String,
    },
    Dup {
        chrom: String,
        start: i64,
        end: i64,
        read: String,
    },
    Inv {
        chrom: String,
        strands: StrandPair,
        pos1: i64,
        pos2: i64,
        read: String,
    },
    Tra {
        chrom1: String,
        form: BndForm,
        pos1: i64,
        chrom2: String,
        pos2: i64,
        read: String,
    },
}

/// Sort key shared by all signature lines: two string components, two
/// positions. Unused components stay empty/zero so that one ordering covers
/// every stream; ties are broken on the full line at merge time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SigKey {
    pub chrom_a: String,
    pub chrom_b: String,
    pub pos_a: i64,
    pub pos_b: i64,
}

impl Signature {
    pub fn sv_type(&self) -> SvType {
        match self {
            Signature::Ins { .. } => SvType::Ins,
            Signature::Del { .. } => SvType::Del,
            Signature::Dup { .. } => SvType::Dup,
            Signature::Inv { .. } => SvType::Inv,
            Signature::Tra { .. } => SvType::Tra,
        }
    }

    pub fn key(&self) -> SigKey {
        match self {
            Signature::Ins { chrom, pos, len, .. } | Signature::Del { chrom, pos, len, .. } => SigKey {
                chrom_a: chrom.clone(),
                chrom_b: String::new(),
                pos_a: *pos,
                pos_b: *len,
            },
            Signature::Dup { chrom, start, end, .. } => SigKey {
                chrom_a: chrom.clone(),
                chrom_b: String::new(),
                pos_a: *start,
                pos_b: *end,
            },
            Signature::Inv { chrom, strands, pos1, pos2, .. } => SigKey {
                chrom_a: chrom.clone(),
                chrom_b: strands.as_str().to_string(),
                pos_a: *pos1,
                pos_b: *pos2,
            },
            Signature::Tra { chrom1, chrom2, pos1, pos2, .. } => SigKey {
                chrom_a: chrom1.clone(),
                chrom_b: chrom2.clone(),
                pos_a: *pos1,
                pos_b: *pos2,
            },
        }
    }

    /// Tab-separated shard line, without the trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Signature::Ins { chrom, pos, len, read, seq } => {
                format!("INS\t{chrom}\t{pos}\t{len}\t{read}\t{seq}")
            }
            Signature::Del { chrom, pos, len, read } => {
                format!("DEL\t{chrom}\t{pos}\t{len}\t{read}")
            }
            Signature::Dup { chrom, start, end, read } => {
                format!("DUP\t{chrom}\t{start}\t{end}\t{read}")
            }
            Signature::Inv { chrom, strands, pos1, pos2, read } => {
                format!("INV\t{chrom}\t{}\t{pos1}\t{pos2}\t{read}", strands.as_str())
            }
            Signature::Tra { chrom1, form, pos1, chrom2, pos2, read } => {
                format!("TRA\t{chrom1}\t{}\t{pos1}\t{chrom2}\t{pos2}\t{read}", form.as_str())
            }
        }
    }

    pub fn from_line(line: &str) -> Result<Signature> {
        let fields: Vec<&str> = line.split('\t').collect();
        let err = || anyhow!("Malformed signature line '{line}'");
        let svtype = SvType::parse(fields.first().ok_or_else(err)?)?;
        let parse_pos = |i: usize| -> Result<i64> {
            fields
                .get(i)
                .ok_or_else(err)?
                .parse::<i64>()
                .with_context(|| format!("Bad coordinate in signature line '{line}'"))
        };
        match svtype {
            SvType::Ins => {
                if fields.len() < 5 {
                    return Err(err());
                }
                Ok(Signature::Ins {
                    chrom: fields[1].to_string(),
                    pos: parse_pos(2)?,
                    len: parse_pos(3)?,
                    read: fields[4].to_string(),
                    seq: fields.get(5).unwrap_or(&"").to_string(),
                })
            }
            SvType::Del => {
                if fields.len() < 5 {
                    return Err(err());
                }
                Ok(Signature::Del {
                    chrom: fields[1].to_string(),
                    pos: parse_pos(2)?,
                    len: parse_pos(3)?,
                    read: fields[4].to_string(),
                })
            }
            SvType::Dup => {
                if fields.len() < 5 {
                    return Err(err());
                }
                Ok(Signature::Dup {
                    chrom: fields[1].to_string(),
                    start: parse_pos(2)?,
                    end: parse_pos(3)?,
                    read: fields[4].to_string(),
                })
            }
            SvType::Inv => {
                if fields.len() < 6 {
                    return Err(err());
                }
                Ok(Signature::Inv {
                    chrom: fields[1].to_string(),
                    strands: StrandPair::parse(fields[2])?,
                    pos1: parse_pos(3)?,
                    pos2: parse_pos(4)?,
                    read: fields[5].to_string(),
                })
            }
            SvType::Tra => {
                if fields.len() < 7 {
                    return Err(err());
                }
                Ok(Signature::Tra {
                    chrom1: fields[1].to_string(),
                    form: BndForm::parse(fields[2])?,
                    pos1: parse_pos(3)?,
                    chrom2: fields[4].to_string(),
                    pos2: parse_pos(5)?,
                    read: fields[6].to_string(),
                })
            }
        }
    }
}

/// One alignment's reference span, kept for coverage counting.
/// `read` is the `query_name:read_group` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadSpan {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub is_primary: bool,
    pub read: String,
}

impl ReadSpan {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.end,
            u8::from(self.is_primary),
            self.read
        )
    }

    pub fn from_line(line: &str) -> Result<ReadSpan> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            bail!("Malformed reads line '{line}'");
        }
        Ok(ReadSpan {
            chrom: fields[0].to_string(),
            start: fields[1]
                .parse()
                .with_context(|| format!("Bad start in reads line '{line}'"))?,
            end: fields[2]
                .parse()
                .with_context(|| format!("Bad end in reads line '{line}'"))?,
            is_primary: fields[3] == "1",
            read: fields[4].to_string(),
        })
    }

    pub fn key(&self) -> SigKey {
        SigKey {
            chrom_a: self.chrom.clone(),
            chrom_b: String::new(),
            pos_a: self.start,
            pos_b: self.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_lines_round_trip() {
        let sigs = vec![
            Signature::Ins {
                chrom: "chr1".into(),
                pos: 3000,
                len: 80,
                read: "r1:rg0".into(),
                seq: "ACGT".into(),
            },
            Signature::Ins {
                chrom: "chr1".into(),
                pos: 3000,
                len: 80,
                read: "r1:rg0".into(),
                seq: String::new(),
            },
            Signature::Tra {
                chrom1: "chr1".into(),
                form: BndForm::A,
                pos1: 500,
                chrom2: "chr2".into(),
                pos2: 2000,
                read: "r2:".into(),
            },
        ];
        for sig in sigs {
            assert_eq!(sig, Signature::from_line(&sig.to_line()).unwrap());
        }
    }

    #[test]
    fn keys_order_tra_by_chrom_pair() {
        let a = Signature::Tra {
            chrom1: "chr1".into(),
            form: BndForm::D,
            pos1: 900,
            chrom2: "chr2".into(),
            pos2: 5,
            read: "r:".into(),
        };
        let b = Signature::Tra {
            chrom1: "chr1".into(),
            form: BndForm::A,
            pos1: 5,
            chrom2: "chr3".into(),
            pos2: 5,
            read: "r:".into(),
        };
        assert!(a.key() < b.key());
    }

    #[test]
    fn bnd_alt_notation() {
        assert_eq!(BndForm::A.alt("chr2", 1999), "N[chr2:2000[");
        assert_eq!(BndForm::D.alt("chrX", 9), "]chrX:10]N");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(Signature::from_line("DEL\tchr1\t100").is_err());
        assert!(Signature::from_line("XXX\tchr1\t100\t50\tr:").is_err());
        assert!(ReadSpan::from_line("chr1\t1\t2").is_err());
    }
}
