//! SAM text records, as printed by `samtools view`.
//!
//! Only the eleven mandatory columns and integer-typed optional tags are kept.
use crate::libs::error::{HitError, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

/// Mandatory columns, QNAME to QUAL
pub const MIN_FIELDS: usize = 11;

lazy_static! {
    static ref CIGAR_OP: Regex = Regex::new(r"(\d+)([MIDNSHP=X])").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentRecord {
    pub qname: String,
    pub flag: u32,
    pub rname: String,
    pub pos: i64,
    pub mapq: u32,
    pub cigar: String,
    pub rnext: String,
    pub pnext: i64,
    pub seq: String,
    pub qual: String,
    /// `XX:i:N` tags, in input order
    pub tags: IndexMap<String, i64>,
    /// Bases covered by M, = and X operations
    pub match_len: u64,
}

impl AlignmentRecord {
    pub fn tag(&self, key: &str) -> Option<i64> {
        self.tags.get(key).copied()
    }

    /// Alignment score, `AS`
    pub fn score(&self) -> i64 {
        self.tag("AS").unwrap_or(0)
    }

    /// Hit index, `HI`
    pub fn hit_index(&self) -> i64 {
        self.tag("HI").unwrap_or(0)
    }

    /// Mismatches reported by STAR (`nM`), falling back to `NM`
    pub fn edit_dist(&self) -> i64 {
        self.tag("nM").or_else(|| self.tag("NM")).unwrap_or(0)
    }
}

/// Sum the lengths of the match operations (`M`, `=`, `X`) of a CIGAR string.
///
/// ```
/// use bestbam::libs::sam::parse_cigar_match_len;
///
/// assert_eq!(parse_cigar_match_len("76M").unwrap(), 76);
/// assert_eq!(parse_cigar_match_len("5S30M200N40M1I5M").unwrap(), 75);
/// assert_eq!(parse_cigar_match_len("*").unwrap(), 0);
/// assert!(parse_cigar_match_len("76").is_err());
/// ```
pub fn parse_cigar_match_len(cigar: &str) -> Result<u64> {
    if cigar == "*" {
        return Ok(0);
    }

    let mut covered = 0;
    let mut len = 0u64;
    for cap in CIGAR_OP.captures_iter(cigar) {
        let whole = cap.get(0).unwrap();
        if whole.start() != covered {
            return Err(HitError::format(format!("malformed CIGAR: {}", cigar)));
        }
        covered = whole.end();

        let n: u64 = cap[1]
            .parse()
            .map_err(|_| HitError::format(format!("malformed CIGAR fragment: {}", &cap[0])))?;
        if matches!(&cap[2], "M" | "=" | "X") {
            len += n;
        }
    }
    if covered != cigar.len() || cigar.is_empty() {
        return Err(HitError::format(format!("malformed CIGAR: {}", cigar)));
    }

    Ok(len)
}

/// Split a `KEY:TYPE:VALUE` field. Keys are two characters, types one.
fn split_tag(field: &str) -> Result<(&str, &str, &str)> {
    let mut parts = field.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(ty), Some(value)) if key.len() == 2 && ty.len() == 1 => {
            Ok((key, ty, value))
        }
        _ => Err(HitError::structural(format!("malformed tag: {}", field))),
    }
}

impl std::str::FromStr for AlignmentRecord {
    type Err = HitError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(HitError::structural(format!(
                "expected at least {} fields, found {}",
                MIN_FIELDS,
                fields.len()
            )));
        }
        if fields[0].is_empty() {
            return Err(HitError::structural("empty read name"));
        }

        let parse_u32 = |name: &str, s: &str| {
            s.parse::<u32>()
                .map_err(|_| HitError::format(format!("invalid integer in {}: {}", name, s)))
        };
        let parse_i64 = |name: &str, s: &str| {
            s.parse::<i64>()
                .map_err(|_| HitError::format(format!("invalid integer in {}: {}", name, s)))
        };

        let mut tags = IndexMap::new();
        for field in &fields[MIN_FIELDS..] {
            let (key, ty, value) = split_tag(field)?;
            if ty != "i" {
                continue;
            }
            let val = value
                .parse::<i64>()
                .map_err(|_| HitError::format(format!("failed to parse tag: {}", field)))?;
            tags.insert(key.to_string(), val);
        }

        Ok(AlignmentRecord {
            qname: fields[0].to_string(),
            flag: parse_u32("FLAG", fields[1])?,
            rname: fields[2].to_string(),
            pos: parse_i64("POS", fields[3])?,
            mapq: parse_u32("MAPQ", fields[4])?,
            cigar: fields[5].to_string(),
            rnext: fields[6].to_string(),
            pnext: parse_i64("PNEXT", fields[7])?,
            seq: fields[9].to_string(),
            qual: fields[10].to_string(),
            tags,
            match_len: parse_cigar_match_len(fields[5])?,
        })
    }
}
