//! Natural ordering of read names.
//!
//! Embedded digit runs are compared as numbers, everything else byte by byte.
//! This is the order `samtools sort -n` produces, so name-sorted files coming out
//! of samtools can be merged with it.
//!
//! ```
//! use std::cmp::Ordering;
//! use bestbam::libs::natord::compare;
//!
//! assert_eq!(compare("read2", "read10"), Ordering::Less);
//! assert_eq!(compare("read10", "read10"), Ordering::Equal);
//! assert_eq!(compare("readA", "readB"), Ordering::Less);
//! ```
use std::cmp::Ordering;

#[inline]
fn is_digit_at(s: &[u8], i: usize) -> bool {
    i < s.len() && s[i].is_ascii_digit()
}

/// Compare two read names in natural order.
///
/// Leading zeros of a digit run are skipped before comparing it. A longer run
/// (after the zeros) is the larger number; runs of the same length compare by
/// value. When two runs have equal values but a different number of leading
/// zeros, the one with more zeros sorts first, so only identical names compare
/// `Equal`.
///
/// Only the sign of the result matters; no distance between characters is
/// reported.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut i = 0;
    let mut j = 0;
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            while i < a.len() && a[i] == b'0' {
                i += 1;
            }
            while j < b.len() && b[j] == b'0' {
                j += 1;
            }
            while is_digit_at(a, i) && is_digit_at(b, j) && a[i] == b[j] {
                i += 1;
                j += 1;
            }

            let more_a = is_digit_at(a, i);
            let more_b = is_digit_at(b, j);
            if more_a && more_b {
                // same leading part, first differing digit found
                let mut k = 0;
                while is_digit_at(a, i + k) && is_digit_at(b, j + k) {
                    k += 1;
                }
                if is_digit_at(a, i + k) {
                    return Ordering::Greater;
                } else if is_digit_at(b, j + k) {
                    return Ordering::Less;
                }
                // equal lengths: the byte order of the digits is the numeric order
                return a[i..i + k].cmp(&b[j..j + k]);
            } else if more_a {
                return Ordering::Greater;
            } else if more_b {
                return Ordering::Less;
            } else if i != j {
                return if i < j {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
        } else {
            if a[i] != b[j] {
                return a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
    }

    a.len().cmp(&b.len())
}
