//! Lock-step merge of name-sorted streams.
//!
//! Every call to [`MergeCoordinator::next_group`] finds the smallest pending read
//! name (in natural order) among all open scanners and drains every record with
//! that name, from every stream, into one [`HitGroup`].
use crate::libs::error::{HitError, Result};
use crate::libs::natord;
use crate::libs::sam::AlignmentRecord;
use crate::libs::scanner::StreamScanner;
use std::cmp::Ordering;

/// One alignment of a read, tagged with the stream it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub source: usize,
    pub record: AlignmentRecord,
}

/// All hits of one read, across all streams. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct HitGroup {
    pub read: String,
    pub hits: Vec<Hit>,
}

impl HitGroup {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Idle,
    Merging,
    Terminal,
}

pub struct MergeCoordinator {
    scanners: Vec<StreamScanner>,
    state: MergeState,
}

impl MergeCoordinator {
    pub fn new(scanners: Vec<StreamScanner>) -> Self {
        Self {
            scanners,
            state: MergeState::Idle,
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Next group in natural read-name order, `None` once every stream is exhausted.
    pub fn next_group(&mut self) -> Result<Option<HitGroup>> {
        if self.state == MergeState::Terminal {
            return Ok(None);
        }
        self.state = MergeState::Merging;

        // Smallest pending read name among the open scanners
        let mut read: Option<String> = None;
        let mut all_closed = true;
        for s in self.scanners.iter_mut() {
            let record = match s.peek()? {
                Some(record) => record,
                None => continue,
            };
            all_closed = false;
            let smaller = match &read {
                None => true,
                Some(cur) => natord::compare(&record.qname, cur) == Ordering::Less,
            };
            if smaller {
                read = Some(record.qname.clone());
            }
        }
        if all_closed {
            self.state = MergeState::Terminal;
            return Ok(None);
        }
        let read = match read {
            Some(read) if !read.is_empty() => read,
            _ => {
                return Err(HitError::Invariant(
                    "failed to find a read name while streams remain open".to_string(),
                ))
            }
        };

        // Drain that read from every stream
        let mut hits = vec![];
        for (i, s) in self.scanners.iter_mut().enumerate() {
            while s.peek()?.is_some_and(|record| record.qname == read) {
                if let Some(record) = s.advance() {
                    hits.push(Hit { source: i, record });
                }
            }
        }
        if hits.is_empty() {
            return Err(HitError::Invariant(format!("no hits for {}", read)));
        }

        Ok(Some(HitGroup { read, hits }))
    }
}

impl Iterator for MergeCoordinator {
    type Item = Result<HitGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_group() {
            Ok(Some(group)) => Some(Ok(group)),
            Ok(None) => None,
            Err(e) => {
                // a failed merge can not be resumed
                self.state = MergeState::Terminal;
                Some(Err(e))
            }
        }
    }
}
