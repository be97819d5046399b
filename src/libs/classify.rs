//! Accept or reject the winning hit and keep the counts.
use crate::libs::error::{HitError, Result};
use crate::libs::merge::{Hit, HitGroup};
use crate::libs::select::{Scoring, Selection};
use itertools::Itertools;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Minimum `AS` (tag scoring) or match length (computed scoring)
    pub min_metric: i64,
    /// Largest edit distance still accepted
    pub max_dist: i64,
    /// Reference names containing this are spike-in controls
    pub special: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Special,
    TooDiverged,
    TooLow,
    Accepted,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// Every hit of every processed read
    pub total_mappings: u64,
    pub too_low: u64,
    pub too_diverged: u64,
    /// Reads visited
    pub reads: u64,
    pub special: u64,
    /// Reads whose best score is shared by several sources
    pub multi: u64,
    pub accepted: u64,
    /// Sum of match lengths of accepted hits
    pub match_len_sum: u64,
    pub per_source: Vec<u64>,
}

impl Stats {
    pub fn avg_match_len(&self) -> f64 {
        if self.accepted == 0 {
            0.0
        } else {
            self.match_len_sum as f64 / self.accepted as f64
        }
    }
}

/// Counts decisions and writes the keep list.
pub struct Accumulator {
    scoring: Scoring,
    thresholds: Thresholds,
    labels: Vec<String>,
    keep: Option<Box<dyn Write>>,
    stats: Stats,
}

impl Accumulator {
    pub fn new(
        scoring: Scoring,
        thresholds: Thresholds,
        labels: Vec<String>,
        keep: Option<Box<dyn Write>>,
    ) -> Self {
        let stats = Stats {
            per_source: vec![0; labels.len()],
            ..Default::default()
        };
        Self {
            scoring,
            thresholds,
            labels,
            keep,
            stats,
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Account for one processed read and its selected hit.
    pub fn record(&mut self, group: &HitGroup, selection: &Selection) -> Result<Verdict> {
        self.stats.total_mappings += group.len() as u64;
        self.stats.reads += 1;
        if selection.multi_source {
            self.stats.multi += 1;
        }

        let best = &group.hits[selection.best];
        let verdict = self.classify(best);
        match verdict {
            Verdict::Special => self.stats.special += 1,
            Verdict::TooDiverged => self.stats.too_diverged += 1,
            Verdict::TooLow => self.stats.too_low += 1,
            Verdict::Accepted => self.accept(best)?,
        }

        Ok(verdict)
    }

    pub fn classify(&self, hit: &Hit) -> Verdict {
        let record = &hit.record;
        if record.rname.contains(self.thresholds.special.as_str()) {
            Verdict::Special
        } else if record.edit_dist() > self.thresholds.max_dist {
            Verdict::TooDiverged
        } else if self.scoring.metric(record) < self.thresholds.min_metric {
            Verdict::TooLow
        } else {
            Verdict::Accepted
        }
    }

    fn accept(&mut self, hit: &Hit) -> Result<()> {
        self.stats.per_source[hit.source] += 1;
        self.stats.accepted += 1;
        if self.scoring == Scoring::Tag {
            self.stats.match_len_sum += hit.record.match_len;
        }

        if let Some(writer) = self.keep.as_mut() {
            writeln!(writer, "{}\t{}", hit.record.qname, self.labels[hit.source])
                .map_err(|e| HitError::io("writing keep list", e))?;
        }
        Ok(())
    }

    /// Flush the keep list and hand back the counts.
    pub fn finish(mut self) -> Result<Stats> {
        if let Some(mut writer) = self.keep.take() {
            writer
                .flush()
                .map_err(|e| HitError::io("writing keep list", e))?;
        }
        Ok(self.stats)
    }

    /// Write the human-readable summary and the positional `stats` line.
    pub fn write_report(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        write_report(&self.stats, &self.scoring, &self.labels, writer)
    }
}

pub fn write_report(
    stats: &Stats,
    scoring: &Scoring,
    labels: &[String],
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    let low_name = match scoring {
        Scoring::Tag => "too low",
        Scoring::Computed { .. } => "too short",
    };
    writeln!(writer, "total\t{}", stats.total_mappings)?;
    writeln!(writer, "{}\t{}", low_name, stats.too_low)?;
    writeln!(writer, "too diverged\t{}", stats.too_diverged)?;
    writeln!(writer, "reads\t{}", stats.reads)?;
    writeln!(writer, "special\t{}", stats.special)?;
    writeln!(writer, "multi\t{}", stats.multi)?;
    if *scoring == Scoring::Tag {
        writeln!(writer, "avg match len\t{:.2}", stats.avg_match_len())?;
    }
    for (label, count) in labels.iter().zip(&stats.per_source) {
        writeln!(writer, "{}\t{}", label, count)?;
    }

    let counters = [
        stats.total_mappings,
        stats.too_low,
        stats.too_diverged,
        stats.reads,
        stats.special,
        stats.multi,
    ];
    writeln!(
        writer,
        "stats\t{}",
        counters.iter().chain(&stats.per_source).join("\t")
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A writer whose contents stay readable after it is boxed
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn hit(source: usize, rname: &str, score: i64, dist: i64) -> Hit {
        let line = format!(
            "r1\t0\t{}\t1\t255\t50M\t*\t0\t0\tACGT\tIIII\tAS:i:{}\tnM:i:{}",
            rname, score, dist
        );
        Hit {
            source,
            record: line.parse().unwrap(),
        }
    }

    fn thresholds(min_metric: i64, max_dist: i64) -> Thresholds {
        Thresholds {
            min_metric,
            max_dist,
            special: "ERCC".to_string(),
        }
    }

    fn labels() -> Vec<String> {
        vec!["human".to_string(), "mouse".to_string()]
    }

    fn select(best: usize, multi_source: bool) -> Selection {
        Selection {
            best,
            score: 0.0,
            tied: if multi_source { 2 } else { 1 },
            multi_source,
        }
    }

    #[test]
    fn test_classify_order() {
        let acc = Accumulator::new(Scoring::Tag, thresholds(10, 5), labels(), None);
        assert_eq!(acc.classify(&hit(0, "chr1", 20, 1)), Verdict::Accepted);
        // distance equal to the maximum is fine
        assert_eq!(acc.classify(&hit(0, "chr1", 20, 5)), Verdict::Accepted);
        assert_eq!(acc.classify(&hit(0, "chr1", 20, 6)), Verdict::TooDiverged);
        // divergence is checked before the score
        assert_eq!(acc.classify(&hit(0, "chr1", 1, 6)), Verdict::TooDiverged);
        assert_eq!(acc.classify(&hit(0, "chr1", 9, 0)), Verdict::TooLow);
        assert_eq!(acc.classify(&hit(0, "chr1", 10, 0)), Verdict::Accepted);
        assert_eq!(acc.classify(&hit(0, "ERCC-00002", 1, 99)), Verdict::Special);

        let acc = Accumulator::new(
            Scoring::Computed { penalty: 2.0 },
            thresholds(60, 5),
            labels(),
            None,
        );
        // 50M is shorter than 60 whatever the score
        assert_eq!(acc.classify(&hit(0, "chr1", 200, 0)), Verdict::TooLow);
    }

    #[test]
    fn test_special_untouched_counters() {
        let mut acc = Accumulator::new(Scoring::Tag, thresholds(10, 5), labels(), None);
        for (score, dist) in [(0, 0), (100, 0), (100, 100), (-5, 3)] {
            let g = HitGroup {
                read: "r1".to_string(),
                hits: vec![hit(1, "ERCC-00130", score, dist)],
            };
            assert_eq!(acc.record(&g, &select(0, false)).unwrap(), Verdict::Special);
        }
        let stats = acc.finish().unwrap();
        assert_eq!(stats.special, 4);
        assert_eq!(stats.reads, 4);
        assert_eq!(stats.accepted, 0);
        assert_eq!(stats.too_low, 0);
        assert_eq!(stats.too_diverged, 0);
        assert_eq!(stats.per_source, vec![0, 0]);
    }

    #[test]
    fn test_record_and_keep() {
        let buf = SharedBuf::default();
        let mut acc = Accumulator::new(
            Scoring::Tag,
            thresholds(10, 5),
            labels(),
            Some(Box::new(buf.clone())),
        );

        let g = HitGroup {
            read: "r1".to_string(),
            hits: vec![hit(0, "chr1", 20, 1), hit(1, "chr1", 20, 1)],
        };
        assert_eq!(acc.record(&g, &select(1, true)).unwrap(), Verdict::Accepted);

        let g = HitGroup {
            read: "r2".to_string(),
            hits: vec![hit(0, "chr1", 5, 0)],
        };
        assert_eq!(acc.record(&g, &select(0, false)).unwrap(), Verdict::TooLow);

        let stats = acc.finish().unwrap();
        assert_eq!(stats.total_mappings, 3);
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.multi, 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.too_low, 1);
        assert_eq!(stats.per_source, vec![0, 1]);
        assert_eq!(stats.match_len_sum, 50);
        assert!((stats.avg_match_len() - 50.0).abs() < 1e-9);

        let kept = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert_eq!(kept, "r1\tmouse\n");
    }

    #[test]
    fn test_report() {
        let mut acc = Accumulator::new(Scoring::Tag, thresholds(10, 5), labels(), None);
        let g = HitGroup {
            read: "r1".to_string(),
            hits: vec![hit(0, "chr1", 20, 1)],
        };
        acc.record(&g, &select(0, false)).unwrap();
        let g = HitGroup {
            read: "r2".to_string(),
            hits: vec![hit(1, "chr1", 20, 9), hit(1, "chr2", 3, 0)],
        };
        acc.record(&g, &select(0, false)).unwrap();

        let mut out = Vec::new();
        acc.write_report(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "total\t3",
                "too low\t0",
                "too diverged\t1",
                "reads\t2",
                "special\t0",
                "multi\t0",
                "avg match len\t50.00",
                "human\t1",
                "mouse\t0",
                "stats\t3\t0\t1\t2\t0\t0\t1\t0",
            ]
        );

        let mut out = Vec::new();
        write_report(
            acc.stats(),
            &Scoring::Computed { penalty: 2.0 },
            &labels(),
            &mut out,
        )
        .unwrap();
        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("too short\t0\n"));
        assert!(!report.contains("avg match len"));
    }
}
