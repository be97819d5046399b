//! Choosing the best hit of a read.
use crate::libs::merge::HitGroup;
use crate::libs::sam::AlignmentRecord;
use rand::Rng;

/// How a hit is scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scoring {
    /// The aligner's own score, the `AS` tag
    Tag,
    /// `match_len - edit_dist * penalty`
    Computed { penalty: f64 },
}

impl Scoring {
    pub fn score(&self, record: &AlignmentRecord) -> f64 {
        match self {
            Scoring::Tag => record.score() as f64,
            Scoring::Computed { penalty } => {
                record.match_len as f64 - record.edit_dist() as f64 * penalty
            }
        }
    }

    /// The value compared against the acceptance threshold
    pub fn metric(&self, record: &AlignmentRecord) -> i64 {
        match self {
            Scoring::Tag => record.score(),
            Scoring::Computed { .. } => record.match_len as i64,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scoring::Tag => "tag",
            Scoring::Computed { .. } => "computed",
        }
    }
}

/// Source of the tie-break choice.
pub trait IndexPicker {
    /// An index in `0..len`; `len` is at least 1.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform picks from a `rand` generator.
pub struct RandomPicker<R>(pub R);

impl<R: Rng> IndexPicker for RandomPicker<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Index of the winner in `HitGroup::hits`
    pub best: usize,
    pub score: f64,
    /// Hits sharing the best score
    pub tied: usize,
    /// The tied hits come from more than one source
    pub multi_source: bool,
}

/// Score every hit and pick the best one, breaking ties with `picker`.
///
/// Returns `None` only for an empty group.
pub fn select_best(
    group: &HitGroup,
    scoring: &Scoring,
    picker: &mut dyn IndexPicker,
) -> Option<Selection> {
    let mut best_score = 0.0;
    let mut which_best: Vec<usize> = vec![];
    for (j, hit) in group.hits.iter().enumerate() {
        let score = scoring.score(&hit.record);
        if which_best.is_empty() || score > best_score {
            best_score = score;
            which_best.clear();
            which_best.push(j);
        } else if score == best_score {
            which_best.push(j);
        }
    }

    let first = *which_best.first()?;
    if which_best.len() == 1 {
        return Some(Selection {
            best: first,
            score: best_score,
            tied: 1,
            multi_source: false,
        });
    }

    let first_source = group.hits[first].source;
    let multi_source = which_best
        .iter()
        .any(|&j| group.hits[j].source != first_source);
    let best = which_best[picker.pick(which_best.len())];

    Some(Selection {
        best,
        score: best_score,
        tied: which_best.len(),
        multi_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::merge::Hit;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Replays a fixed sequence of picks
    struct FixedPicker {
        picks: Vec<usize>,
        calls: usize,
    }

    impl IndexPicker for FixedPicker {
        fn pick(&mut self, len: usize) -> usize {
            let p = self.picks[self.calls % self.picks.len()] % len;
            self.calls += 1;
            p
        }
    }

    fn hit(source: usize, score: i64, dist: i64, cigar: &str) -> Hit {
        let line = format!(
            "r1\t0\tchr{}\t1\t255\t{}\t*\t0\t0\tACGT\tIIII\tAS:i:{}\tnM:i:{}",
            source, cigar, score, dist
        );
        Hit {
            source,
            record: line.parse().unwrap(),
        }
    }

    fn group(hits: Vec<Hit>) -> HitGroup {
        HitGroup {
            read: "r1".to_string(),
            hits,
        }
    }

    #[test]
    fn test_scores() {
        let h = hit(0, 68, 2, "5S70M1I");
        assert_relative_eq!(Scoring::Tag.score(&h.record), 68.0);
        assert_relative_eq!(Scoring::Computed { penalty: 2.0 }.score(&h.record), 66.0);
        assert_relative_eq!(Scoring::Computed { penalty: 0.5 }.score(&h.record), 69.0);
        assert_eq!(Scoring::Tag.metric(&h.record), 68);
        assert_eq!(Scoring::Computed { penalty: 2.0 }.metric(&h.record), 70);
    }

    #[test]
    fn test_single_best() {
        let g = group(vec![hit(0, 10, 0, "76M"), hit(1, 15, 0, "76M"), hit(2, 12, 0, "76M")]);
        let mut picker = FixedPicker { picks: vec![0], calls: 0 };
        let sel = select_best(&g, &Scoring::Tag, &mut picker).unwrap();
        assert_eq!(sel.best, 1);
        assert_eq!(sel.tied, 1);
        assert!(!sel.multi_source);
        // no tie, no pick
        assert_eq!(picker.calls, 0);
    }

    #[test]
    fn test_tie_across_sources() {
        let g = group(vec![hit(0, 10, 0, "76M"), hit(1, 15, 0, "76M"), hit(2, 15, 0, "76M")]);

        let mut picker = FixedPicker { picks: vec![0], calls: 0 };
        let sel = select_best(&g, &Scoring::Tag, &mut picker).unwrap();
        assert_eq!(sel.best, 1);
        assert_eq!(sel.tied, 2);
        assert!(sel.multi_source);

        let mut picker = FixedPicker { picks: vec![1], calls: 0 };
        let sel = select_best(&g, &Scoring::Tag, &mut picker).unwrap();
        assert_eq!(sel.best, 2);

        // seeded generator: always a 15, same winner on every run with the seed
        let mut winners = vec![];
        for _ in 0..5 {
            let mut picker = RandomPicker(StdRng::seed_from_u64(7));
            let sel = select_best(&g, &Scoring::Tag, &mut picker).unwrap();
            assert!(sel.best == 1 || sel.best == 2);
            winners.push(sel.best);
        }
        assert!(winners.iter().all(|&w| w == winners[0]));
    }

    #[test]
    fn test_tie_within_source() {
        let g = group(vec![hit(1, 20, 0, "76M"), hit(1, 20, 3, "76M"), hit(0, 5, 0, "76M")]);
        let mut picker = FixedPicker { picks: vec![1], calls: 0 };
        let sel = select_best(&g, &Scoring::Tag, &mut picker).unwrap();
        assert_eq!(sel.best, 1);
        assert_eq!(sel.tied, 2);
        assert!(!sel.multi_source);

        // the computed score separates them
        let sel = select_best(&g, &Scoring::Computed { penalty: 2.0 }, &mut picker).unwrap();
        assert_eq!(sel.tied, 2);
        assert!(sel.multi_source);
        assert_relative_eq!(sel.score, 76.0);
    }

    #[test]
    fn test_negative_scores() {
        let g = group(vec![hit(0, -5, 0, "76M"), hit(1, -3, 0, "76M")]);
        let mut picker = RandomPicker(StdRng::seed_from_u64(1));
        let sel = select_best(&g, &Scoring::Tag, &mut picker).unwrap();
        assert_eq!(sel.best, 1);
        assert_relative_eq!(sel.score, -3.0);
    }

    #[test]
    fn test_empty_group() {
        let g = group(vec![]);
        let mut picker = FixedPicker { picks: vec![0], calls: 0 };
        assert!(select_best(&g, &Scoring::Tag, &mut picker).is_none());
    }

    #[test]
    fn test_random_picker_range() {
        let mut picker = RandomPicker(StdRng::seed_from_u64(3));
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[picker.pick(3)] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(picker.pick(1), 0);
    }
}
