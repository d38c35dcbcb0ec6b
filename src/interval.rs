/// Genomic interval, 0-based half-open
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub chrom: Box<str>,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(chrom: &str, start: u64, end: u64) -> Self {
        Interval {
            chrom: chrom.into(),
            start,
            end,
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// Union of two interval sets. Overlapping or touching intervals are
/// merged; the result is sorted by (chrom, start).
pub fn union(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut all: Vec<&Interval> = a.iter().chain(b.iter()).collect();
    all.sort();

    let mut ret: Vec<Interval> = Vec::with_capacity(all.len());
    for x in all {
        match ret.last_mut() {
            Some(last) if last.chrom == x.chrom && x.start <= last.end => {
                last.end = last.end.max(x.end);
            }
            _ => ret.push(x.clone()),
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn make_intervals(xs: &[(&str, u64, u64)]) -> Vec<Interval> {
        xs.iter().map(|&(c, s, e)| Interval::new(c, s, e)).collect()
    }

    #[rstest]
    fn test_union_partial_overlap() {
        let a = make_intervals(&[("chr1", 0, 10), ("chr1", 20, 30)]);
        let b = make_intervals(&[("chr1", 5, 15)]);
        assert_eq!(
            union(&a, &b),
            make_intervals(&[("chr1", 0, 15), ("chr1", 20, 30)])
        );
    }

    #[rstest]
    fn test_union_touching_and_nested() {
        let a = make_intervals(&[("chr1", 0, 10), ("chr1", 100, 200)]);
        let b = make_intervals(&[("chr1", 10, 20), ("chr1", 120, 150)]);
        assert_eq!(
            union(&a, &b),
            make_intervals(&[("chr1", 0, 20), ("chr1", 100, 200)])
        );
    }

    #[rstest]
    fn test_union_chromosomes_kept_apart() {
        let a = make_intervals(&[("chr2", 0, 10), ("chr1", 50, 60)]);
        let b = make_intervals(&[("chr1", 0, 10), ("chr2", 5, 8)]);
        assert_eq!(
            union(&a, &b),
            make_intervals(&[("chr1", 0, 10), ("chr1", 50, 60), ("chr2", 0, 10)])
        );
    }

    #[rstest]
    fn test_union_covers_inputs() {
        let a = make_intervals(&[("chr1", 0, 10), ("chr1", 40, 60), ("chr3", 1, 2)]);
        let b = make_intervals(&[("chr1", 55, 70), ("chr1", 100, 110)]);
        let u = union(&a, &b);

        for w in u.windows(2) {
            assert!(w[0].chrom < w[1].chrom || w[0].end < w[1].start);
        }
        for x in a.iter().chain(b.iter()) {
            let n = u
                .iter()
                .filter(|y| y.chrom == x.chrom && y.start <= x.start && x.end <= y.end)
                .count();
            assert_eq!(n, 1, "{}", x);
        }
    }

    #[rstest]
    fn test_union_empty() {
        assert!(union(&[], &[]).is_empty());
        let a = make_intervals(&[("chr1", 0, 10)]);
        assert_eq!(union(&a, &[]), a);
    }
}
