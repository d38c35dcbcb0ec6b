use crate::bins::BinCounts;
use crate::interval::Interval;
use crate::stats::{self, correlation, Enrichment};

use anyhow;

/// Union interval with both libraries' counts and the tests in each
/// direction
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialRow {
    pub interval: Interval,
    pub ko_count: u64,
    pub ko_normalized: f64,
    pub wt_count: u64,
    pub wt_normalized: f64,
    pub ko_vs_wt: Enrichment,
    pub wt_vs_ko: Enrichment,
}

/// Reads per million library reads
pub fn per_million(count: u64, library_size: u64) -> f64 {
    count as f64 * 1e6 / library_size as f64
}

/// Recount both treatment libraries in `union` and test each
/// direction
///
/// * `union` - merged islands of both conditions
/// * `ko` - knockout treatment bins
/// * `wt` - wildtype treatment bins
pub fn differential(
    union: &[Interval],
    ko: &BinCounts,
    wt: &BinCounts,
) -> anyhow::Result<Vec<DifferentialRow>> {
    let (nko, nwt) = (ko.total(), wt.total());
    anyhow::ensure!(nko > 0, "knockout library has no reads on the genome");
    anyhow::ensure!(nwt > 0, "wildtype library has no reads on the genome");

    let ko_counts: Vec<u64> = union
        .iter()
        .map(|x| ko.count_in(&x.chrom, x.start, x.end))
        .collect();
    let wt_counts: Vec<u64> = union
        .iter()
        .map(|x| wt.count_in(&x.chrom, x.start, x.end))
        .collect();

    let scaling = nko as f64 / nwt as f64;
    let ko_vs_wt = stats::enrichment(&ko_counts, &wt_counts, scaling)?;
    let wt_vs_ko = stats::enrichment(&wt_counts, &ko_counts, 1. / scaling)?;

    Ok(union
        .iter()
        .enumerate()
        .map(|(i, x)| DifferentialRow {
            interval: x.clone(),
            ko_count: ko_counts[i],
            ko_normalized: per_million(ko_counts[i], nko),
            wt_count: wt_counts[i],
            wt_normalized: per_million(wt_counts[i], nwt),
            ko_vs_wt: ko_vs_wt[i],
            wt_vs_ko: wt_vs_ko[i],
        })
        .collect())
}

/// Pearson and Spearman correlations of the normalized counts
pub fn correlations(rows: &[DifferentialRow]) -> (Option<f64>, Option<f64>) {
    let ko: Vec<f64> = rows.iter().map(|x| x.ko_normalized).collect();
    let wt: Vec<f64> = rows.iter().map(|x| x.wt_normalized).collect();
    (
        correlation::pearson(&ko, &wt),
        correlation::spearman(&ko, &wt),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{fold_change, upper_tail_pvalue};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn toy_bins() -> (BinCounts, BinCounts) {
        let ko = BinCounts::from_bins(
            100,
            &[
                ("chr1", &[(0, 40), (100, 20), (500, 5), (900, 2)]),
                ("chr2", &[(0, 33)]),
            ],
        );
        let wt = BinCounts::from_bins(
            100,
            &[
                ("chr1", &[(0, 4), (500, 30), (900, 2)]),
                ("chr2", &[(0, 60), (300, 6)]),
            ],
        );
        (ko, wt)
    }

    fn toy_union() -> Vec<Interval> {
        vec![
            Interval::new("chr1", 0, 200),
            Interval::new("chr1", 500, 600),
            Interval::new("chr1", 900, 1000),
            Interval::new("chr2", 0, 400),
        ]
    }

    #[rstest]
    fn test_counts_and_normalization() {
        let (ko, wt) = toy_bins();
        let rows = differential(&toy_union(), &ko, &wt).unwrap();

        let counts: Vec<(u64, u64)> = rows.iter().map(|x| (x.ko_count, x.wt_count)).collect();
        assert_eq!(counts, vec![(60, 4), (5, 30), (2, 2), (33, 66)]);

        // library sizes 100 and 102
        assert!((rows[0].ko_normalized - 600_000.).abs() < 1e-6);
        assert!((rows[1].wt_normalized - 30e6 / 102.).abs() < 1e-6);
    }

    #[rstest]
    fn test_statistics_closed_form() {
        let (ko, wt) = toy_bins();
        let rows = differential(&toy_union(), &ko, &wt).unwrap();
        let scaling = 100. / 102.;

        for x in rows.iter() {
            let fc = fold_change(x.ko_count, x.wt_count, scaling);
            assert!((x.ko_vs_wt.fold_change - fc).abs() < 1e-12);
            let fc = fold_change(x.wt_count, x.ko_count, 1. / scaling);
            assert!((x.wt_vs_ko.fold_change - fc).abs() < 1e-12);

            let p = upper_tail_pvalue(x.ko_count, x.wt_count, scaling).unwrap();
            assert_eq!(x.ko_vs_wt.pvalue, p);
            let p = upper_tail_pvalue(x.wt_count, x.ko_count, 1. / scaling).unwrap();
            assert_eq!(x.wt_vs_ko.pvalue, p);
        }

        // 60 vs 4 is enriched in the knockout, 5 vs 30 in the wildtype
        assert!(rows[0].ko_vs_wt.fdr < 0.05);
        assert_eq!(rows[0].wt_vs_ko.pvalue, 1.);
        assert!(rows[1].wt_vs_ko.fdr < 0.05);
        assert_eq!(rows[1].ko_vs_wt.pvalue, 1.);
        assert!(rows[2].ko_vs_wt.fdr > 0.05);
    }

    #[rstest]
    fn test_empty_library() {
        let (ko, _) = toy_bins();
        let empty = BinCounts::from_bins(100, &[]);
        assert!(differential(&toy_union(), &ko, &empty).is_err());
        assert!(differential(&toy_union(), &empty, &ko).is_err());
    }

    #[rstest]
    fn test_correlations() {
        let (ko, wt) = toy_bins();
        let rows = differential(&toy_union(), &ko, &wt).unwrap();
        let (pearson, spearman) = correlations(&rows);
        let (pearson, spearman) = (pearson.unwrap(), spearman.unwrap());
        assert!((-1. ..=1.).contains(&pearson));
        assert!((-1. ..=1.).contains(&spearman));

        let (pearson, spearman) = correlations(&rows[..1]);
        assert!(pearson.is_none() && spearman.is_none());
    }
}
