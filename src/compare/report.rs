use super::differential::DifferentialRow;
use crate::util::file::{format_prob, format_ratio, open_writer};

use anyhow;
use std::io::Write;

const HEADER: &str = "#chrom\tstart\tend\tko_count\tko_normalized\twt_count\twt_normalized\t\
fc_ko_vs_wt\tpvalue_ko_vs_wt\tfdr_ko_vs_wt\tfc_wt_vs_ko\tpvalue_wt_vs_ko\tfdr_wt_vs_ko";

fn write_row(out: &mut dyn Write, x: &DifferentialRow) -> std::io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{:.4}\t{}\t{:.4}\t{}\t{}\t{}\t{}\t{}\t{}",
        x.interval.chrom,
        x.interval.start,
        x.interval.end,
        x.ko_count,
        x.ko_normalized,
        x.wt_count,
        x.wt_normalized,
        format_ratio(x.ko_vs_wt.fold_change),
        format_prob(x.ko_vs_wt.pvalue),
        format_prob(x.ko_vs_wt.fdr),
        format_ratio(x.wt_vs_ko.fold_change),
        format_prob(x.wt_vs_ko.pvalue),
        format_prob(x.wt_vs_ko.fdr)
    )
}

/// Write the rows for which `keep` holds; returns how many
pub fn write_table<F>(output: &str, rows: &[DifferentialRow], keep: F) -> anyhow::Result<usize>
where
    F: Fn(&DifferentialRow) -> bool,
{
    let mut out = open_writer(output)?;
    writeln!(out, "{}", HEADER)?;
    let mut n = 0;
    for x in rows.iter().filter(|x| keep(*x)) {
        write_row(&mut out, x)?;
        n += 1;
    }
    out.flush()?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;
    use crate::stats::Enrichment;
    use crate::util::file::read_lines;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn row(start: u64, fdr_ko: f64, fdr_wt: f64) -> DifferentialRow {
        DifferentialRow {
            interval: Interval::new("chr1", start, start + 200),
            ko_count: 10,
            ko_normalized: 1.5,
            wt_count: 2,
            wt_normalized: 0.25,
            ko_vs_wt: Enrichment {
                fold_change: 3.5,
                pvalue: fdr_ko / 2.,
                fdr: fdr_ko,
            },
            wt_vs_ko: Enrichment {
                fold_change: 0.25,
                pvalue: 1.,
                fdr: fdr_wt,
            },
        }
    }

    #[rstest]
    fn test_write_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("increased.tsv");
        let path = path.to_str().unwrap();

        let rows = vec![row(0, 0.01, 1.), row(400, 0.2, 1.), row(800, 0.05, 1.)];
        let n = write_table(path, &rows, |x| x.ko_vs_wt.fdr <= 0.05).unwrap();
        assert_eq!(n, 2);

        let lines = read_lines(path).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split('\t').count(), 13);
        assert_eq!(
            lines[1].as_ref(),
            "chr1\t0\t200\t10\t1.5000\t2\t0.2500\t3.5000\t0.005000\t0.010000\t0.2500\t1.000000\t1.000000"
        );
        assert!(lines[2].starts_with("chr1\t800\t1000\t"));
    }

    #[rstest]
    fn test_small_fold_change_keeps_digits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.tsv");
        let path = path.to_str().unwrap();

        let mut x = row(0, 1., 1.);
        x.wt_vs_ko.fold_change = 2.5e-5;
        write_table(path, &[x], |_| true).unwrap();

        let lines = read_lines(path).unwrap();
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[10], "2.5000e-5");
    }
}
