use crate::bins::{BinCounts, ChromBins};
use crate::interval::Interval;
use crate::island::EngineParams;
use crate::reads::ReadLoader;
use crate::stats::{self, Enrichment};
use crate::util::file::{format_prob, format_ratio, open_writer};
use crate::util::genome::GenomeAssembly;

use anyhow;
use log::info;
use rayon::prelude::*;
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};
use std::io::Write;

/// Enriched region of a treatment library, tested against its control
#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    pub interval: Interval,
    pub score: f64,
    pub treatment: u64,
    pub control: u64,
    pub stats: Enrichment,
}

/// Everything one condition contributes to a comparison
pub struct ConditionRun {
    pub treatment: BinCounts,
    pub control: BinCounts,
    pub islands: Vec<Island>,
}

/// Load, bin and call islands for one treatment/control pair
///
/// * `treatment` - ChIP read files
/// * `control` - input read files
pub fn call_islands(
    treatment: &[Box<str>],
    control: &[Box<str>],
    genome: &GenomeAssembly,
    params: &EngineParams,
) -> anyhow::Result<ConditionRun> {
    let loader = ReadLoader::new(genome, params.fragment_size, params.keep_duplicates);

    let (treatment_reads, control_reads) =
        rayon::join(|| loader.load(treatment), || loader.load(control));
    let (treatment_reads, control_reads) = (treatment_reads?, control_reads?);

    let treatment = BinCounts::from_reads(&treatment_reads, params.bin_size);
    let control = BinCounts::from_reads(&control_reads, params.bin_size);

    let islands = IslandCaller::new(genome, params).call(&treatment, &control)?;

    Ok(ConditionRun {
        treatment,
        control,
        islands,
    })
}

/// Smallest `k >= 1` with `P(X >= k) <= pvalue`, `X ~ Poisson(lambda)`
pub fn window_threshold(lambda: f64, pvalue: f64) -> anyhow::Result<u32> {
    anyhow::ensure!(pvalue > 0., "window p-value must be positive");
    let poisson = Poisson::new(lambda)?;
    let mut k = 1u64;
    while poisson.sf(k - 1) > pvalue {
        k += 1;
    }
    Ok(k as u32)
}

pub struct IslandCaller<'a> {
    genome: &'a GenomeAssembly,
    params: &'a EngineParams,
}

impl<'a> IslandCaller<'a> {
    pub fn new(genome: &'a GenomeAssembly, params: &'a EngineParams) -> Self {
        IslandCaller { genome, params }
    }

    /// Expected reads per bin under a uniform background
    pub fn background_rate(&self, library_size: u64) -> f64 {
        library_size as f64 * self.params.bin_size as f64 / self.genome.effective_length()
    }

    /// Runs of eligible bins with their summed scores
    fn candidates(
        &self,
        chrom: &str,
        bins: &ChromBins,
        threshold: u32,
        poisson: &Poisson,
    ) -> Vec<(Interval, f64)> {
        let bin_size = self.params.bin_size;
        let max_step = self.params.gaps_allowed + 1;
        let chrom_size = self.genome.chrom_size(chrom).unwrap_or(u64::MAX);

        // (first bin start, last bin start, score)
        let mut runs: Vec<(u64, u64, f64)> = vec![];
        let mut current: Option<(u64, u64, f64)> = None;

        for (start, count) in bins.iter() {
            if count < threshold {
                continue;
            }
            let score = -poisson.ln_pmf(count as u64);
            current = match current {
                Some((first, last, acc)) if (start - last) / bin_size <= max_step => {
                    Some((first, start, acc + score))
                }
                Some(run) => {
                    runs.push(run);
                    Some((start, start, score))
                }
                None => Some((start, start, score)),
            };
        }
        runs.extend(current);

        runs.into_iter()
            .map(|(first, last, score)| {
                let end = (last + bin_size).min(chrom_size);
                (Interval::new(chrom, first, end), score)
            })
            .collect()
    }

    /// Islands of `treatment` passing the FDR cutoff against `control`
    pub fn call(&self, treatment: &BinCounts, control: &BinCounts) -> anyhow::Result<Vec<Island>> {
        let (ntreat, ncontrol) = (treatment.total(), control.total());
        anyhow::ensure!(ntreat > 0, "treatment library has no reads on the genome");
        anyhow::ensure!(ncontrol > 0, "control library has no reads on the genome");

        let lambda = self.background_rate(ntreat);
        let threshold = window_threshold(lambda, self.params.window_pvalue)?;
        let poisson = Poisson::new(lambda)?;

        info!(
            "{} treatment / {} control reads; {:.4} reads per bin expected, bins need >= {}",
            ntreat, ncontrol, lambda, threshold
        );

        let jobs: Vec<(&str, &ChromBins)> = treatment.iter().collect();
        let candidates: Vec<(Interval, f64)> = jobs
            .par_iter()
            .map(|(chrom, bins)| self.candidates(chrom, bins, threshold, &poisson))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        let treatment_counts: Vec<u64> = candidates
            .iter()
            .map(|(x, _)| treatment.count_in(&x.chrom, x.start, x.end))
            .collect();
        let control_counts: Vec<u64> = candidates
            .iter()
            .map(|(x, _)| control.count_in(&x.chrom, x.start, x.end))
            .collect();

        let scaling = ntreat as f64 / ncontrol as f64;
        let enrichment = stats::enrichment(&treatment_counts, &control_counts, scaling)?;

        let ncandidates = candidates.len();
        let islands: Vec<Island> = candidates
            .into_iter()
            .zip(treatment_counts)
            .zip(control_counts)
            .zip(enrichment)
            .filter(|(_, e)| e.fdr <= self.params.island_fdr)
            .map(|((((interval, score), t), c), e)| Island {
                interval,
                score,
                treatment: t,
                control: c,
                stats: e,
            })
            .collect();

        info!(
            "{} of {} candidate islands pass FDR {}",
            islands.len(),
            ncandidates,
            self.params.island_fdr
        );
        Ok(islands)
    }
}

pub fn write_islands(output: &str, islands: &[Island]) -> anyhow::Result<()> {
    let mut out = open_writer(output)?;
    writeln!(
        out,
        "#chrom\tstart\tend\tscore\ttreatment_count\tcontrol_count\tfold_change\tpvalue\tfdr"
    )?;
    for x in islands {
        writeln!(
            out,
            "{}\t{}\t{}\t{:.4}\t{}\t{}\t{}\t{}\t{}",
            x.interval.chrom,
            x.interval.start,
            x.interval.end,
            x.score,
            x.treatment,
            x.control,
            format_ratio(x.stats.fold_change),
            format_prob(x.stats.pvalue),
            format_prob(x.stats.fdr)
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_bins(output: &str, bins: &BinCounts) -> anyhow::Result<()> {
    let mut out = open_writer(output)?;
    writeln!(out, "#chrom\tstart\tend\tcount")?;
    for (chrom, xs) in bins.iter() {
        for (start, count) in xs.iter() {
            writeln!(out, "{}\t{}\t{}\t{}", chrom, start, start + bins.bin_size(), count)?;
        }
    }
    out.flush()?;
    Ok(())
}
