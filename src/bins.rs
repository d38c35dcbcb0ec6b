use crate::reads::ReadSet;

use rayon::prelude::*;
use std::collections::BTreeMap;

/// Non-empty bins of one chromosome, sorted by start
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChromBins {
    pub starts: Vec<u64>,
    pub counts: Vec<u32>,
}

impl ChromBins {
    /// Bin sorted positions
    fn from_positions(positions: &[u64], bin_size: u64) -> Self {
        let mut ret = ChromBins::default();
        for &pos in positions {
            let start = pos - pos % bin_size;
            match ret.starts.last() {
                Some(&last) if last == start => {
                    if let Some(c) = ret.counts.last_mut() {
                        *c += 1;
                    }
                }
                _ => {
                    ret.starts.push(start);
                    ret.counts.push(1);
                }
            }
        }
        ret
    }

    /// Sum of bins starting within `[start, end)`
    pub fn count_in(&self, start: u64, end: u64) -> u64 {
        let lb = self.starts.partition_point(|&s| s < start);
        let ub = self.starts.partition_point(|&s| s < end);
        self.counts[lb..ub.max(lb)].iter().map(|&c| c as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.starts.iter().copied().zip(self.counts.iter().copied())
    }
}

/// Read counts in fixed-size genomic bins
#[derive(Debug, Clone)]
pub struct BinCounts {
    bin_size: u64,
    chroms: BTreeMap<Box<str>, ChromBins>,
}

impl BinCounts {
    pub fn from_reads(reads: &ReadSet, bin_size: u64) -> Self {
        let jobs: Vec<(&str, &[u64])> = reads.iter().collect();
        let chroms = jobs
            .par_iter()
            .map(|(chrom, positions)| {
                (
                    Box::<str>::from(*chrom),
                    ChromBins::from_positions(positions, bin_size),
                )
            })
            .collect();
        BinCounts { bin_size, chroms }
    }

    pub fn bin_size(&self) -> u64 {
        self.bin_size
    }

    /// library size
    pub fn total(&self) -> u64 {
        self.chroms
            .values()
            .flat_map(|x| x.counts.iter())
            .map(|&c| c as u64)
            .sum()
    }

    pub fn chrom(&self, chrom: &str) -> Option<&ChromBins> {
        self.chroms.get(chrom)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChromBins)> {
        self.chroms.iter().map(|(c, x)| (c.as_ref(), x))
    }

    /// Reads in bins starting within `[start, end)`; exact for
    /// bin-aligned intervals
    pub fn count_in(&self, chrom: &str, start: u64, end: u64) -> u64 {
        self.chrom(chrom).map_or(0, |x| x.count_in(start, end))
    }

    /// Build directly from `(chrom, [(bin start, count)])`
    #[cfg(test)]
    pub fn from_bins(bin_size: u64, bins: &[(&str, &[(u64, u32)])]) -> Self {
        let chroms = bins
            .iter()
            .map(|(chrom, xs)| {
                let mut x = ChromBins::default();
                for &(s, c) in xs.iter() {
                    x.starts.push(s);
                    x.counts.push(c);
                }
                (Box::<str>::from(*chrom), x)
            })
            .collect();
        BinCounts { bin_size, chroms }
    }
}
