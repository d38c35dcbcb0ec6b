use crate::util::file::read_lines;

use anyhow::{self, Context};
use std::collections::BTreeMap;

/// Primary chromosome sizes of the built-in assemblies

const HG19: &[(&str, u64)] = &[
    ("chr1", 249_250_621),
    ("chr2", 243_199_373),
    ("chr3", 198_022_430),
    ("chr4", 191_154_276),
    ("chr5", 180_915_260),
    ("chr6", 171_115_067),
    ("chr7", 159_138_663),
    ("chr8", 146_364_022),
    ("chr9", 141_213_431),
    ("chr10", 135_534_747),
    ("chr11", 135_006_516),
    ("chr12", 133_851_895),
    ("chr13", 115_169_878),
    ("chr14", 107_349_540),
    ("chr15", 102_531_392),
    ("chr16", 90_354_753),
    ("chr17", 81_195_210),
    ("chr18", 78_077_248),
    ("chr19", 59_128_983),
    ("chr20", 63_025_520),
    ("chr21", 48_129_895),
    ("chr22", 51_304_566),
    ("chrX", 155_270_560),
    ("chrY", 59_373_566),
    ("chrM", 16_571),
];

const HG38: &[(&str, u64)] = &[
    ("chr1", 248_956_422),
    ("chr2", 242_193_529),
    ("chr3", 198_295_559),
    ("chr4", 190_214_555),
    ("chr5", 181_538_259),
    ("chr6", 170_805_979),
    ("chr7", 159_345_973),
    ("chr8", 145_138_636),
    ("chr9", 138_394_717),
    ("chr10", 133_797_422),
    ("chr11", 135_086_622),
    ("chr12", 133_275_309),
    ("chr13", 114_364_328),
    ("chr14", 107_043_718),
    ("chr15", 101_991_189),
    ("chr16", 90_338_345),
    ("chr17", 83_257_441),
    ("chr18", 80_373_285),
    ("chr19", 58_617_616),
    ("chr20", 64_444_167),
    ("chr21", 46_709_983),
    ("chr22", 50_818_468),
    ("chrX", 156_040_895),
    ("chrY", 57_227_415),
    ("chrM", 16_569),
];

const MM10: &[(&str, u64)] = &[
    ("chr1", 195_471_971),
    ("chr2", 182_113_224),
    ("chr3", 160_039_680),
    ("chr4", 156_508_116),
    ("chr5", 151_834_684),
    ("chr6", 149_736_546),
    ("chr7", 145_441_459),
    ("chr8", 129_401_213),
    ("chr9", 124_595_110),
    ("chr10", 130_694_993),
    ("chr11", 122_082_543),
    ("chr12", 120_129_022),
    ("chr13", 120_421_639),
    ("chr14", 124_902_244),
    ("chr15", 104_043_685),
    ("chr16", 98_207_768),
    ("chr17", 94_987_271),
    ("chr18", 90_702_639),
    ("chr19", 61_431_566),
    ("chrX", 171_031_299),
    ("chrY", 91_744_698),
    ("chrM", 16_299),
];

/// (name, chromosome sizes, default effective genome fraction)
const BUILTIN: &[(&str, &[(&str, u64)], f64)] = &[
    ("hg19", HG19, 0.74),
    ("hg38", HG38, 0.74),
    ("mm10", MM10, 0.77),
];

/// Chromosome sizes plus the fraction of the genome that reads can
/// be uniquely mapped to.
#[derive(Debug, Clone)]
pub struct GenomeAssembly {
    name: Box<str>,
    chrom_sizes: BTreeMap<Box<str>, u64>,
    effective_fraction: f64,
}

impl GenomeAssembly {
    pub fn new(
        name: &str,
        chrom_sizes: BTreeMap<Box<str>, u64>,
        effective_fraction: f64,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            effective_fraction > 0. && effective_fraction <= 1.,
            "effective genome fraction must be in (0, 1], got {}",
            effective_fraction
        );
        anyhow::ensure!(
            !chrom_sizes.is_empty(),
            "genome {} has no chromosomes",
            name
        );
        Ok(GenomeAssembly {
            name: name.into(),
            chrom_sizes,
            effective_fraction,
        })
    }

    /// Resolve the genome from command line choices. A sizes file
    /// takes precedence over the built-in sizes of `genome`, but a
    /// built-in name still supplies the default effective fraction.
    ///
    /// * `genome` - built-in assembly name (hg19, hg38, mm10)
    /// * `chromsizes` - two-column chromosome sizes file
    /// * `effective_fraction` - overrides any default
    pub fn resolve(
        genome: Option<&str>,
        chromsizes: Option<&str>,
        effective_fraction: Option<f64>,
    ) -> anyhow::Result<Self> {
        let builtin = match genome {
            Some(name) => Some(
                BUILTIN
                    .iter()
                    .find(|(x, _, _)| *x == name)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "unknown genome {}; use one of {} or provide --chromsizes",
                            name,
                            BUILTIN
                                .iter()
                                .map(|(x, _, _)| *x)
                                .collect::<Vec<_>>()
                                .join(", ")
                        )
                    })?,
            ),
            None => None,
        };

        match (builtin, chromsizes) {
            (_, Some(file)) => {
                let fraction = effective_fraction
                    .or(builtin.map(|(_, _, f)| *f))
                    .ok_or_else(|| {
                        anyhow::anyhow!("--effective-genome-fraction is required with --chromsizes")
                    })?;
                let name = genome.unwrap_or(file);
                Self::new(name, read_chrom_sizes(file)?, fraction)
            }
            (Some((name, sizes, fraction)), None) => {
                let chrom_sizes = sizes.iter().map(|(c, s)| ((*c).into(), *s)).collect();
                Self::new(name, chrom_sizes, effective_fraction.unwrap_or(*fraction))
            }
            (None, None) => Err(anyhow::anyhow!(
                "either --genome or --chromsizes must be given"
            )),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chrom_size(&self, chrom: &str) -> Option<u64> {
        self.chrom_sizes.get(chrom).copied()
    }

    #[cfg(test)]
    pub fn chromosomes(&self) -> impl Iterator<Item = (&str, u64)> {
        self.chrom_sizes.iter().map(|(c, s)| (c.as_ref(), *s))
    }

    pub fn genome_length(&self) -> u64 {
        self.chrom_sizes.values().sum()
    }

    pub fn effective_fraction(&self) -> f64 {
        self.effective_fraction
    }

    pub fn effective_length(&self) -> f64 {
        self.genome_length() as f64 * self.effective_fraction
    }
}

/// Parse `chrom<TAB>size` lines; blank lines and `#` comments are skipped
pub fn read_chrom_sizes(file: &str) -> anyhow::Result<BTreeMap<Box<str>, u64>> {
    let mut ret = BTreeMap::new();
    for (i, line) in read_lines(file)?.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some(chrom), Some(size)) => {
                let size: u64 = size
                    .parse()
                    .with_context(|| format!("{}:{}: invalid size {}", file, i + 1, size))?;
                ret.insert(chrom.into(), size);
            }
            _ => anyhow::bail!("{}:{}: expected two columns", file, i + 1),
        }
    }
    Ok(ret)
}
