use crate::util::file::open_reader;
use crate::util::genome::GenomeAssembly;

use anyhow::{self, Context};
use bio::io::bed;
use bio::bio_types::strand::Strand;
use log::{debug, info};
use rayon::prelude::*;
use rust_htslib::bam::{self, ext::BamRecordExtensions, Read};
use std::collections::{BTreeMap, HashMap};

/// An aligned read; `start..end` on the reference, 0-based half-open
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fragment {
    pub start: u64,
    pub end: u64,
    pub reverse: bool,
}

impl Fragment {
    /// Move the read `shift` bp toward its 3' end to approximate the
    /// centre of the sequenced fragment. `None` if it falls off the
    /// start of the chromosome.
    pub fn shifted_position(&self, shift: u64) -> Option<u64> {
        if self.reverse {
            self.end.checked_sub(1)?.checked_sub(shift)
        } else {
            self.start.checked_add(shift)
        }
    }
}

pub type FragmentMap = HashMap<Box<str>, Vec<Fragment>>;

fn push_fragment(map: &mut FragmentMap, chrom: &str, frag: Fragment) {
    match map.get_mut(chrom) {
        Some(frags) => frags.push(frag),
        None => {
            map.insert(chrom.into(), vec![frag]);
        }
    }
}

/// Read fragments from a BED file (plain or gzipped). Records
/// without a strand column count as forward.
pub fn read_bed_fragments(file: &str) -> anyhow::Result<FragmentMap> {
    let mut reader = bed::Reader::new(open_reader(file)?);
    let mut ret = FragmentMap::new();

    for (i, rec) in reader.records().enumerate() {
        let rec = rec.with_context(|| format!("{}: malformed BED record #{}", file, i + 1))?;
        let frag = Fragment {
            start: rec.start(),
            end: rec.end(),
            reverse: matches!(rec.strand(), Some(Strand::Reverse)),
        };
        push_fragment(&mut ret, rec.chrom(), frag);
    }
    Ok(ret)
}

/// Read fragments from a BAM file, skipping unmapped, secondary,
/// supplementary and QC-failed records
pub fn read_bam_fragments(file: &str) -> anyhow::Result<FragmentMap> {
    let mut reader = bam::Reader::from_path(file)
        .with_context(|| format!("failed to initialize BAM file: {}", file))?;

    let names: Vec<Box<str>> = reader
        .header()
        .target_names()
        .iter()
        .map(|name| String::from_utf8_lossy(name).into())
        .collect();

    let mut ret = FragmentMap::new();

    for rr in reader.records() {
        let rec = rr?;
        if rec.is_unmapped()
            || rec.is_secondary()
            || rec.is_supplementary()
            || rec.is_quality_check_failed()
            || rec.tid() < 0
        {
            continue;
        }
        let Some(chrom) = names.get(rec.tid() as usize) else {
            continue;
        };
        let frag = Fragment {
            start: rec.reference_start() as u64,
            end: rec.reference_end() as u64,
            reverse: rec.is_reverse(),
        };
        push_fragment(&mut ret, chrom, frag);
    }
    Ok(ret)
}

fn read_fragments(file: &str) -> anyhow::Result<FragmentMap> {
    if file.to_ascii_lowercase().ends_with(".bam") {
        read_bam_fragments(file)
    } else {
        read_bed_fragments(file)
    }
}

/// Shifted read positions of one library, sorted per chromosome
#[derive(Debug, Default)]
pub struct ReadSet {
    chroms: BTreeMap<Box<str>, Vec<u64>>,
}

impl ReadSet {
    /// library size
    pub fn total(&self) -> u64 {
        self.chroms.values().map(|x| x.len() as u64).sum()
    }

    #[cfg(test)]
    pub fn positions(&self, chrom: &str) -> Option<&[u64]> {
        self.chroms.get(chrom).map(|x| x.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.chroms.iter().map(|(c, x)| (c.as_ref(), x.as_slice()))
    }
}

pub struct ReadLoader<'a> {
    genome: &'a GenomeAssembly,
    shift: u64,
    keep_duplicates: bool,
}

impl<'a> ReadLoader<'a> {
    pub fn new(genome: &'a GenomeAssembly, fragment_size: u64, keep_duplicates: bool) -> Self {
        ReadLoader {
            genome,
            shift: fragment_size / 2,
            keep_duplicates,
        }
    }

    /// Pool the reads of all `files` into one library
    pub fn load(&self, files: &[Box<str>]) -> anyhow::Result<ReadSet> {
        let per_file = files
            .par_iter()
            .map(|f| read_fragments(f))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut pooled = FragmentMap::new();
        for map in per_file {
            for (chrom, mut frags) in map {
                pooled.entry(chrom).or_default().append(&mut frags);
            }
        }

        let ret = self.to_read_set(pooled);
        info!("{} reads from {}", ret.total(), files.join(", "));
        Ok(ret)
    }

    /// Remove duplicates, shift, and drop reads off the genome
    pub fn to_read_set(&self, fragments: FragmentMap) -> ReadSet {
        let mut chroms = BTreeMap::new();
        let (mut nduplicate, mut noutside) = (0usize, 0usize);

        for (chrom, mut frags) in fragments {
            let Some(size) = self.genome.chrom_size(&chrom) else {
                debug!("{} reads on {} not in {}", frags.len(), chrom, self.genome.name());
                noutside += frags.len();
                continue;
            };

            if !self.keep_duplicates {
                let n = frags.len();
                frags.sort_unstable();
                frags.dedup();
                nduplicate += n - frags.len();
            }

            let mut positions = Vec::with_capacity(frags.len());
            for f in frags {
                match f.shifted_position(self.shift) {
                    Some(pos) if pos < size => positions.push(pos),
                    _ => noutside += 1,
                }
            }
            positions.sort_unstable();

            if !positions.is_empty() {
                chroms.insert(chrom, positions);
            }
        }

        debug!(
            "dropped {} duplicate reads and {} reads outside the genome",
            nduplicate, noutside
        );

        ReadSet { chroms }
    }
}
