pub mod caller;

use crate::util::genome::GenomeAssembly;

use anyhow;
use clap::Args;
use log::info;
use std::cmp::min;
use std::thread;

/// Options shared by every command that calls islands
#[derive(Args, Debug)]
pub struct EngineArgs {
    /// genome assembly with built-in chromosome sizes (hg19, hg38, mm10)
    #[arg(short, long)]
    genome: Option<Box<str>>,

    /// chromosome sizes file (chrom<TAB>size); overrides built-in sizes
    #[arg(long)]
    chromsizes: Option<Box<str>>,

    /// fraction of the genome that is uniquely mappable
    /// (default: 0.74 for human, 0.77 for mouse)
    #[arg(short, long)]
    effective_genome_fraction: Option<f64>,

    /// bin (window) size in bp
    #[arg(short, long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(1..))]
    bin_size: u64,

    /// number of empty bins allowed inside an island
    #[arg(long, default_value_t = 3)]
    gaps_allowed: u64,

    /// estimated fragment size; reads are shifted by half of it
    #[arg(short, long, default_value_t = 150)]
    fragment_size: u64,

    /// Poisson p-value a bin must reach to be part of an island
    #[arg(long, default_value_t = 0.2)]
    window_pvalue: f64,

    /// FDR cutoff of islands against their control
    #[arg(long, default_value_t = 0.05)]
    island_fdr: f64,

    /// keep reads with identical coordinates and strand
    #[arg(long)]
    keep_duplicates: bool,

    /// number of threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

/// Island calling parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    pub bin_size: u64,
    pub gaps_allowed: u64,
    pub fragment_size: u64,
    pub window_pvalue: f64,
    pub island_fdr: f64,
    pub keep_duplicates: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            bin_size: 200,
            gaps_allowed: 3,
            fragment_size: 150,
            window_pvalue: 0.2,
            island_fdr: 0.05,
            keep_duplicates: false,
        }
    }
}

impl EngineArgs {
    /// Validate and split into genome and calling parameters
    pub fn resolve(&self) -> anyhow::Result<(GenomeAssembly, EngineParams)> {
        anyhow::ensure!(
            self.window_pvalue > 0. && self.window_pvalue < 1.,
            "--window-pvalue must be in (0, 1)"
        );
        anyhow::ensure!(
            self.island_fdr > 0. && self.island_fdr <= 1.,
            "--island-fdr must be in (0, 1]"
        );

        let genome = GenomeAssembly::resolve(
            self.genome.as_deref(),
            self.chromsizes.as_deref(),
            self.effective_genome_fraction,
        )?;

        info!(
            "genome {}: {} bp, effective fraction {}",
            genome.name(),
            genome.genome_length(),
            genome.effective_fraction()
        );

        let params = EngineParams {
            bin_size: self.bin_size,
            gaps_allowed: self.gaps_allowed,
            fragment_size: self.fragment_size,
            window_pvalue: self.window_pvalue,
            island_fdr: self.island_fdr,
            keep_duplicates: self.keep_duplicates,
        };
        Ok((genome, params))
    }

    pub fn init_thread_pool(&self) -> anyhow::Result<()> {
        let nthread_max = thread::available_parallelism()?.get();

        let nthread = match self.threads {
            Some(x) => min(nthread_max, x.max(1)),
            None => nthread_max,
        };

        rayon::ThreadPoolBuilder::new()
            .num_threads(nthread)
            .build_global()?;
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct IslandArgs {
    /// treatment (ChIP) read files, BED or BAM
    #[arg(short, long, num_args = 1.., required = true)]
    treatment: Vec<Box<str>>,

    /// control (input) read files, BED or BAM
    #[arg(short, long, num_args = 1.., required = true)]
    control: Vec<Box<str>>,

    #[command(flatten)]
    engine: EngineArgs,

    /// output island table (.gz for compressed output)
    #[arg(short, long)]
    output: Box<str>,

    /// also write treatment read counts per non-empty bin
    #[arg(long)]
    bins_output: Option<Box<str>>,
}

/// Call islands of one treatment/control pair
pub fn run(args: &IslandArgs) -> anyhow::Result<()> {
    args.engine.init_thread_pool()?;
    let (genome, params) = args.engine.resolve()?;

    let run = caller::call_islands(&args.treatment, &args.control, &genome, &params)?;

    caller::write_islands(&args.output, &run.islands)?;
    info!("wrote {} islands to {}", run.islands.len(), args.output);

    if let Some(file) = args.bins_output.as_deref() {
        caller::write_bins(file, &run.treatment)?;
        info!("wrote bin counts to {}", file);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        engine: EngineArgs,
    }

    fn parse(args: &[&str]) -> anyhow::Result<(GenomeAssembly, EngineParams)> {
        let cli = TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied()))?;
        cli.engine.resolve()
    }

    #[rstest]
    fn test_defaults() {
        let (genome, params) = parse(&["--genome", "hg19"]).unwrap();
        assert_eq!(genome.name(), "hg19");
        assert_eq!(params, EngineParams::default());
    }

    #[rstest]
    fn test_overrides() {
        let (genome, params) = parse(&[
            "-g",
            "mm10",
            "-e",
            "0.8",
            "--bin-size",
            "100",
            "--gaps-allowed",
            "1",
            "--keep-duplicates",
        ])
        .unwrap();
        assert_eq!(genome.effective_fraction(), 0.8);
        assert_eq!(params.bin_size, 100);
        assert_eq!(params.gaps_allowed, 1);
        assert!(params.keep_duplicates);
    }

    #[rstest]
    #[case(&["--genome", "hg19", "--island-fdr", "0"])]
    #[case(&["--genome", "hg19", "--window-pvalue", "1"])]
    #[case(&["--genome", "hg19", "--bin-size", "0"])]
    #[case(&[])]
    fn test_invalid(#[case] args: &[&str]) {
        assert!(parse(args).is_err());
    }
}
