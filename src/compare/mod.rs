pub mod differential;
pub mod report;

use crate::interval::{self, Interval};
use crate::island::caller::{call_islands, write_islands, ConditionRun};
use crate::island::EngineArgs;

use anyhow;
use clap::Args;
use log::{info, warn};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// knockout treatment (ChIP) read files, BED or BAM
    #[arg(long, num_args = 1.., required = true)]
    ko_treatment: Vec<Box<str>>,

    /// knockout control (input) read files
    #[arg(long, num_args = 1.., required = true)]
    ko_control: Vec<Box<str>>,

    /// wildtype treatment (ChIP) read files
    #[arg(long, num_args = 1.., required = true)]
    wt_treatment: Vec<Box<str>>,

    /// wildtype control (input) read files
    #[arg(long, num_args = 1.., required = true)]
    wt_control: Vec<Box<str>>,

    #[command(flatten)]
    engine: EngineArgs,

    /// FDR cutoff of the knockout/wildtype comparison
    #[arg(long, default_value_t = 0.05)]
    fdr: f64,

    /// output file header
    #[arg(short, long, default_value = "epidiff")]
    output: Box<str>,

    /// bgzf-compress output tables
    #[arg(short = 'z', long)]
    compress: bool,

    /// also write each condition's islands
    #[arg(long)]
    write_islands: bool,
}

impl CompareArgs {
    fn output_file(&self, name: &str) -> String {
        let ext = if self.compress { "tsv.gz" } else { "tsv" };
        format!("{}-{}.{}", self.output, name, ext)
    }
}

fn island_intervals(run: &ConditionRun) -> Vec<Interval> {
    run.islands.iter().map(|x| x.interval.clone()).collect()
}

pub fn run(args: &CompareArgs) -> anyhow::Result<()> {
    args.engine.init_thread_pool()?;
    run_comparison(args)
}

/// Knockout vs. wildtype differential islands
pub fn run_comparison(args: &CompareArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.fdr > 0. && args.fdr <= 1.,
        "--fdr must be in (0, 1]"
    );
    let (genome, params) = args.engine.resolve()?;

    // Step 1. Call islands for each condition against its own control
    let (ko, wt) = rayon::join(
        || call_islands(&args.ko_treatment, &args.ko_control, &genome, &params),
        || call_islands(&args.wt_treatment, &args.wt_control, &genome, &params),
    );
    let (ko, wt) = (ko?, wt?);

    for (name, x) in [("knockout", &ko), ("wildtype", &wt)] {
        info!(
            "{}: {} treatment / {} control reads, {} islands",
            name,
            x.treatment.total(),
            x.control.total(),
            x.islands.len()
        );
    }

    if args.write_islands {
        for (name, x) in [("ko-islands", &ko), ("wt-islands", &wt)] {
            let file = args.output_file(name);
            write_islands(&file, &x.islands)?;
            info!("wrote {}", file);
        }
    }

    // Step 2. Merge and recount both treatment libraries
    let union = interval::union(&island_intervals(&ko), &island_intervals(&wt));
    info!("{} union islands", union.len());

    let rows = differential::differential(&union, &ko.treatment, &wt.treatment)?;

    // Step 3. Output
    let file = args.output_file("summary");
    report::write_table(&file, &rows, |_| true)?;
    info!("wrote {}", file);

    let file = args.output_file("increased");
    let n = report::write_table(&file, &rows, |x| x.ko_vs_wt.fdr <= args.fdr)?;
    info!("{} islands increased in knockout (FDR <= {}): {}", n, args.fdr, file);

    let file = args.output_file("decreased");
    let n = report::write_table(&file, &rows, |x| x.wt_vs_ko.fdr <= args.fdr)?;
    info!("{} islands decreased in knockout (FDR <= {}): {}", n, args.fdr, file);

    let (pearson, spearman) = differential::correlations(&rows);
    match pearson {
        Some(r) => info!("Pearson correlation of normalized counts: {:.4}", r),
        None => warn!("Pearson correlation is undefined for these islands"),
    }
    match spearman {
        Some(r) => info!("Spearman correlation of normalized counts: {:.4}", r),
        None => warn!("Spearman correlation is undefined for these islands"),
    }

    Ok(())
}
