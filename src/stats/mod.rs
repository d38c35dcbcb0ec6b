//! Poisson enrichment of chip over control counts with rank-based
//! false discovery rates.

pub mod correlation;
pub mod poisson;
pub mod rank;

pub use poisson::{fold_change, upper_tail_pvalue};
pub use rank::fdr;

/// Per-interval statistics of one direction of a comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enrichment {
    pub fold_change: f64,
    pub pvalue: f64,
    pub fdr: f64,
}

/// Test every `chip[i]` against `control[i]`.
///
/// * `chip` - counts in the library tested for enrichment
/// * `control` - counts in the reference library, aligned with `chip`
/// * `scaling` - library size of `chip` over library size of `control`
pub fn enrichment(chip: &[u64], control: &[u64], scaling: f64) -> anyhow::Result<Vec<Enrichment>> {
    anyhow::ensure!(
        chip.len() == control.len(),
        "count vectors differ in length: {} vs {}",
        chip.len(),
        control.len()
    );
    anyhow::ensure!(
        scaling.is_finite() && scaling > 0.,
        "invalid scaling factor {}",
        scaling
    );

    let pvalues = chip
        .iter()
        .zip(control.iter())
        .map(|(&x, &y)| upper_tail_pvalue(x, y, scaling))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let fdrs = fdr(&pvalues);

    Ok(chip
        .iter()
        .zip(control.iter())
        .zip(pvalues.iter().zip(fdrs.iter()))
        .map(|((&x, &y), (&pvalue, &fdr))| Enrichment {
            fold_change: fold_change(x, y, scaling),
            pvalue,
            fdr,
        })
        .collect())
}
