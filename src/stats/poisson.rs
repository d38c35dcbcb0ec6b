use statrs::distribution::{DiscreteCDF, Poisson};

/// Expected chip count given the control count
pub fn expected_count(control: u64, scaling: f64) -> f64 {
    if control == 0 {
        scaling
    } else {
        control as f64 * scaling
    }
}

/// `P(X > chip)` for `X ~ Poisson(expected_count(control, scaling))`,
/// or 1 when `chip` does not exceed the expectation
pub fn upper_tail_pvalue(chip: u64, control: u64, scaling: f64) -> anyhow::Result<f64> {
    let average = expected_count(control, scaling);
    if chip as f64 <= average {
        return Ok(1.);
    }
    let poisson = Poisson::new(average)?;
    Ok(poisson.sf(chip))
}

/// `(chip + 1) / (control + 1)` normalized by library sizes
pub fn fold_change(chip: u64, control: u64, scaling: f64) -> f64 {
    (chip as f64 + 1.) / (control as f64 + 1.) / scaling
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn poisson_sf(k: u64, mu: f64) -> f64 {
        // 1 - sum_{i <= k} e^-mu mu^i / i!
        let mut term = (-mu).exp();
        let mut cdf = term;
        for i in 1..=k {
            term *= mu / i as f64;
            cdf += term;
        }
        1. - cdf
    }

    #[rstest]
    #[case(3, 1, 1.0)]
    #[case(7, 2, 1.5)]
    #[case(12, 5, 0.8)]
    #[case(4, 0, 1.2)]
    fn test_pvalue_closed_form(#[case] chip: u64, #[case] control: u64, #[case] scaling: f64) {
        let mu = expected_count(control, scaling);
        let p = upper_tail_pvalue(chip, control, scaling).unwrap();
        assert!((p - poisson_sf(chip, mu)).abs() < 1e-10, "{} vs {}", p, poisson_sf(chip, mu));
    }

    #[rstest]
    #[case(0, 0, 1.0)]
    #[case(2, 2, 1.0)]
    #[case(3, 2, 2.0)]
    #[case(0, 10, 0.5)]
    fn test_pvalue_not_enriched(#[case] chip: u64, #[case] control: u64, #[case] scaling: f64) {
        assert_eq!(upper_tail_pvalue(chip, control, scaling).unwrap(), 1.);
    }

    #[rstest]
    fn test_control_zero_uses_scaling() {
        assert_eq!(expected_count(0, 0.25), 0.25);
        assert_eq!(expected_count(8, 0.25), 2.);
        let p = upper_tail_pvalue(1, 0, 0.25).unwrap();
        assert!((p - poisson_sf(1, 0.25)).abs() < 1e-12);
    }

    #[rstest]
    #[case(9, 4, 1.0, 2.0)]
    #[case(9, 4, 2.0, 1.0)]
    #[case(0, 0, 0.5, 2.0)]
    fn test_fold_change(
        #[case] chip: u64,
        #[case] control: u64,
        #[case] scaling: f64,
        #[case] expected: f64,
    ) {
        assert!((fold_change(chip, control, scaling) - expected).abs() < 1e-12);
    }

    #[rstest]
    fn test_fold_change_directions() {
        // the two directions of a comparison use reciprocal scaling
        let (ko, wt, s) = (30, 10, 1.5);
        let forward = fold_change(ko, wt, s);
        let backward = fold_change(wt, ko, 1. / s);
        assert!((forward * backward - 1.).abs() < 1e-12);
    }
}
