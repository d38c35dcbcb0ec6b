/// 1-based ranks; ties share the average of their positions
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2. + 1.;
        for &k in &order[i..=j] {
            ranks[k] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// False discovery rates `p * N / rank(p)`, capped at 1 and made
/// non-decreasing in p-value order.
///
/// The second step is a running minimum from the largest p-value down,
/// so an entry can come out below its own `p * N / rank(p)`. For
/// `[0.01, 0.04, 0.03, 0.2]` the bare ratio at 0.03 is `0.06`, but the
/// returned value is `0.0533`, taken from 0.04 (`0.04 * 4 / 3`).
pub fn fdr(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len() as f64;
    let ranks = average_ranks(pvalues);

    let mut ret: Vec<f64> = pvalues
        .iter()
        .zip(ranks.iter())
        .map(|(&p, &r)| (p * n / r).min(1.))
        .collect();

    let mut order: Vec<usize> = (0..pvalues.len()).collect();
    order.sort_by(|&a, &b| pvalues[b].total_cmp(&pvalues[a]));

    let mut running = 1f64;
    for k in order {
        running = running.min(ret[k]);
        ret[k] = running;
    }
    ret
}
