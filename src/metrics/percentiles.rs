/// Percent scale used for percentile ranks.
const PERCENT_DIVISOR: u128 = 100;

/// Copy samples and sort the copy; the live list is never reordered.
#[must_use]
pub fn sorted_copy(samples: &[u64]) -> Vec<u64> {
    let mut values = samples.to_vec();
    values.sort_unstable();
    values
}

/// Nearest-rank percentile over ascending samples:
/// `sorted[max(0, ceil(n * pct / 100) - 1)]`.
#[must_use]
pub fn percentile(sorted: &[u64], pct: u64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let count = u128::try_from(sorted.len()).unwrap_or(u128::MAX);
    let rank = count
        .saturating_mul(u128::from(pct))
        .saturating_add(PERCENT_DIVISOR.saturating_sub(1))
        .checked_div(PERCENT_DIVISOR)
        .unwrap_or(0);
    let index = usize::try_from(rank.saturating_sub(1))
        .unwrap_or_else(|_| sorted.len().saturating_sub(1))
        .min(sorted.len().saturating_sub(1));
    sorted.get(index).copied().unwrap_or(0)
}

#[must_use]
pub fn p99(sorted: &[u64]) -> u64 {
    percentile(sorted, 99)
}
