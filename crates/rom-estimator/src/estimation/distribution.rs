use super::domain::DistributionRow;

/// Built-in split used when a platform does not define a row for a rating.
pub const DEFAULT_DISTRIBUTION: [(u8, DistributionRow); 5] = [
    (1, [70.0, 20.0, 10.0, 0.0]),
    (2, [50.0, 30.0, 15.0, 5.0]),
    (3, [40.0, 30.0, 20.0, 10.0]),
    (4, [25.0, 30.0, 30.0, 15.0]),
    (5, [10.0, 25.0, 35.0, 30.0]),
];

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// How far a row may drift from 100% before validation flags it.
pub const ROW_SUM_TOLERANCE: f64 = 0.5;

/// Percentages are split in millionths of a percent.
const WEIGHT_SCALE: f64 = 1_000_000.0;

/// Splits `total` across the four tiers with largest-remainder rounding.
///
/// Each tier first receives the floor of its proportional share. The units lost to
/// flooring go one at a time to the tiers with the largest fractional remainder, ties
/// resolved in tier order. Shares are taken relative to the row's own sum, so a row
/// that does not add up to 100 still yields counts summing exactly to `total`.
/// Weights are fixed to millionths of a percent first so the split is integer math.
///
/// Returns `None` for a row whose weights are all zero, negative, or not finite.
pub fn distribute(total: u64, row: DistributionRow) -> Option<[u64; 4]> {
    let mut weights = [0u128; 4];
    for (slot, weight) in weights.iter_mut().zip(row) {
        *slot = scaled_weight(weight)?;
    }
    let weight_sum: u128 = weights.iter().sum();
    if weight_sum == 0 {
        return None;
    }

    let total_wide = u128::from(total);
    let mut counts = [0u64; 4];
    let mut remainders = [0u128; 4];
    for (index, weight) in weights.iter().enumerate() {
        // Both factors fit in u64, so the product fits in u128.
        let share = total_wide * weight;
        // share / weight_sum <= total, so the narrowing cannot truncate.
        counts[index] = (share / weight_sum) as u64;
        remainders[index] = share % weight_sum;
    }

    let assigned: u64 = counts.iter().sum();
    let leftover = total - assigned;

    let mut order = [0usize, 1, 2, 3];
    // Stable sort keeps tier order among equal remainders.
    order.sort_by(|a, b| remainders[*b].cmp(&remainders[*a]));
    for index in order.iter().take(leftover as usize) {
        counts[*index] += 1;
    }

    Some(counts)
}

fn scaled_weight(weight: f64) -> Option<u128> {
    if !weight.is_finite() || weight < 0.0 {
        return None;
    }
    let scaled = (weight * WEIGHT_SCALE).round();
    if scaled > u64::MAX as f64 {
        return None;
    }
    Some(u128::from(scaled as u64))
}

/// Whether every weight in the row can be split.
pub fn row_is_usable(row: &DistributionRow) -> bool {
    row.iter().all(|weight| scaled_weight(*weight).is_some())
}

/// Sum of a row's percentages, for validation.
pub fn row_sum(row: &DistributionRow) -> f64 {
    row.iter().sum()
}
