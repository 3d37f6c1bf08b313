//! Integer price statistics. Every rounded result rounds half away from zero.

/// Rounds a non-negative value to the nearest whole number, halves away from zero.
pub fn round_half_away(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

/// Rounds to `decimals` places, halves away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn mean(prices: &[u32]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    let total: u64 = prices.iter().map(|&p| u64::from(p)).sum();
    Some(total as f64 / prices.len() as f64)
}

/// Mean of the prices, 0 when there are none.
pub fn mean_rounded(prices: &[u32]) -> u32 {
    mean(prices).map(round_half_away).unwrap_or(0)
}

/// Median of the prices, 0 when there are none. An even count averages the
/// two middle values before rounding.
pub fn median_rounded(prices: &[u32]) -> u32 {
    if prices.is_empty() {
        return 0;
    }
    let mut sorted = prices.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        round_half_away((f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0)
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator); 0 with fewer than two prices.
pub fn sample_std_dev_rounded(prices: &[u32]) -> u32 {
    if prices.len() < 2 {
        return 0;
    }
    let Some(avg) = mean(prices) else {
        return 0;
    };
    let variance = prices
        .iter()
        .map(|&p| (f64::from(p) - avg).powi(2))
        .sum::<f64>()
        / (prices.len() - 1) as f64;
    round_half_away(variance.sqrt())
}

/// Percent change from `first` to `last`, two decimals; 0 when `first` is 0.
pub fn percent_change(first: u32, last: u32) -> f64 {
    if first == 0 {
        return 0.0;
    }
    let change = (f64::from(last) - f64::from(first)) / f64::from(first) * 100.0;
    round_to(change, 2)
}
