use crate::analyzer::statistics::round_to;
use crate::model::{MarketBias, MarketComparison, Stats};

/// Compares buy-side bids against sell-side asks.
///
/// `diff_percent` is the absolute gap relative to the lower of the two
/// averages, one decimal place. `count_diff_percent` does the same for
/// listing counts.
pub fn compare(buy: &Stats, sell: &Stats) -> MarketComparison {
    let avg_price_diff = i64::from(buy.avg_price) - i64::from(sell.avg_price);
    let count_diff = buy.count_total as i64 - sell.count_total as i64;

    let (bias, base) = if avg_price_diff > 0 {
        (MarketBias::SellersMarket, sell.avg_price)
    } else if avg_price_diff < 0 {
        (MarketBias::BuyersMarket, buy.avg_price)
    } else {
        (MarketBias::Balanced, 0)
    };

    let diff_percent = gap_percent(avg_price_diff.unsigned_abs(), u64::from(base));

    let smaller_count = if count_diff > 0 {
        sell.count_total
    } else if count_diff < 0 {
        buy.count_total
    } else {
        0
    };
    let count_diff_percent = gap_percent(count_diff.unsigned_abs(), smaller_count as u64);

    MarketComparison {
        avg_price_diff,
        diff_percent,
        count_diff,
        count_diff_percent,
        bias,
    }
}

/// `gap` as a percent of `base`, one decimal; 0 when `base` is 0.
fn gap_percent(gap: u64, base: u64) -> f64 {
    if base == 0 {
        0.0
    } else {
        round_to(gap as f64 / base as f64 * 100.0, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trend;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn stats(avg_price: u32, count_total: usize) -> Stats {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Stats {
            count_today: 0,
            count_total,
            count_last_3: 0,
            count_last_7: 0,
            first_date: day,
            last_date: day,
            avg_price,
            median_price: avg_price,
            std_dev: 0,
            max_price: avg_price,
            max_price_date: Some(day),
            min_price: avg_price,
            min_price_date: Some(day),
            avg_price_today: 0,
            avg_price_last_3: 0,
            avg_price_last_7: 0,
            price_change_percent: 0.0,
            trend: Trend::Unchanged,
            daily_avg: BTreeMap::new(),
        }
    }

    #[test]
    fn buyers_bidding_higher_is_a_sellers_market() {
        let c = compare(&stats(210, 12), &stats(200, 8));
        assert_eq!(c.bias, MarketBias::SellersMarket);
        assert_eq!(c.avg_price_diff, 10);
        assert_eq!(c.diff_percent, 5.0);
        assert_eq!(c.count_diff, 4);
        assert_eq!(c.count_diff_percent, 50.0);
    }

    #[test]
    fn sellers_asking_higher_is_a_buyers_market() {
        let c = compare(&stats(150, 3), &stats(200, 9));
        assert_eq!(c.bias, MarketBias::BuyersMarket);
        assert_eq!(c.avg_price_diff, -50);
        assert_eq!(c.diff_percent, 33.3);
        assert_eq!(c.count_diff, -6);
        assert_eq!(c.count_diff_percent, 200.0);
    }

    #[test]
    fn equal_averages_are_balanced() {
        let c = compare(&stats(200, 5), &stats(200, 5));
        assert_eq!(c.bias, MarketBias::Balanced);
        assert_eq!(c.diff_percent, 0.0);
        assert_eq!(c.count_diff_percent, 0.0);
    }

    #[test]
    fn count_gap_is_relative_to_the_quieter_side() {
        let c = compare(&stats(200, 4), &stats(200, 7));
        assert_eq!(c.count_diff, -3);
        assert_eq!(c.count_diff_percent, 75.0);
        assert_eq!(c.bias, MarketBias::Balanced);
    }
}
