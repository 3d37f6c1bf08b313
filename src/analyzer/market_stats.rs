use crate::analyzer::comparison::compare;
use crate::analyzer::statistics::{
    mean_rounded, median_rounded, percent_change, sample_std_dev_rounded,
};
use crate::model::{
    AnalyzerError, DATE_FORMAT, Direction, MarketAnalysis, MarketReport, Record, Stats, Trend,
};
use crate::normalizer::{PriceInput, normalize_price};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Trait defining the interface for a listing analyzer.
pub trait Analyzer {
    /// Computes statistics for both directions. `today` anchors the
    /// today / last 3 days / last 7 days windows.
    fn analyze(&self, records: &[Record], year_filter: Option<i32>, today: NaiveDate) -> MarketAnalysis;
}

/// A record that survived date parsing, year filtering and price re-normalization.
#[derive(Debug, Clone, Copy)]
struct ParsedRecord {
    date: NaiveDate,
    price: u32,
}

pub struct MarketAnalyzer {
    usd_rate: f64,
}

impl MarketAnalyzer {
    pub fn new(usd_rate: f64) -> Result<Self, AnalyzerError> {
        if !usd_rate.is_finite() || usd_rate <= 0.0 {
            return Err(AnalyzerError::InvalidRate(usd_rate));
        }
        Ok(Self { usd_rate })
    }

    /// Full report for one culture: per-direction stats plus the buy/sell
    /// comparison when both sides have data.
    pub fn report(
        &self,
        culture: &str,
        records: &[Record],
        year_filter: Option<i32>,
        today: NaiveDate,
    ) -> MarketReport {
        let analysis = self.analyze(records, year_filter, today);
        let comparison = match (&analysis.buy, &analysis.sell) {
            (Some(buy), Some(sell)) => Some(compare(buy, sell)),
            _ => None,
        };

        MarketReport {
            culture: culture.to_string(),
            year_filter,
            generated_on: today,
            records_fetched: records.len(),
            buy: analysis.buy,
            sell: analysis.sell,
            comparison,
        }
    }

    fn parse_record(&self, record: &Record, year_filter: Option<i32>) -> Option<ParsedRecord> {
        let date_part = record.raw_date.split_whitespace().next()?;
        let date = match NaiveDate::parse_from_str(date_part, DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                debug!("Dropping record with date '{}': {}", record.raw_date, e);
                return None;
            }
        };

        if year_filter.is_some_and(|year| date.year() != year) {
            return None;
        }

        match normalize_price(&PriceInput::from(record.price_usd_per_ton), self.usd_rate) {
            Ok(price) => Some(ParsedRecord { date, price }),
            Err(e) => {
                debug!("Dropping record dated {}: {}", date_part, e);
                None
            }
        }
    }

    fn analyze_direction(
        &self,
        records: &[Record],
        direction: Direction,
        year_filter: Option<i32>,
        today: NaiveDate,
    ) -> Option<Stats> {
        let mut valid: Vec<ParsedRecord> = records
            .iter()
            .filter(|r| Direction::from_label(&r.direction) == Some(direction))
            .filter_map(|r| self.parse_record(r, year_filter))
            .collect();

        info!("{} records survived for direction '{}'", valid.len(), direction.as_str());
        if valid.is_empty() {
            return None;
        }

        // Stable sort: ties keep encounter order.
        valid.sort_by_key(|r| r.date);

        Some(compute_stats(&valid, today))
    }
}

impl Analyzer for MarketAnalyzer {
    fn analyze(&self, records: &[Record], year_filter: Option<i32>, today: NaiveDate) -> MarketAnalysis {
        MarketAnalysis {
            buy: self.analyze_direction(records, Direction::Buy, year_filter, today),
            sell: self.analyze_direction(records, Direction::Sell, year_filter, today),
        }
    }
}

/// `valid` must be non-empty and sorted by date ascending.
fn compute_stats(valid: &[ParsedRecord], today: NaiveDate) -> Stats {
    let last_3 = today - Duration::days(3);
    let last_7 = today - Duration::days(7);

    let priced: Vec<ParsedRecord> = valid.iter().copied().filter(|r| r.price > 0).collect();
    let prices: Vec<u32> = priced.iter().map(|r| r.price).collect();
    let prices_since = |since: NaiveDate| -> Vec<u32> {
        priced.iter().filter(|r| r.date >= since).map(|r| r.price).collect()
    };
    let prices_today: Vec<u32> = priced.iter().filter(|r| r.date == today).map(|r| r.price).collect();

    let max_price = prices.iter().copied().max().unwrap_or(0);
    let min_price = prices.iter().copied().min().unwrap_or(0);

    let price_change_percent = match (prices.first(), prices.last()) {
        (Some(&first), Some(&last)) if prices.len() >= 2 => percent_change(first, last),
        _ => 0.0,
    };

    let mut per_day: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
    for r in priced.iter().filter(|r| r.date >= last_7) {
        per_day.entry(r.date).or_default().push(r.price);
    }
    let daily_avg = per_day
        .into_iter()
        .map(|(day, prices)| (day, mean_rounded(&prices)))
        .collect();

    Stats {
        count_today: valid.iter().filter(|r| r.date == today).count(),
        count_total: valid.len(),
        count_last_3: valid.iter().filter(|r| r.date >= last_3).count(),
        count_last_7: valid.iter().filter(|r| r.date >= last_7).count(),
        first_date: valid[0].date,
        last_date: valid[valid.len() - 1].date,
        avg_price: mean_rounded(&prices),
        median_price: median_rounded(&prices),
        std_dev: sample_std_dev_rounded(&prices),
        max_price,
        max_price_date: earliest_at(&priced, max_price),
        min_price,
        min_price_date: earliest_at(&priced, min_price),
        avg_price_today: mean_rounded(&prices_today),
        avg_price_last_3: mean_rounded(&prices_since(last_3)),
        avg_price_last_7: mean_rounded(&prices_since(last_7)),
        price_change_percent,
        trend: Trend::from_change(price_change_percent),
        daily_avg,
    }
}

/// Earliest date at which `price` was quoted.
fn earliest_at(sorted: &[ParsedRecord], price: u32) -> Option<NaiveDate> {
    sorted.iter().find(|r| r.price == price).map(|r| r.date)
}
