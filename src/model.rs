// Core structs: Record, Stats, MarketAnalysis, MarketReport
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Date format used by the listing table and by every date the analyzer reports.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// One normalized listing row as extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub raw_date: String,
    pub direction: String,
    pub price_usd_per_ton: u32,
}

/// Transaction side of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Buy, Direction::Sell];

    /// Maps a lower-cased, trimmed label to a side. The live site labels rows
    /// "куплю" / "продам".
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "buy" | "куплю" => Some(Direction::Buy),
            "sell" | "продам" => Some(Direction::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Unchanged,
}

impl Trend {
    pub fn from_change(percent: f64) -> Self {
        if percent > 0.0 {
            Trend::Rising
        } else if percent < 0.0 {
            Trend::Falling
        } else {
            Trend::Unchanged
        }
    }
}

/// Statistics for one direction of one commodity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub count_today: usize,
    pub count_total: usize,
    pub count_last_3: usize,
    pub count_last_7: usize,
    #[serde(with = "date_format")]
    pub first_date: NaiveDate,
    #[serde(with = "date_format")]
    pub last_date: NaiveDate,
    pub avg_price: u32,
    pub median_price: u32,
    pub std_dev: u32,
    pub max_price: u32,
    #[serde(with = "date_format::option")]
    pub max_price_date: Option<NaiveDate>,
    pub min_price: u32,
    #[serde(with = "date_format::option")]
    pub min_price_date: Option<NaiveDate>,
    pub avg_price_today: u32,
    pub avg_price_last_3: u32,
    pub avg_price_last_7: u32,
    pub price_change_percent: f64,
    pub trend: Trend,
    #[serde(serialize_with = "date_format::serialize_map")]
    pub daily_avg: BTreeMap<NaiveDate, u32>,
}

/// Per-direction result of one analysis pass. `None` means the partition had
/// no valid records, which is distinct from a zero-valued `Stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub buy: Option<Stats>,
    pub sell: Option<Stats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketBias {
    /// Buyers bid above what sellers ask on average.
    SellersMarket,
    /// Sellers ask above what buyers bid on average.
    BuyersMarket,
    Balanced,
}

/// Buy-versus-sell comparison, only available when both sides have data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    pub avg_price_diff: i64,
    pub diff_percent: f64,
    pub count_diff: i64,
    pub count_diff_percent: f64,
    pub bias: MarketBias,
}

/// Everything one fetch-and-analyze run produces for a culture.
#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub culture: String,
    pub year_filter: Option<i32>,
    #[serde(with = "date_format")]
    pub generated_on: NaiveDate,
    pub records_fetched: usize,
    pub buy: Option<Stats>,
    pub sell: Option<Stats>,
    pub comparison: Option<MarketComparison>,
}

impl MarketReport {
    pub fn stats(&self, direction: Direction) -> Option<&Stats> {
        match direction {
            Direction::Buy => self.buy.as_ref(),
            Direction::Sell => self.sell.as_ref(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.buy.is_some() || self.sell.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response status {0}")]
    InvalidResponse(u16),
    #[error("client setup failed: {0}")]
    ClientBuild(String),
    #[error("page budget must be at least 1")]
    ZeroPageBudget,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTML parse error: {0}")]
    HtmlParseError(String),
    #[error("missing field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("no digits in price text")]
    Empty,
    #[error("unparsable price: {0}")]
    Unparsable(String),
    #[error("price is not positive")]
    NotPositive,
    #[error("exchange rate must be finite and positive, got {0}")]
    InvalidRate(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("exchange rate must be finite and positive, got {0}")]
    InvalidRate(f64),
}

mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Serializer, ser::SerializeMap};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn serialize_map<S: Serializer>(
        map: &BTreeMap<NaiveDate, u32>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = s.serialize_map(Some(map.len()))?;
        for (date, price) in map {
            out.serialize_entry(&date.format(DATE_FORMAT).to_string(), price)?;
        }
        out.end()
    }

    pub mod option {
        use super::DATE_FORMAT;
        use chrono::NaiveDate;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => s.collect_str(&d.format(DATE_FORMAT)),
                None => s.serialize_none(),
            }
        }
    }
}
