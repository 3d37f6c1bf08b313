use crate::analyzer::MarketAnalyzer;
use crate::cache::ListingCache;
use crate::config::{AppConfig, CultureConfig};
use crate::model::{ConfigError, Direction, MarketReport};
use crate::scraper::{PageSource, RecordExtractor};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Fetch-and-analyze pipeline shared by every CLI command.
pub struct Monitor<S: PageSource> {
    extractor: RecordExtractor<S>,
    analyzer: MarketAnalyzer,
    cache: ListingCache,
}

impl<S: PageSource> Monitor<S> {
    pub fn new(source: S, config: &AppConfig) -> Result<Self, ConfigError> {
        let extractor = RecordExtractor::new(
            source,
            config.usd_rate,
            config.max_pages,
            Duration::from_secs(config.request_timeout_seconds),
        )
        .map_err(|e| ConfigError::Invalid {
            field: "max_pages",
            reason: e.to_string(),
        })?;
        let analyzer = MarketAnalyzer::new(config.usd_rate).map_err(|e| ConfigError::Invalid {
            field: "usd_rate",
            reason: e.to_string(),
        })?;

        Ok(Self {
            extractor,
            analyzer,
            cache: ListingCache::new(Duration::from_secs(config.cache_ttl_seconds)),
        })
    }

    pub async fn report(&self, culture: &CultureConfig, year_filter: Option<i32>) -> MarketReport {
        self.report_on(culture, year_filter, Local::now().date_naive()).await
    }

    pub async fn report_on(
        &self,
        culture: &CultureConfig,
        year_filter: Option<i32>,
        today: NaiveDate,
    ) -> MarketReport {
        info!("Processing culture: {}", culture.name);
        let records: Arc<_> = self
            .cache
            .get_or_fetch(&culture.url, || self.extractor.extract(&culture.url))
            .await;

        self.analyzer.report(&culture.name, &records, year_filter, today)
    }

    pub async fn purge_cache(&self) -> usize {
        self.cache.purge_expired().await
    }
}

/// One log line per direction.
pub fn log_summary(report: &MarketReport) {
    if !report.has_data() {
        info!("{}: no listings for the selected period", report.culture);
        return;
    }
    for direction in Direction::ALL {
        match report.stats(direction) {
            Some(s) => info!(
                "{} [{}]: {} listings, avg {} USD/t, median {} USD/t, {:+.2}% ({:?})",
                report.culture,
                direction.as_str(),
                s.count_total,
                s.avg_price,
                s.median_price,
                s.price_change_percent,
                s.trend
            ),
            None => info!("{} [{}]: no listings", report.culture, direction.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::model::ScraperError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        html: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl PageSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("Ad_page=1") {
                Ok(self.html.clone())
            } else {
                Err(ScraperError::InvalidResponse(404))
            }
        }
    }

    const CONFIG: &str = r#"{
        "usd_rate": 40.0,
        "max_pages": 2,
        "cultures": [{ "name": "Соя", "url": "https://graintrade.com.ua/birzha/soya-f4" }]
    }"#;

    fn page() -> String {
        let row = |date: &str, label: &str, price: &str| {
            format!(
                "<tr><td>{date}</td><td></td><td><span>{label}</span></td><td></td><td></td><td>{price}</td></tr>"
            )
        };
        format!(
            "<table><tbody>{}{}{}</tbody></table>",
            row("30.12.2024", "Куплю", "8000 грн"),
            row("02.01.2025", "Куплю", "220 $"),
            row("03.01.2025", "Продам", "240 $"),
        )
    }

    #[tokio::test]
    async fn filtered_and_unfiltered_reports_share_one_fetch() {
        let config = parse_config(CONFIG).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = StaticSource {
            html: page(),
            calls: calls.clone(),
        };
        let monitor = Monitor::new(source, &config).unwrap();
        let culture = &config.cultures[0];
        let today = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();

        let all = monitor.report_on(culture, None, today).await;
        let buy = all.buy.unwrap();
        assert_eq!(buy.count_total, 2);
        assert_eq!(buy.price_change_percent, 10.0);

        let only_2025 = monitor.report_on(culture, Some(2025), today).await;
        assert_eq!(only_2025.buy.unwrap().count_total, 1);
        assert!(only_2025.comparison.is_some());

        // Two pages for the first report, none for the second.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
