use crate::model::ScraperError;
use crate::scraper::traits::PageSource;

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Query parameter the listing site paginates on.
const PAGE_PARAM: &str = "Ad_page";

/// Appends the page number to a listing locator, continuing an existing
/// query string if there is one.
pub fn build_page_url(locator: &str, page: u32) -> String {
    let separator = if locator.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", locator, separator, PAGE_PARAM, page)
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) GraintradeMonitor/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::InvalidResponse(status.as_u16()));
        }

        response.text().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ScraperError {
    if e.is_timeout() {
        ScraperError::Timeout
    } else {
        ScraperError::HttpError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_query_string_when_absent() {
        assert_eq!(
            build_page_url("https://graintrade.com.ua/birzha/soya-f4", 2),
            "https://graintrade.com.ua/birzha/soya-f4?Ad_page=2"
        );
    }

    #[test]
    fn extends_existing_query_string() {
        assert_eq!(
            build_page_url("https://graintrade.com.ua/birzha?Ad[culture]=88&Ad[type]=7", 3),
            "https://graintrade.com.ua/birzha?Ad[culture]=88&Ad[type]=7&Ad_page=3"
        );
    }

    #[test]
    fn builds_client() {
        assert!(HttpFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
