use crate::model::ScraperError;

/// Anything that can hand back the markup behind a page URL.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}
