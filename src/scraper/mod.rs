pub mod extractor;
pub mod fetcher;
pub mod traits;

pub use extractor::RecordExtractor;
pub use fetcher::HttpFetcher;
pub use traits::PageSource;
