use crate::model::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct CultureConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub usd_rate: f64,
    pub max_pages: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default)]
    pub year_filter: Option<i32>,
    pub cultures: Vec<CultureConfig>,
}

fn default_request_timeout() -> u64 {
    15
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_check_interval() -> u64 {
    3600
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.usd_rate.is_finite() || self.usd_rate <= 0.0 {
            return Err(invalid("usd_rate", format!("must be positive, got {}", self.usd_rate)));
        }
        if self.max_pages == 0 {
            return Err(invalid("max_pages", "must be at least 1".into()));
        }
        if self.request_timeout_seconds == 0 {
            return Err(invalid("request_timeout_seconds", "must be at least 1".into()));
        }
        if self.check_interval_seconds == 0 {
            return Err(invalid("check_interval_seconds", "must be at least 1".into()));
        }
        if self.cultures.is_empty() {
            return Err(invalid("cultures", "at least one culture is required".into()));
        }

        let mut seen = HashSet::new();
        for culture in &self.cultures {
            if culture.url.trim().is_empty() {
                return Err(invalid("cultures", format!("culture '{}' has no url", culture.name)));
            }
            if !seen.insert(culture.name.to_lowercase()) {
                return Err(invalid("cultures", format!("duplicate culture '{}'", culture.name)));
            }
        }
        Ok(())
    }

    /// Case-insensitive lookup by culture name.
    pub fn culture(&self, name: &str) -> Option<&CultureConfig> {
        let wanted = name.trim().to_lowercase();
        self.cultures.iter().find(|c| c.name.to_lowercase() == wanted)
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "usd_rate": 41.5,
        "max_pages": 3,
        "cultures": [
            { "name": "Соя", "url": "https://graintrade.com.ua/birzha/soya-f4" },
            { "name": "Ячмінь", "url": "https://graintrade.com.ua/birzha?Ad[culture]=10" }
        ]
    }"#;

    #[test]
    fn applies_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.request_timeout_seconds, 15);
        assert_eq!(config.cache_ttl_seconds, 600);
        assert_eq!(config.check_interval_seconds, 3600);
        assert_eq!(config.year_filter, None);
    }

    #[test]
    fn finds_culture_ignoring_case() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.culture("соя").map(|c| c.name.as_str()), Some("Соя"));
        assert!(config.culture("Пшениця").is_none());
    }

    #[test]
    fn rejects_zero_pages() {
        let content = MINIMAL.replace("\"max_pages\": 3", "\"max_pages\": 0");
        let err = parse_config(&content).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_pages", .. }));
    }

    #[test]
    fn rejects_non_positive_rate() {
        let content = MINIMAL.replace("41.5", "-1.0");
        let err = parse_config(&content).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "usd_rate", .. }));
    }

    #[test]
    fn rejects_duplicate_cultures() {
        let content = MINIMAL.replace("Ячмінь", "соя");
        let err = parse_config(&content).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cultures", .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_config("{"), Err(ConfigError::Json(_))));
    }
}
