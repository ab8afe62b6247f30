//! Google API client configuration.

use std::time::Duration;

/// Configuration shared by the Google Calendar and Firestore clients.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Base URL of the Calendar v3 API.
    ///
    /// Overridden in tests to point at a local mock server.
    pub calendar_api_base: String,

    /// Base URL of the Firestore v1 API.
    pub firestore_api_base: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// `maxResults` for list requests; the client follows page tokens.
    pub page_size: u32,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            calendar_api_base: Self::CALENDAR_API_BASE.to_string(),
            firestore_api_base: Self::FIRESTORE_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("bookingsync/{}", env!("CARGO_PKG_VERSION")),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default page size for list calls.
    pub const DEFAULT_PAGE_SIZE: u32 = 250;

    /// Production Calendar v3 endpoint.
    pub const CALENDAR_API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";

    /// Production Firestore v1 endpoint.
    pub const FIRESTORE_API_BASE: &'static str = "https://firestore.googleapis.com/v1";

    /// Creates a configuration pointing at the production endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Calendar API base URL.
    pub fn with_calendar_api_base(mut self, base: impl Into<String>) -> Self {
        self.calendar_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the Firestore API base URL.
    pub fn with_firestore_api_base(mut self, base: impl Into<String>) -> Self {
        self.firestore_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the list page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 || self.page_size > 2500 {
            return Err(format!("page_size must be within 1..=2500, got {}", self.page_size));
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        for base in [&self.calendar_api_base, &self.firestore_api_base] {
            url::Url::parse(base).map_err(|e| format!("invalid API base {base}: {e}"))?;
        }
        Ok(())
    }

    /// Builds the shared HTTP client.
    pub fn http_client(&self) -> Result<reqwest::Client, crate::ProviderError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| crate::ProviderError::configuration("failed to create HTTP client").with_source(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = GoogleConfig::new();
        assert_eq!(config.calendar_api_base, GoogleConfig::CALENDAR_API_BASE);
        assert_eq!(config.page_size, 250);
        assert!(config.user_agent.starts_with("bookingsync/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_urls_lose_trailing_slash() {
        let config = GoogleConfig::new().with_calendar_api_base("http://127.0.0.1:1234/");
        assert_eq!(config.calendar_api_base, "http://127.0.0.1:1234");
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(GoogleConfig::new().with_page_size(0).validate().is_err());
        assert!(GoogleConfig::new().with_timeout(Duration::ZERO).validate().is_err());
        assert!(GoogleConfig::new().with_firestore_api_base("not a url").validate().is_err());
    }
}
