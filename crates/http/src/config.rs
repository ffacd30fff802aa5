const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Builder for [`HttpConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HttpConfigBuilder {
    base_url: Option<String>,
}

impl HttpConfigBuilder {
    /// Creates a builder with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        HttpConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

/// Configuration for the HTTP backend.
///
/// The base URL is an explicit value carried here, there is no
/// process-wide default.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpConfig {
    pub(crate) base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        let config = HttpConfigBuilder::new()
            .with_base_url("http://support.example:8000/")
            .build();
        assert_eq!(config.base_url, "http://support.example:8000");
    }
}
