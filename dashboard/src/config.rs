//! Dashboard configuration.

/// HTTP listener and log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Address to bind.
    pub listen_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// Emit logs as JSON lines instead of plain text.
    pub log_json: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 8080,
            log_json: false,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(addr) = var("RATEWATCH_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(port) = var("RATEWATCH_PORT").and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Some(flag) = var("RATEWATCH_LOG_JSON") {
            config.log_json = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("Listen address cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.log_json);
    }

    #[test]
    fn test_from_lookup() {
        let config = DashboardConfig::from_lookup(|name| match name {
            "RATEWATCH_LISTEN_ADDR" => Some("127.0.0.1".to_string()),
            "RATEWATCH_PORT" => Some(" 9090 ".to_string()),
            "RATEWATCH_LOG_JSON" => Some("true".to_string()),
            _ => None,
        });

        assert_eq!(config.listen_addr, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert!(config.log_json);
    }

    #[test]
    fn test_bad_port_keeps_default() {
        let config = DashboardConfig::from_lookup(|name| {
            (name == "RATEWATCH_PORT").then(|| "http".to_string())
        });
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_zero_port_rejected() {
        let config = DashboardConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
