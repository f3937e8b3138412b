use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid service URL '{}': {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Service URL must use http or https: {}",
                self.url
            )));
        }

        if self.email.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("Email must be set".to_string()));
        }
        if self.password.is_empty() {
            return Err(ConfigError::InvalidConfig("Password must be set".to_string()));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        self.retry_policy()
            .validate()
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        // Building the mappers checks every binding, regexes included
        self.log_batch_mapper()?;

        Ok(())
    }
}
