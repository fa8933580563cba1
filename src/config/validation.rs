use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, PlatformConfig, SignerConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_platform_config(&config.platform)?;
    validate_signer_config(&config.signer)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates platform endpoints
fn validate_platform_config(config: &PlatformConfig) -> Result<(), ConfigError> {
    validate_base_url("api-base-url", &config.api_base_url)?;
    validate_base_url("web-base-url", &config.web_base_url)?;

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "platform timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_base_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name,
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates the signer command
fn validate_signer_config(config: &SignerConfig) -> Result<(), ConfigError> {
    if config.command.trim().is_empty() {
        return Err(ConfigError::Validation(
            "signer command cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "signer timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    for (name, size) in [
        ("sub-comment-page-size", config.sub_comment_page_size),
        ("search-page-size", config.search_page_size),
    ] {
        if !(1..=100).contains(&size) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 100, got {}",
                name, size
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
