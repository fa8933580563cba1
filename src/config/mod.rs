//! Configuration module for xhs-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the platform defaults.
//!
//! # Example
//!
//! ```no_run
//! use xhs_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("xhs.toml")).unwrap();
//! println!("Pages per pager: {}", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, PlatformConfig, SignerConfig, ThrottleConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
