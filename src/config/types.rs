use serde::Deserialize;

/// Main configuration structure for xhs-harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote platform endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the signed JSON API
    #[serde(rename = "api-base-url", default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL used when building shareable note links
    #[serde(rename = "web-base-url", default = "default_web_base_url")]
    pub web_base_url: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// External request-signing interpreter
#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    /// Interpreter executable
    #[serde(default = "default_signer_command")]
    pub command: String,

    /// Arguments passed before the request is written to stdin
    #[serde(default = "default_signer_args")]
    pub args: Vec<String>,

    /// Upper bound for one signing call (seconds)
    #[serde(rename = "timeout-secs", default = "default_signer_timeout_secs")]
    pub timeout_secs: u64,
}

/// Pacing between outbound calls
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// Minimum time between two calls of the same job (milliseconds)
    #[serde(rename = "page-interval-ms", default = "default_page_interval_ms")]
    pub page_interval_ms: u64,

    /// Minimum time before each reply-thread page (milliseconds)
    #[serde(rename = "reply-interval-ms", default = "default_reply_interval_ms")]
    pub reply_interval_ms: u64,

    /// Fixed pause between two batch jobs (milliseconds)
    #[serde(rename = "batch-interval-ms", default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
}

/// Crawl limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum pages a single pager may fetch
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Replies requested per sub-comment page
    #[serde(rename = "sub-comment-page-size", default = "default_sub_comment_page_size")]
    pub sub_comment_page_size: u32,

    /// Notes requested per search page
    #[serde(rename = "search-page-size", default = "default_search_page_size")]
    pub search_page_size: u32,

    /// Wall-clock limit for one job (seconds, 0 disables it)
    #[serde(rename = "job-timeout-secs", default)]
    pub job_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory CSV exports are written to
    #[serde(rename = "export-dir", default = "default_export_dir")]
    pub export_dir: String,
}

fn default_api_base_url() -> String {
    "https://edith.xiaohongshu.com".to_string()
}

fn default_web_base_url() -> String {
    "https://www.xiaohongshu.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_signer_command() -> String {
    "node".to_string()
}

fn default_signer_args() -> Vec<String> {
    vec!["static/sign.js".to_string()]
}

fn default_signer_timeout_secs() -> u64 {
    10
}

fn default_page_interval_ms() -> u64 {
    1000
}

fn default_reply_interval_ms() -> u64 {
    2000
}

fn default_batch_interval_ms() -> u64 {
    2000
}

fn default_max_pages() -> u32 {
    200
}

fn default_sub_comment_page_size() -> u32 {
    30
}

fn default_search_page_size() -> u32 {
    20
}

fn default_export_dir() -> String {
    "exports".to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            web_base_url: default_web_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            command: default_signer_command(),
            args: default_signer_args(),
            timeout_secs: default_signer_timeout_secs(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            page_interval_ms: default_page_interval_ms(),
            reply_interval_ms: default_reply_interval_ms(),
            batch_interval_ms: default_batch_interval_ms(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            sub_comment_page_size: default_sub_comment_page_size(),
            search_page_size: default_search_page_size(),
            job_timeout_secs: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
        }
    }
}
