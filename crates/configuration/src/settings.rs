use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub fetcher: FetcherSettings,
    pub retriever: RetrieverSettings,
    pub catalog: CatalogSettings,
    pub cache: CacheSettings,
    pub correlation: CorrelationSettings,
    pub dedup: DedupSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects values that would make a component loop forever or do nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retriever.workers == 0 {
            return Err(ConfigError::ValidationError(
                "retriever.workers must be at least 1".to_string(),
            ));
        }
        if self.catalog.page_size == 0 || self.catalog.incremental_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "catalog page sizes must be at least 1".to_string(),
            ));
        }
        if self.correlation.window_years == 0 {
            return Err(ConfigError::ValidationError(
                "correlation.window_years must be positive".to_string(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the remote platform lives and how long a single request may take.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldquantbrain.com".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Retry behaviour of the resilient fetcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    /// Total number of attempts for one logical request.
    pub max_retries: u32,
    /// Upper bound on consecutive `Retry-After` waits inside one attempt.
    pub max_rate_limit_polls: u32,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            max_retries: 10,
            max_rate_limit_polls: 120,
        }
    }
}

/// What the bulk retriever does when a single alpha cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FailurePolicy {
    /// Log the failure and merge everything else.
    #[default]
    Skip,
    /// Fail the whole batch on the first error.
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    /// Width of the concurrent fetch pool.
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            failure_policy: FailurePolicy::Skip,
        }
    }
}

/// Paging parameters for the alpha listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub stage: String,
    /// Page size for a full download.
    pub page_size: usize,
    /// Page size for an incremental poll (only the newest page is read).
    pub incremental_page_size: usize,
    pub order: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            stage: "OS".to_string(),
            page_size: 100,
            incremental_page_size: 30,
            order: "-dateSubmitted".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding the cached blobs and the correlation report.
    pub data_dir: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Which slice of the cached universe a comparison is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TagScope {
    /// Every cached alpha.
    #[default]
    All,
    /// Only alphas carrying the partition tag.
    Tagged,
    /// Only alphas without the partition tag.
    Untagged,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    /// Trailing window of returns, in calendar years.
    pub window_years: u32,
    /// File name (inside `cache.data_dir`) of the correlation report.
    pub report_file: String,
    /// Classification name that marks an alpha as a partition member.
    pub partition_tag: String,
    pub default_scope: TagScope,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            window_years: 4,
            report_file: "os_alpha_corr.csv".to_string(),
            partition_tag: "Power Pool Alpha".to_string(),
            default_scope: TagScope::All,
        }
    }
}

/// The metric used to pick the survivor among candidates sharing a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DedupMetric {
    #[default]
    Sharpe,
    Fitness,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub metric: DedupMetric,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Platform credentials. Read from the environment only.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub const USERNAME_VAR: &'static str = "BRAIN_USERNAME";
    pub const PASSWORD_VAR: &'static str = "BRAIN_PASSWORD";

    /// Reads `BRAIN_USERNAME` / `BRAIN_PASSWORD`, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let username = std::env::var(Self::USERNAME_VAR)
            .map_err(|_| ConfigError::MissingCredential(Self::USERNAME_VAR))?;
        let password = std::env::var(Self::PASSWORD_VAR)
            .map_err(|_| ConfigError::MissingCredential(Self::PASSWORD_VAR))?;
        Ok(Self { username, password })
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
