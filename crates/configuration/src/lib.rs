use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    ApiSettings, CacheSettings, CatalogSettings, Config, CorrelationSettings, Credentials,
    DedupMetric, DedupSettings, FailurePolicy, FetcherSettings, LoggingSettings,
    RetrieverSettings, TagScope,
};
pub use error::ConfigError;
pub use telemetry::init_tracing;

/// Environment variables with this prefix override file values,
/// e.g. `ALPHASCOPE__RETRIEVER__WORKERS=4`.
pub const ENV_PREFIX: &str = "ALPHASCOPE";

/// Loads the application configuration.
///
/// The TOML file at `path` is optional; every section has defaults. Values are
/// then overridden by `ALPHASCOPE__*` environment variables and the result is
/// validated before being returned.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(
            config::File::from(path.as_ref())
                .format(config::FileFormat::Toml)
                .required(false),
        )
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
