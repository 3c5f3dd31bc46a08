use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "gymbook.toml",
    "config/gymbook.toml",
    "crates/config/gymbook.toml",
    "../gymbook.toml",
    "../config/gymbook.toml",
    "../crates/config/gymbook.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub policy: PolicyConfig,
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://gymbook.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Business-rule knobs for bookings and billing.
///
/// ```
/// use gymbook_config::PolicyConfig;
///
/// let policy = PolicyConfig::default();
/// assert_eq!(policy.cancellation_window_hours, 2);
/// assert_eq!(policy.no_show_penalty_threshold, 5);
/// assert_eq!(policy.loyalty_min_months, 6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Cancelling at least this many hours before class start is penalty-free.
    #[serde(default = "PolicyConfig::default_cancellation_window")]
    pub cancellation_window_hours: i64,
    /// Penalty applies when the monthly no-show count is strictly above this.
    #[serde(default = "PolicyConfig::default_penalty_threshold")]
    pub no_show_penalty_threshold: u32,
    #[serde(default = "PolicyConfig::default_penalty_percent")]
    pub no_show_penalty_percent: u32,
    #[serde(default = "PolicyConfig::default_loyalty_months")]
    pub loyalty_min_months: i32,
    #[serde(default = "PolicyConfig::default_loyalty_percent")]
    pub loyalty_discount_percent: u32,
}

impl PolicyConfig {
    const fn default_cancellation_window() -> i64 {
        2
    }

    const fn default_penalty_threshold() -> u32 {
        5
    }

    const fn default_penalty_percent() -> u32 {
        15
    }

    const fn default_loyalty_months() -> i32 {
        6
    }

    const fn default_loyalty_percent() -> u32 {
        10
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cancellation_window_hours: Self::default_cancellation_window(),
            no_show_penalty_threshold: Self::default_penalty_threshold(),
            no_show_penalty_percent: Self::default_penalty_percent(),
            loyalty_min_months: Self::default_loyalty_months(),
            loyalty_discount_percent: Self::default_loyalty_percent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "SweeperConfig::default_interval")]
    pub interval_seconds: u64,
}

impl SweeperConfig {
    const fn default_interval() -> u64 {
        300
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: Self::default_interval(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use gymbook_config::load;
///
/// std::env::remove_var("GYMBOOK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.database.url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "policy.cancellation_window_hours",
            defaults.policy.cancellation_window_hours,
        )?
        .set_default(
            "policy.no_show_penalty_threshold",
            i64::from(defaults.policy.no_show_penalty_threshold),
        )?
        .set_default(
            "policy.no_show_penalty_percent",
            i64::from(defaults.policy.no_show_penalty_percent),
        )?
        .set_default(
            "policy.loyalty_min_months",
            i64::from(defaults.policy.loyalty_min_months),
        )?
        .set_default(
            "policy.loyalty_discount_percent",
            i64::from(defaults.policy.loyalty_discount_percent),
        )?
        .set_default(
            "sweeper.interval_seconds",
            i64::try_from(defaults.sweeper.interval_seconds).unwrap_or(i64::MAX),
        )?;

    let environment_overrides = config::Environment::with_prefix("GYMBOOK").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("GYMBOOK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via GYMBOOK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.policy.cancellation_window_hours < 0 {
        anyhow::bail!(
            "policy.cancellation_window_hours must not be negative (got {})",
            config.policy.cancellation_window_hours
        );
    }

    if config.sweeper.interval_seconds == 0 {
        anyhow::bail!("sweeper.interval_seconds must be greater than zero");
    }

    debug!(?config, "loaded gymbook configuration");
    Ok(config)
}
