//! Subcommand implementations and the state they share.

pub mod config_cmd;
pub mod ingest;
pub mod load;
pub mod schema;
pub mod watch;
pub mod write;

use std::path::PathBuf;

use ecargraph_config::{AppConfig, ConfigError};
use ecargraph_core::FilterSpec;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Global flags that adjust the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub alpha: Option<String>,
    pub zero: Option<String>,
    pub alpha_http: Option<String>,
}

impl Overrides {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
    }

    /// Load the config file, then layer environment and flags on top.
    ///
    /// Flags win over the environment, which wins over the file.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::load_with_env(&self.config_path())?;
        if let Some(alpha) = &self.alpha {
            config.alpha = alpha.clone();
        }
        if let Some(zero) = &self.zero {
            config.zero = zero.clone();
        }
        if let Some(endpoint) = &self.alpha_http {
            config.alpha_http = endpoint.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Everything a running command needs.
pub struct Context {
    pub config: AppConfig,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(overrides: &Overrides) -> Result<Self, ConfigError> {
        Ok(Self {
            config: overrides.load()?,
            cancel: CancellationToken::new(),
        })
    }
}

/// The filter for this run: `--only` beats `filter` from the config.
///
/// Compiled up front so a bad expression fails before any file is touched.
pub fn resolve_filter(
    only: Option<&str>,
    config: &AppConfig,
) -> ecargraph_core::Result<Option<FilterSpec>> {
    FilterSpec::parse_optional(only.or(config.filter.as_deref()))
}

/// Load the config and arm Ctrl-C for a command that does real work.
pub fn start(overrides: &Overrides) -> Result<Context, ConfigError> {
    let ctx = Context::new(overrides)?;
    cancel_on_ctrl_c(ctx.cancel.clone());
    Ok(ctx)
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            token.cancel();
        }
    });
}
