//! Engine settings, layered by the `config` crate: compiled defaults, then an
//! optional file, then `MATRIXKEY__*` environment variables.
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `mode` | `strict` | result mode when the definition names none |
//! | `log_filter` | `matrixkey=info` | directive for [`init_tracing`] |
//! | `strict_payloads` | `true` | fail on item references to unknown filters or values instead of skipping them |

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::{KeyError, Result};
use crate::key::Mode;

pub const DEFAULT_LOG_FILTER: &str = "matrixkey=info";
pub const ENV_PREFIX: &str = "MATRIXKEY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
    pub log_filter: String,
    pub strict_payloads: bool,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Strict,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            strict_payloads: true,
        }
    }
}
impl Settings {
    /// Loads settings; a missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("mode", "strict")?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .set_default("strict_payloads", true)?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Ok(builder.build()?.try_deserialize()?)
    }
}

/// Installs a global fmt subscriber filtered by `settings.log_filter`.
/// Meant for host applications and tests; fails if one is already installed.
pub fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_new(&settings.log_filter).map_err(|e| KeyError::Config(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| KeyError::Config(e.to_string()))
}
