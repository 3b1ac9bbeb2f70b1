//! Materializer configuration using Figment
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `formstate.toml`, `formstate.yaml`, `formstate.yml`, `formstate.json` in the
//!    config directory
//! 3. `FORMSTATE_*` environment variables

use std::path::Path;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FORMSTATE_";

/// Base name of configuration files.
pub const CONFIG_FILE_STEM: &str = "formstate";

/// How freshly minted row ids are formatted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowIdFormat {
    /// 24 lowercase hex characters, the usual document-store object id shape.
    #[default]
    ObjectId,
    /// 26-character Crockford base32 ULID.
    Ulid,
}

/// Tuning knobs for a [`Materializer`](crate::Materializer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    pub row_id_format: RowIdFormat,
    /// Maximum sibling futures polled at once. Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_out_limit: Option<usize>,
}

impl MaterializerConfig {
    /// Load configuration from `dir` and the environment.
    pub fn load(dir: &Path) -> Result<Self> {
        let config: Self = Self::figment(dir).extract().map_err(Box::new)?;
        debug!(?config, dir = %dir.display(), "materializer config loaded");
        Ok(config)
    }

    /// The layered figment behind [`MaterializerConfig::load`]. Missing files
    /// contribute nothing.
    pub fn figment(dir: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join(format!("{CONFIG_FILE_STEM}.toml"))))
            .merge(Yaml::file(dir.join(format!("{CONFIG_FILE_STEM}.yaml"))))
            .merge(Yaml::file(dir.join(format!("{CONFIG_FILE_STEM}.yml"))))
            .merge(Json::file(dir.join(format!("{CONFIG_FILE_STEM}.json"))))
            .merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
    }
}
