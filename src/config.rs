//! Migration configuration helpers.
//!
//! The config is a small JSON file that pins where the store snapshot lives
//! and how permissive parent resolution should be. CLI flags override it.
use crate::migration::{MigrationOptions, ParentPolicy, DEFAULT_PARENT_POLICY};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "term-migration.json";

const STORE_DIR: &str = "term-migration";
const STORE_FILE: &str = "store.json";

fn default_invalidate_cache() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    #[serde(default)]
    pub parent_policy: ParentPolicy,
    #[serde(default = "default_invalidate_cache")]
    pub invalidate_cache: bool,
}

impl MigrationConfig {
    pub fn options(&self) -> MigrationOptions {
        MigrationOptions {
            parent_policy: self.parent_policy,
            invalidate_cache: self.invalidate_cache,
        }
    }

    /// Store snapshot path: the configured one, else the per-user data dir.
    pub fn resolve_store_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.store_path.as_deref().filter(|path| !path.trim().is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let data_dir = dirs::data_dir().ok_or_else(|| {
            anyhow!("unable to locate a data directory; pass --store or set store_path")
        })?;
        Ok(data_dir.join(STORE_DIR).join(STORE_FILE))
    }
}

/// Build the default config written by `tmig init`.
pub fn default_config() -> MigrationConfig {
    MigrationConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        store_path: None,
        parent_policy: DEFAULT_PARENT_POLICY,
        invalidate_cache: true,
    }
}

pub fn load_config(path: &Path) -> Result<MigrationConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: MigrationConfig =
        serde_json::from_slice(&bytes).context("parse migration config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `path` when it exists, otherwise fall back to defaults.
pub fn load_config_optional(path: &Path) -> Result<MigrationConfig> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(default_config());
    }
    load_config(path)
}

pub fn write_config(path: &Path, config: &MigrationConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize migration config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &MigrationConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported migration config schema_version {}",
            config.schema_version
        ));
    }
    if let Some(path) = config.store_path.as_deref() {
        if path.trim().is_empty() {
            return Err(anyhow!("store_path must be non-empty when set"));
        }
    }
    Ok(())
}
