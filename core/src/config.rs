use crate::classify::SimilarityThresholds;
use crate::engine::{ComparisonOptions, Tolerance};
use crate::error::RecdiffError;
use crate::identity::IdentityResolver;
use crate::matching::{KeySpec, MatchMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "RECDIFF_CONFIG";
pub const MINOR_THRESHOLD_ENV: &str = "RECDIFF_MINOR_THRESHOLD";
pub const MODERATE_THRESHOLD_ENV: &str = "RECDIFF_MODERATE_THRESHOLD";
const LOCAL_CONFIG_FILE: &str = "recdiff.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub thresholds: SimilarityThresholds,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    Positional,
    Keyed,
    Multiset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ComparisonConfig {
    /// Matching mode; inferred from the key settings when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeSetting>,

    /// Explicit key columns for keyed matching
    #[serde(default)]
    pub key_columns: Vec<String>,

    /// Drop changes that only differ in formatting
    #[serde(default)]
    pub tolerant: bool,

    #[serde(default)]
    pub include_raw_diff: bool,

    /// Restrict field comparison to these columns (empty = all)
    #[serde(default)]
    pub columns: Vec<String>,

    /// Identity resolver fields for keyed matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Row entries printed per section before truncating
    #[serde(default = "default_max_print_rows")]
    pub max_print_rows: usize,
}

fn default_max_print_rows() -> usize {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            max_print_rows: default_max_print_rows(),
        }
    }
}

impl ComparisonConfig {
    fn key_spec(&self) -> Result<Option<KeySpec>> {
        match (self.key_columns.is_empty(), &self.identity) {
            (false, Some(_)) => Err(RecdiffError::configuration(
                "Key columns and identity fields are mutually exclusive; pick one",
            )
            .into()),
            (false, None) => Ok(Some(KeySpec::Columns(self.key_columns.clone()))),
            (true, Some(identity)) => {
                let mut resolver = IdentityResolver::new(identity.primary.clone());
                if let Some(secondary) = &identity.secondary {
                    resolver = resolver.with_secondary(secondary.clone());
                }
                Ok(Some(KeySpec::Identity(resolver)))
            }
            (true, None) => Ok(None),
        }
    }

    fn match_mode(&self) -> Result<MatchMode> {
        let key = self.key_spec()?;
        let mode = match self.mode {
            Some(ModeSetting::Positional) => MatchMode::from_selection(true, key),
            Some(ModeSetting::Keyed) => match key {
                Some(spec) => MatchMode::Keyed(spec),
                None => {
                    return Err(RecdiffError::configuration(
                        "Keyed mode needs key columns or an identity field",
                    )
                    .into())
                }
            },
            Some(ModeSetting::Multiset) => {
                if key.is_some() {
                    log::warn!("Multiset mode selected; configured key settings are ignored");
                }
                MatchMode::Multiset
            }
            None => MatchMode::from_selection(false, key),
        };
        Ok(mode)
    }
}

impl Config {
    /// Build validated runtime options from this configuration
    pub fn comparison_options(&self) -> Result<ComparisonOptions> {
        self.thresholds.validate()?;

        let comparison = &self.comparison;
        Ok(ComparisonOptions {
            mode: comparison.match_mode()?,
            tolerance: if comparison.tolerant {
                Tolerance::Tolerant
            } else {
                Tolerance::Strict
            },
            thresholds: self.thresholds,
            columns: (!comparison.columns.is_empty()).then(|| comparison.columns.clone()),
            include_raw_diff: comparison.include_raw_diff,
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(RecdiffError::from)?)
    }
}

/// Directory holding the user-wide configuration
pub fn global_config_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".recdiff")
    } else {
        PathBuf::from(".recdiff")
    }
}

pub fn global_config_path() -> PathBuf {
    global_config_dir().join("global.toml")
}

/// Read and parse one configuration file
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = toml::from_str::<Config>(&content)
        .map_err(RecdiffError::from)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

fn load_layer(path: &Path) -> Option<Config> {
    if !path.exists() {
        return None;
    }
    match load_config_file(path) {
        Ok(config) => {
            log::debug!("Loaded configuration from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Ignoring config file: {e:#}");
            None
        }
    }
}

/// Resolve the active configuration.
///
/// Priority order (highest to lowest):
/// 1. `explicit` path, then the file named by `RECDIFF_CONFIG`
/// 2. Local config file (`recdiff.toml` in the working directory)
/// 3. Global config file (`~/.recdiff/global.toml`)
/// 4. Defaults
///
/// Threshold environment variables are applied on top.
pub fn get_config(explicit: Option<&Path>) -> Result<Config> {
    let env_path = env::var(CONFIG_ENV).ok().map(PathBuf::from);

    let mut config = if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
        // A named file must load
        load_config_file(&path)?
    } else {
        let local = env::current_dir()
            .ok()
            .and_then(|dir| load_layer(&dir.join(LOCAL_CONFIG_FILE)));
        local
            .or_else(|| load_layer(&global_config_path()))
            .unwrap_or_default()
    };

    apply_env_overrides(&mut config, |name| env::var(name).ok())?;
    Ok(config)
}

/// Apply threshold overrides; `lookup` reads a variable by name
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(MINOR_THRESHOLD_ENV) {
        config.thresholds.minor = value
            .trim()
            .parse()
            .with_context(|| format!("{MINOR_THRESHOLD_ENV} is not a number: '{value}'"))?;
    }
    if let Some(value) = lookup(MODERATE_THRESHOLD_ENV) {
        config.thresholds.moderate = value
            .trim()
            .parse()
            .with_context(|| format!("{MODERATE_THRESHOLD_ENV} is not a number: '{value}'"))?;
    }
    Ok(())
}

/// Write `config` to `path`, creating parent directories
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_toml()?)?;
    Ok(())
}

/// Write `config` as the global configuration
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = global_config_path();
    save_config_to(config, &path)?;
    Ok(path)
}
