//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/feedcat/feedcat.toml`
//! 3. Local config: `./feedcat.toml`, or the file given with `--config`
//! 4. Environment variables: `FEEDCAT_*` prefix

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::services::UnknownCategoryPolicy;
use crate::application::ApplicationError;
use crate::domain::{FieldMapping, OfferField, ShallowPolicy};

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "feedcat.toml";

/// How offers with problematic categories are handled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Categories with fewer than three levels
    pub shallow_categories: ShallowPolicy,
    /// Category ids missing from the category tree
    pub unknown_category: UnknownCategoryPolicy,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawClassificationConfig {
    pub shallow_categories: Option<ShallowPolicy>,
    pub unknown_category: Option<UnknownCategoryPolicy>,
}

impl ClassificationConfig {
    pub fn merge(&self, overlay: &RawClassificationConfig) -> Self {
        Self {
            shallow_categories: overlay.shallow_categories.unwrap_or(self.shallow_categories),
            unknown_category: overlay.unknown_category.unwrap_or(self.unknown_category),
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub target_filename: Option<String>,
    pub output: Option<PathBuf>,
    pub marketplace_id: Option<i64>,
    pub progress_every: Option<u64>,
    pub classification: RawClassificationConfig,
    pub mapping: Option<BTreeMap<String, OfferField>>,
    /// Tags removed from the inherited mapping
    pub unmap: Option<Vec<String>>,
}

/// Unified configuration for feedcat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding feed documents (default: ./data)
    pub data_dir: PathBuf,
    /// Feed file inside `data_dir` used when no feed is given on the command line
    pub target_filename: Option<String>,
    /// JSON-lines output file (default: stdout)
    pub output: Option<PathBuf>,
    /// Marketplace the feed belongs to
    pub marketplace_id: Option<i64>,
    /// Log progress every N offers (0 disables)
    pub progress_every: u64,
    pub classification: ClassificationConfig,
    /// Feed tag → record field
    pub mapping: FieldMapping,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            target_filename: None,
            output: None,
            marketplace_id: None,
            progress_every: 10_000,
            classification: ClassificationConfig::default(),
            mapping: FieldMapping::default(),
        }
    }
}

/// Get the XDG config directory for feedcat.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "feedcat").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("feedcat.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand shell variables and tilde, leaving the path untouched on failure.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Feed document configured through `data_dir` and `target_filename`.
    pub fn feed_path(&self) -> Option<PathBuf> {
        self.target_filename
            .as_ref()
            .map(|name| self.data_dir.join(name))
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
        self.output = self.output.as_deref().map(expand_path);
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Mapping: overlay entries are added or replace inherited ones,
    ///   then `unmap` tags are removed
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut mapping = self.mapping.clone();
        if let Some(entries) = &overlay.mapping {
            for (tag, field) in entries {
                mapping.insert(tag.clone(), *field);
            }
        }
        Self::apply_unmap(&mut mapping, overlay);

        Self {
            mapping,
            ..self.merge_scalars(overlay)
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge_with()`, a mapping given here REPLACES the compiled
    /// default table entirely.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let mut mapping = global
            .mapping
            .as_ref()
            .map(|entries| {
                entries
                    .iter()
                    .map(|(tag, field)| (tag.clone(), *field))
                    .collect::<FieldMapping>()
            })
            .unwrap_or_else(|| self.mapping.clone());
        Self::apply_unmap(&mut mapping, global);

        Self {
            mapping,
            ..self.merge_scalars(global)
        }
    }

    fn merge_scalars(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            target_filename: overlay
                .target_filename
                .clone()
                .or_else(|| self.target_filename.clone()),
            output: overlay.output.clone().or_else(|| self.output.clone()),
            marketplace_id: overlay.marketplace_id.or(self.marketplace_id),
            progress_every: overlay.progress_every.unwrap_or(self.progress_every),
            classification: self.classification.merge(&overlay.classification),
            mapping: self.mapping.clone(),
        }
    }

    fn apply_unmap(mapping: &mut FieldMapping, overlay: &RawSettings) {
        for tag in overlay.unmap.iter().flatten() {
            mapping.remove(tag);
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit local config; must exist when given.
    ///   Without it `./feedcat.toml` is used if present.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/feedcat/feedcat.toml` (mapping REPLACES defaults)
    /// 3. Local config (mapping entries added on top of global)
    /// 4. Environment variables: `FEEDCAT_*` prefix (explicit override)
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let local = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                Some(path.to_path_buf())
            }
            None => std::env::current_dir()
                .ok()
                .map(|dir| local_config_path(&dir))
                .filter(|path| path.exists()),
        };
        Self::load_layers(global_config_path().as_deref(), local.as_deref())
    }

    /// Load settings from explicit global and local files.
    ///
    /// Missing files are skipped. Environment overrides are applied last.
    pub fn load_layers(
        global: Option<&Path>,
        local: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config (defines the baseline)
        if let Some(global_path) = global.filter(|p| p.exists()) {
            debug!("loading global config {}", global_path.display());
            let raw = load_raw_settings(global_path)?;
            current = current.apply_global(&raw);
        }

        // 3. Local config (adds feed-specific settings)
        if let Some(local_path) = local.filter(|p| p.exists()) {
            debug!("loading local config {}", local_path.display());
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (replace - explicit override)
        current = Self::apply_env_overrides(current)?;

        // Expand ~ and $VAR in path-like fields
        current.expand_paths();

        Ok(current)
    }

    /// Apply FEEDCAT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("FEEDCAT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("target_filename") {
            settings.target_filename = Some(val);
        }
        if let Ok(val) = config.get_string("output") {
            settings.output = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("marketplace_id") {
            settings.marketplace_id = Some(parse_env("FEEDCAT_MARKETPLACE_ID", &val)?);
        }
        if let Ok(val) = config.get_string("progress_every") {
            settings.progress_every = parse_env("FEEDCAT_PROGRESS_EVERY", &val)?;
        }
        if let Ok(val) = config.get_string("classification.shallow_categories") {
            settings.classification.shallow_categories = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_string("classification.unknown_category") {
            settings.classification.unknown_category = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# feedcat configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/feedcat/feedcat.toml  (defines your baseline)
#   Local:  ./feedcat.toml or --config FILE  (feed-specific additions)
#   Env:    FEEDCAT_* environment variables  (explicit overrides,
#           nested keys with "__", e.g. FEEDCAT_CLASSIFICATION__UNKNOWN_CATEGORY)
#
# Mapping Merge Semantics:
#   A global [mapping] REPLACES the compiled default table.
#   A local [mapping] adds or overrides single tags.
#   unmap = ["tag"] removes an inherited tag.

# Directory holding feed documents
# data_dir = "data"

# Feed file inside data_dir used when no FEED argument is given
# target_filename = "feed.xml"

# JSON-lines output (stdout when unset)
# output = "offers.jsonl"

# marketplace_id = 1

# Log progress every N offers (0 disables)
# progress_every = 10000

# unmap = ["barcode"]

[classification]
# Categories with fewer than three levels: "empty" | "reject"
# shallow_categories = "empty"

# Category ids missing from the tree: "skip" | "null" | "abort"
# unknown_category = "skip"

# [mapping]
# name = "title"
# description = "description"
# vendor = "brand"
# picture = "first_image_url"
# categoryId = "category_id"
# oldprice = "price_before_discounts"
# price = "price_after_discounts"
# currencyId = "currency"
# barcode = "barcode"
"#
        .to_string()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ApplicationError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ApplicationError::Config {
        message: format!("{name}={value}: {e}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_layers_then_uses_defaults() {
        let settings = Settings::load_layers(None, None).expect("load defaults");
        assert_eq!(settings.progress_every, 10_000);
        assert_eq!(settings.mapping, FieldMapping::default());
        assert_eq!(settings.classification, ClassificationConfig::default());
    }

    #[test]
    fn given_target_filename_when_feed_path_then_joins_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/srv/feeds"),
            target_filename: Some("wb.xml".into()),
            ..Settings::default()
        };
        assert_eq!(settings.feed_path(), Some(PathBuf::from("/srv/feeds/wb.xml")));
        assert_eq!(Settings::default().feed_path(), None);
    }

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/feeds"),
            output: Some(PathBuf::from("$HOME/out.jsonl")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.data_dir.to_string_lossy().starts_with(&home));
        assert!(settings
            .output
            .as_ref()
            .is_some_and(|p| p.to_string_lossy().starts_with(&home)));
    }

    #[test]
    fn given_global_mapping_when_apply_global_then_replaces_defaults() {
        let global = RawSettings {
            mapping: Some(BTreeMap::from([("title".to_string(), OfferField::Title)])),
            ..RawSettings::default()
        };

        let result = Settings::default().apply_global(&global);

        assert_eq!(result.mapping.len(), 1);
        assert_eq!(result.mapping.get("title"), Some(OfferField::Title));
        assert_eq!(result.mapping.get("name"), None);
    }

    #[test]
    fn given_local_mapping_when_merge_with_then_adds_overrides_and_unmaps() {
        let local = RawSettings {
            mapping: Some(BTreeMap::from([
                ("shop-sku".to_string(), OfferField::Barcode),
                ("vendor".to_string(), OfferField::SellerName),
            ])),
            unmap: Some(vec!["barcode".to_string()]),
            marketplace_id: Some(7),
            ..RawSettings::default()
        };

        let result = Settings::default().merge_with(&local);

        assert_eq!(result.mapping.get("shop-sku"), Some(OfferField::Barcode));
        assert_eq!(result.mapping.get("vendor"), Some(OfferField::SellerName));
        assert_eq!(result.mapping.get("barcode"), None);
        assert_eq!(result.mapping.get("name"), Some(OfferField::Title));
        assert_eq!(result.marketplace_id, Some(7));
        assert_eq!(result.progress_every, 10_000);
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.mapping.unwrap_or_default().is_empty());
    }

    #[test]
    fn given_settings_when_to_toml_then_reparses() {
        let settings = Settings {
            marketplace_id: Some(2),
            ..Settings::default()
        };
        let text = settings.to_toml().unwrap();
        let raw: RawSettings = toml::from_str(&text).unwrap();
        assert_eq!(raw.marketplace_id, Some(2));
        assert_eq!(raw.mapping.map(|m| m.len()), Some(settings.mapping.len()));
    }
}
