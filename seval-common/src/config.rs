//! Configuration loading and root folder resolution
//!
//! The evaluation root folder holds stimuli (generated audio, sentence
//! pairs, speaker references) and results. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `SEVAL_ROOT_FOLDER` environment variable
//! 3. TOML config file (`~/.config/seval/config.toml`, then `/etc/seval/config.toml`)
//! 4. OS-dependent compiled default (fallback)

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Environment variable consulted for the evaluation root folder
pub const ROOT_FOLDER_ENV: &str = "SEVAL_ROOT_FOLDER";

/// Bootstrap configuration loaded from the TOML config file
///
/// Everything here has a built-in default; a missing config file never
/// prevents startup.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Evaluation root folder (optional; resolution priority applies)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit speaker list; when empty, speakers are discovered by
    /// scanning `audio/speaker_*` directories
    #[serde(default)]
    pub speakers: Vec<String>,

    /// Maximum number of items presented per speaker
    #[serde(default = "default_max_items_per_speaker")]
    pub max_items_per_speaker: usize,

    /// Minimum complete zero-shot/fine-tuned pairs required before the
    /// paired significance test is reported for a metric
    #[serde(default = "default_min_paired_samples")]
    pub min_paired_samples: usize,
}

fn default_max_items_per_speaker() -> usize {
    5
}

fn default_min_paired_samples() -> usize {
    5
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            speakers: Vec::new(),
            max_items_per_speaker: default_max_items_per_speaker(),
            min_paired_samples: default_min_paired_samples(),
        }
    }
}

impl TomlConfig {
    /// Load from the first config file found, or defaults when none exists
    pub fn load() -> Self {
        let Some(path) = find_config_file() else {
            return TomlConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<TomlConfig>(&content) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }
            },
            Err(e) => {
                warn!("Cannot read config file {}: {}", path.display(), e);
                TomlConfig::default()
            }
        }
    }
}

/// Resolve the evaluation root folder following the 4-tier priority order
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    /// Resolve the root folder; never fails, the lowest tier is a compiled default
    pub fn resolve(&self, config: &TomlConfig) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("Root folder: {} (from CLI)", path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                info!("Root folder: {} (from {})", path, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &config.root_folder {
            info!("Root folder: {} (from config file)", path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let default = get_default_root_folder();
        info!("Root folder: {} (compiled default)", default.display());
        default
    }
}

/// Find the first config file present on this platform
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("seval").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/seval/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("seval"))
        .unwrap_or_else(|| PathBuf::from("./seval_data"))
}

/// Ensures the root folder and its results subtree exist before use
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Create the root folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            Error::Config(format!(
                "Cannot create root folder {}: {}",
                self.root.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_max_items_per_speaker() {
        assert_eq!(default_max_items_per_speaker(), 5);
    }

    #[test]
    fn test_default_min_paired_samples() {
        assert_eq!(default_min_paired_samples(), 5);
    }

    #[test]
    fn test_toml_config_defaults_from_empty_document() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.root_folder.is_none());
        assert!(config.speakers.is_empty());
        assert_eq!(config.max_items_per_speaker, 5);
        assert_eq!(config.min_paired_samples, 5);
    }

    #[test]
    fn test_toml_config_full_document() {
        let config: TomlConfig = toml::from_str(
            r#"
            root_folder = "/srv/seval"
            speakers = ["1055", "124992", "28165"]
            max_items_per_speaker = 3
            min_paired_samples = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/seval")));
        assert_eq!(config.speakers.len(), 3);
        assert_eq!(config.max_items_per_speaker, 3);
        assert_eq!(config.min_paired_samples, 10);
    }

    #[test]
    fn test_default_root_folder_is_nonempty() {
        assert!(!get_default_root_folder().as_os_str().is_empty());
    }

    // Env-var tests run serially to avoid racing on SEVAL_ROOT_FOLDER.

    #[test]
    #[serial]
    fn test_cli_argument_beats_environment() {
        std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
        let resolver = RootFolderResolver::new(Some(PathBuf::from("/from/cli")));
        assert_eq!(
            resolver.resolve(&TomlConfig::default()),
            PathBuf::from("/from/cli")
        );
        std::env::remove_var(ROOT_FOLDER_ENV);
    }

    #[test]
    #[serial]
    fn test_environment_beats_config_file() {
        std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/config")),
            ..TomlConfig::default()
        };
        assert_eq!(
            RootFolderResolver::new(None).resolve(&config),
            PathBuf::from("/from/env")
        );
        std::env::remove_var(ROOT_FOLDER_ENV);
    }

    #[test]
    #[serial]
    fn test_config_file_beats_compiled_default() {
        std::env::remove_var(ROOT_FOLDER_ENV);
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/config")),
            ..TomlConfig::default()
        };
        assert_eq!(
            RootFolderResolver::new(None).resolve(&config),
            PathBuf::from("/from/config")
        );
    }
}
