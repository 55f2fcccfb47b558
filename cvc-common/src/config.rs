//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CVC_ROOT_FOLDER`, then `CVC_ROOT` environment variable
//! 3. `root_folder` in the module's TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: the resolver logs a
//! warning and falls through to the next source.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "CVC_ROOT_FOLDER";

/// Alternative root folder environment variable
pub const ROOT_ENV: &str = "CVC_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cvc.db";

/// Settings compiled into the binaries, used when nothing overrides them
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub draft_debounce_ms: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
            host: "127.0.0.1".to_string(),
            port: 5760,
            draft_debounce_ms: 1500,
        }
    }
}

fn default_root_folder() -> PathBuf {
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join("cvc");
    }
    if cfg!(target_os = "linux") {
        PathBuf::from("/var/lib/cvc")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/cvc")
    } else if cfg!(target_os = "windows") {
        PathBuf::from("C:\\ProgramData\\cvc")
    } else {
        PathBuf::from("./cvc_data")
    }
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
        }
    }
}

/// `[server]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Per-module TOML config file contents; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// Quiet period before a draft autosave is written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_debounce_ms: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl TomlConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Resolves the root folder for one service module
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Highest-priority override from the command line
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    debug!("Root folder from {}: {}", var, path);
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(root_folder) = self.load_config().and_then(|c| c.root_folder) {
            debug!("Root folder from config file: {}", root_folder.display());
            return root_folder;
        }

        CompiledDefaults::for_current_platform().root_folder
    }

    /// Load the module's config file, if one exists and parses
    pub fn load_config(&self) -> Option<TomlConfig> {
        let path = self.config_file_path()?;
        match TomlConfig::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// First existing config file: user config dir, then `/etc/cvc` on Linux
    pub fn config_file_path(&self) -> Option<PathBuf> {
        let file_name = format!("{}.toml", self.module_name);

        let user_config = dirs::config_dir().map(|d| d.join("cvc").join(&file_name));
        if let Some(path) = user_config.filter(|p| p.exists()) {
            return Some(path);
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/cvc").join(&file_name);
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Prepares a resolved root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the folder (and parents); safe to call repeatedly
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
