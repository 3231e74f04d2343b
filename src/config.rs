use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RestructureError, Result};
use crate::refactor::{MessageCatalog, RelocationOptions};

/// Directory holding the persisted model and settings.
const STATE_DIR: &str = ".restructure";
/// Default database filename.
const DB_FILE: &str = "model.db";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";

/// Project-level configuration resolved from the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the project.
    pub project_root: PathBuf,
    /// Path to the `.restructure/` directory.
    pub state_dir: PathBuf,
    /// Path to the `SQLite` database.
    pub db_path: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// User settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .restructure/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub relocation: RelocationSettings,
    pub conflicts: ConflictSettings,
    /// Message catalog overrides keyed by message id.
    pub messages: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocationSettings {
    /// Rewrite references to files and members below a moved element.
    pub follow_descendants: bool,
    /// Undo earlier moves of a batch when a later one fails.
    pub rollback_on_failure: bool,
}

impl Default for RelocationSettings {
    fn default() -> Self {
        Self {
            follow_descendants: true,
            rollback_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictSettings {
    /// Refuse to apply a move with conflicts unless forced.
    pub abort_on_conflicts: bool,
}

impl Default for ConflictSettings {
    fn default() -> Self {
        Self {
            abort_on_conflicts: true,
        }
    }
}

impl Config {
    /// Create config for a given project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let state_dir = project_root.join(STATE_DIR);
        let db_path = state_dir.join(DB_FILE);
        let config_path = state_dir.join(CONFIG_FILE);

        let settings = Self::load_settings(&config_path).unwrap_or_default();

        Self {
            project_root,
            state_dir,
            db_path,
            config_path,
            settings,
        }
    }

    /// Create config from the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| RestructureError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd))
    }

    /// Load settings from config.toml if it exists.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        match toml::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    /// Save current settings to config.toml.
    pub fn save_settings(&self) -> Result<()> {
        self.ensure_state_dir()?;
        let content = toml::to_string_pretty(&self.settings)
            .map_err(|e| RestructureError::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Ensure the `.restructure/` directory exists.
    pub fn ensure_state_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)?;
        Ok(())
    }

    /// Check whether an imported model exists.
    #[must_use]
    pub fn model_exists(&self) -> bool {
        self.db_path.exists()
    }

    #[must_use]
    pub fn relocation_options(&self) -> RelocationOptions {
        RelocationOptions {
            follow_descendants: self.settings.relocation.follow_descendants,
            rollback_on_failure: self.settings.relocation.rollback_on_failure,
        }
    }

    /// Standard messages with the configured overrides applied.
    #[must_use]
    pub fn catalog(&self) -> MessageCatalog {
        MessageCatalog::standard().with_overrides(&self.settings.messages)
    }
}
