use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const APP_DIR_NAME: &str = "pinboard";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    pub theme: Option<String>,
    /// Username stamped on comments written from this terminal.
    pub author: Option<String>,
    #[serde(default)]
    pub show_resolved: bool,
    #[serde(default)]
    pub keymap: HashMap<String, String>,
    pub log_filter: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    pub fn author_name(&self) -> String {
        if let Some(author) = self.author.as_deref()
            && !author.trim().is_empty()
        {
            return author.trim().to_string();
        }
        env::var("USER")
            .or_else(|_| env::var("USERNAME"))
            .unwrap_or_default()
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join(APP_DIR_NAME).join("config.toml")
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&dir).to_path_buf();
    }

    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".config");
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
