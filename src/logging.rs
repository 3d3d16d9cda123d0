use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::config::APP_DIR_NAME;
use crate::store::state_dir;

pub fn log_path() -> PathBuf {
    state_dir().join(APP_DIR_NAME).join("pinboard.log")
}

/// Routes tracing output to the log file; the terminal belongs to the UI.
/// `RUST_LOG` wins over the configured filter.
pub fn init(configured: Option<&str>) -> Result<()> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log dir at {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log at {}", path.display()))?;

    let env_filter = match configured {
        Some(directives) if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() => {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy(directives)
        }
        _ => EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to install log subscriber: {err}"))?;
    Ok(())
}
