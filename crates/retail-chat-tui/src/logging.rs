//! File-backed tracing. The alternate screen owns stderr, so log lines go to
//! `retail-chat.log` in the platform data directory instead.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "retail_chat=info,retail_chat_core=info";

pub fn log_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;

    Ok(data_dir.join("retail-chat").join("retail-chat.log"))
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init() -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()?;

    Ok(path)
}
