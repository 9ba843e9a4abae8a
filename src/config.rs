use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Reportforge configuration (loaded from .reportforge.toml)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForgeConfig {
    #[serde(default)]
    pub render: RenderSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSection {
    /// Readiness poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Spool directory shared with the rendering worker
    #[serde(default = "default_spool")]
    pub spool: PathBuf,

    /// Treat "no pdf and no messages" as a distinct failure
    #[serde(default)]
    pub strict_empty_result: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        RenderSection {
            poll_interval_ms: default_poll_interval_ms(),
            spool: default_spool(),
            strict_empty_result: false,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_spool() -> PathBuf {
    PathBuf::from("spool")
}

impl ForgeConfig {
    /// Try to load .reportforge.toml from the given directory or its parents
    pub fn load(start: &Path) -> Option<Self> {
        let config_path = find_config_file(start)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<ForgeConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    None
                }
            },
            Err(e) => {
                debug!("Could not read {}: {}", config_path.display(), e);
                None
            }
        }
    }
}

/// Walk up from the start path to find .reportforge.toml
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(".reportforge.toml");
        if config.exists() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Create a default .reportforge.toml in the current directory
pub fn init_config() -> Result<()> {
    let config_path = std::env::current_dir()?.join(".reportforge.toml");

    if config_path.exists() {
        println!("⚠️  .reportforge.toml already exists in this directory");
        return Ok(());
    }

    let default_config = r#"# Reportforge configuration

[render]
# Job readiness poll interval in milliseconds
poll_interval_ms = 200

# Spool directory shared with the rendering worker
spool = "spool"

# Fail with a distinct "worker produced no output" error when the worker
# returns neither a document nor diagnostics
strict_empty_result = false
"#;

    std::fs::write(&config_path, default_config)?;
    println!("✅ Created .reportforge.toml");
    println!("   Edit it to point at your rendering worker's spool directory.");

    Ok(())
}
