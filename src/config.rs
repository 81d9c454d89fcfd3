use crate::errors::{LaunchError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_APP: &str = "coupler";

/// Defaults for a launch, read from `jupyter.yml`.
///
/// Every key is optional; anything missing falls back to the built-in value,
/// and command-line flags take precedence over both.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LaunchConfig {
    /// Application name used to derive the image, volume and container names
    pub app: String,
    /// Image to run; `unifem/<app>-desktop` when unset
    pub image: Option<String>,
    pub tag: String,
    /// Project volume; `<app>_project` when unset
    pub volume: Option<String>,
    /// Container runtime binary (docker or a CLI-compatible one)
    pub runtime: String,
    /// Home directory of the notebook user inside the image
    pub container_home: String,
    pub base_port: u16,
    pub port_retries: usize,
    /// Text preceding the server address in the notebook log
    pub url_marker: String,
    pub interrupt_grace_secs: u64,
    /// Refuse to run as root and require docker group membership (Linux)
    pub host_checks: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
            image: None,
            tag: "latest".to_string(),
            volume: None,
            runtime: "docker".to_string(),
            container_home: "/home/ubuntu".to_string(),
            base_port: 8888,
            port_retries: 50,
            url_marker: "http://0.0.0.0:".to_string(),
            interrupt_grace_secs: 5,
            host_checks: true,
        }
    }
}

impl LaunchConfig {
    /// Load config from an explicit path, or from the default location if present
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(LaunchError::Config(format!(
                        "Config file '{}' does not exist",
                        path.display()
                    )));
                }
                Self::load_from(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(LaunchConfig::default()),
            },
        }
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(LaunchConfig::default());
        }

        let config: LaunchConfig = serde_yml::from_str(&content).map_err(|e| {
            LaunchError::Config(format!(
                "Failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `<config_dir>/coupler/jupyter.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(DEFAULT_APP).join("jupyter.yml"))
    }

    pub fn default_image(&self) -> String {
        self.image
            .clone()
            .unwrap_or_else(|| format!("unifem/{}-desktop", self.app))
    }

    pub fn default_volume(&self) -> String {
        self.volume
            .clone()
            .unwrap_or_else(|| format!("{}_project", self.app))
    }

    pub fn interrupt_grace(&self) -> Duration {
        Duration::from_secs(self.interrupt_grace_secs)
    }

    /// Path of the notebook server log inside the container
    pub fn log_path(&self) -> String {
        format!("{}/.log/jupyter.log", self.container_home)
    }
}
