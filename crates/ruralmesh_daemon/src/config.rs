use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Returns the ~/.ruralmesh directory, creating it if needed.
/// Falls back to a local `.ruralmesh` directory if the home directory
/// cannot be determined.
pub fn mesh_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(mut path) => {
            path.push(".ruralmesh");
            if let Err(e) = fs::create_dir_all(&path) {
                warn!(error = %e, "Could not create ~/.ruralmesh, falling back to local .ruralmesh");
                let fallback = PathBuf::from(".ruralmesh");
                let _ = fs::create_dir_all(&fallback);
                return fallback;
            }
            path
        }
        None => {
            warn!("Could not determine home directory, falling back to local .ruralmesh");
            let fallback = PathBuf::from(".ruralmesh");
            let _ = fs::create_dir_all(&fallback);
            fallback
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulationConfig {
    /// Fixed RNG seed; omit for a fresh trajectory every run.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Attach synthetic temperature readings each cycle.
    #[serde(default)]
    pub sensors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// HTTP endpoint for the messaging side-channel. With none set, the
    /// summary goes to the log instead.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Delay before the per-cycle summary is sent.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

fn default_delay_secs() -> u64 {
    10
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            delay_secs: default_delay_secs(),
        }
    }
}

impl Config {
    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Loads the config from the data directory, writing the defaults out
    /// on first use.
    pub fn load_from(data_dir: &Path) -> anyhow::Result<Self> {
        let path = Self::config_path(data_dir);

        if !path.exists() {
            let config = Config::default();
            config.save_to(data_dir)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, data_dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(data_dir)?;
        let toml = toml::to_string_pretty(self)?;
        fs::write(Self::config_path(data_dir), toml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        assert!(Config::config_path(dir.path()).exists());
        assert!(!config.notification.enabled);
        assert_eq!(config.notification.delay_secs, 10);
        assert_eq!(config.simulation.seed, None);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            Config::config_path(dir.path()),
            "[simulation]\nseed = 99\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.simulation.seed, Some(99));
        assert!(!config.simulation.sensors);
        assert_eq!(config.notification.delay_secs, 10);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.notification.enabled = true;
        config.notification.webhook_url = Some("http://localhost:9999/notify".to_string());
        config.simulation.sensors = true;
        config.save_to(dir.path()).unwrap();

        let loaded = Config::load_from(dir.path()).unwrap();
        assert!(loaded.notification.enabled);
        assert_eq!(
            loaded.notification.webhook_url.as_deref(),
            Some("http://localhost:9999/notify")
        );
        assert!(loaded.simulation.sensors);
    }
}
