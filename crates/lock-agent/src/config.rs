//! Daemon configuration
//!
//! Loaded from `<config-dir>/lockd.toml`; every field has a default so an
//! absent file or section means the built-in settings.

use lock_core::{LockError, LockResult};
use lock_effects::hardware::gpio::{MONITOR_PIN, RELAY_PIN};
use lock_effects::PollingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration file name inside the config directory
pub const CONFIG_FILE: &str = "lockd.toml";

/// Which hardware controller the daemon drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareKind {
    /// In-memory bolt with transient failures
    #[default]
    Simulated,
    /// Relay and sensor on GPIO pins
    Gpio,
}

/// Hardware section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Controller variant
    pub kind: HardwareKind,
    /// Sensor poll interval while actuating
    pub poll_interval_ms: u64,
    /// Bound on one actuation
    pub toggle_timeout_ms: u64,
    /// Probability a simulated actuation fails
    pub failure_rate: f64,
    /// Seed for simulated failures; random when absent
    pub seed: Option<u64>,
    /// Relay output pin
    pub relay_pin: u32,
    /// Bolt sensor input pin
    pub monitor_pin: u32,
    /// sysfs GPIO directory
    pub gpio_root: PathBuf,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        let polling = PollingConfig::default();
        Self {
            kind: HardwareKind::default(),
            poll_interval_ms: polling.poll_interval_ms,
            toggle_timeout_ms: polling.toggle_timeout_ms,
            failure_rate: 0.1,
            seed: None,
            relay_pin: RELAY_PIN,
            monitor_pin: MONITOR_PIN,
            gpio_root: PathBuf::from("/sys/class/gpio"),
        }
    }
}

impl HardwareConfig {
    /// Timing handed to the GPIO controller
    pub fn polling(&self) -> PollingConfig {
        PollingConfig {
            poll_interval_ms: self.poll_interval_ms,
            toggle_timeout_ms: self.toggle_timeout_ms,
        }
    }
}

/// Naming section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Name of the self-blessing a fresh, unclaimed device starts with
    pub device_name: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            device_name: "lockd".to_string(),
        }
    }
}

/// Complete daemon configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Hardware settings
    pub hardware: HardwareConfig,
    /// Naming settings
    pub naming: NamingConfig,
}

impl DaemonConfig {
    /// Parse TOML text
    pub fn from_toml(text: &str) -> LockResult<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| LockError::config(format!("failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> LockResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| {
            LockError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Reject settings the daemon cannot run with
    pub fn validate(&self) -> LockResult<()> {
        let hw = &self.hardware;
        if hw.poll_interval_ms == 0 {
            return Err(LockError::config("poll_interval_ms cannot be zero"));
        }
        if hw.toggle_timeout_ms < hw.poll_interval_ms {
            return Err(LockError::config(
                "toggle_timeout_ms must be at least poll_interval_ms",
            ));
        }
        if !(0.0..1.0).contains(&hw.failure_rate) {
            return Err(LockError::config("failure_rate must be in [0, 1)"));
        }
        if hw.relay_pin == hw.monitor_pin {
            return Err(LockError::config("relay_pin and monitor_pin must differ"));
        }
        if !lock_core::naming::is_valid_lock_name(&self.naming.device_name)
            || self.naming.device_name.is_empty()
        {
            return Err(LockError::config(format!(
                "device_name {:?} is not a valid identity name",
                self.naming.device_name
            )));
        }
        Ok(())
    }
}

/// The daemon's private configuration directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    path: PathBuf,
}

impl ConfigDir {
    /// Use `path`, creating it owner-only when absent
    ///
    /// Fails when `path` exists and is not a directory.
    pub fn prepare(path: &Path) -> LockResult<Self> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(LockError::config(format!(
                    "{} is not a directory",
                    path.display()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                create_private_dir(path)?;
                info!(path = %path.display(), "created configuration directory");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of `lockd.toml`
    pub fn config_file(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    /// Load the configuration stored in this directory
    pub fn load_config(&self) -> LockResult<DaemonConfig> {
        DaemonConfig::load(&self.config_file())
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> LockResult<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> LockResult<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hardware_bounds() {
        let config = DaemonConfig::default();
        assert_eq!(config.hardware.kind, HardwareKind::Simulated);
        assert_eq!(config.hardware.poll_interval_ms, 200);
        assert_eq!(config.hardware.toggle_timeout_ms, 5_000);
        assert_eq!(config.hardware.relay_pin, 17);
        assert_eq!(config.hardware.monitor_pin, 22);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DaemonConfig::from_toml(
            r#"
            [hardware]
            kind = "gpio"
            toggle_timeout_ms = 2000

            [naming]
            device_name = "porch"
            "#,
        )
        .unwrap();
        assert_eq!(config.hardware.kind, HardwareKind::Gpio);
        assert_eq!(config.hardware.toggle_timeout_ms, 2_000);
        assert_eq!(config.hardware.poll_interval_ms, 200);
        assert_eq!(config.naming.device_name, "porch");
    }

    #[test]
    fn test_validation_rejects_bad_timing() {
        let mut config = DaemonConfig::default();
        config.hardware.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(LockError::Config { .. })));

        let mut config = DaemonConfig::default();
        config.hardware.toggle_timeout_ms = 100;
        assert!(config.validate().is_err());

        let mut config = DaemonConfig::default();
        config.hardware.failure_rate = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_dir_is_created_private() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("lockd");
        let dir = ConfigDir::prepare(&path).unwrap();
        assert!(dir.path().is_dir());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
        assert_eq!(dir.load_config().unwrap(), DaemonConfig::default());
    }

    #[test]
    fn test_config_dir_must_be_a_directory() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("file");
        fs::write(&path, b"").unwrap();
        assert!(matches!(
            ConfigDir::prepare(&path),
            Err(LockError::Config { .. })
        ));
    }
}
