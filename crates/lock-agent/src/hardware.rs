//! Hardware selection at startup

use crate::config::{HardwareConfig, HardwareKind};
use lock_core::effects::{ExternalToggle, HardwareController, PhysicalTimeEffects};
use lock_core::LockResult;
use lock_effects::{RealHardware, SimulatedHardware};
use std::sync::Arc;
use tracing::info;

/// The controller injected into the lock service, plus the operator toggle
/// when the controller is simulated
#[derive(Clone)]
pub struct HardwareHandles {
    /// Production control path
    pub controller: Arc<dyn HardwareController>,
    /// Out-of-band toggle, simulated hardware only
    pub external_toggle: Option<Arc<dyn ExternalToggle>>,
}

/// Construct the controller selected by `config`
pub fn build_hardware(
    config: &HardwareConfig,
    time: Arc<dyn PhysicalTimeEffects>,
) -> LockResult<HardwareHandles> {
    match config.kind {
        HardwareKind::Simulated => {
            let seed = config.seed.unwrap_or_else(rand::random);
            let simulated = Arc::new(SimulatedHardware::new(config.failure_rate, seed)?);
            info!(
                failure_rate = config.failure_rate,
                seed, "using simulated hardware"
            );
            Ok(HardwareHandles {
                controller: simulated.clone(),
                external_toggle: Some(simulated),
            })
        }
        HardwareKind::Gpio => {
            let real = RealHardware::open_sysfs(
                &config.gpio_root,
                config.relay_pin,
                config.monitor_pin,
                time,
                config.polling(),
            )?;
            info!(
                relay_pin = config.relay_pin,
                monitor_pin = config.monitor_pin,
                "using GPIO hardware"
            );
            Ok(HardwareHandles {
                controller: Arc::new(real),
                external_toggle: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lock_effects::SimulatedTimeHandler;

    #[test]
    fn test_simulated_exposes_toggle() {
        let config = HardwareConfig {
            seed: Some(1),
            ..HardwareConfig::default()
        };
        let handles = build_hardware(&config, Arc::new(SimulatedTimeHandler::default())).unwrap();
        let toggle = handles.external_toggle.unwrap();
        let before = handles.controller.status();
        assert_eq!(toggle.toggle_externally(), before.toggled());
        assert_eq!(handles.controller.status(), before.toggled());
    }

    #[test]
    fn test_gpio_opens_pins_under_root() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("gpio17")).unwrap();
        std::fs::create_dir(root.path().join("gpio22")).unwrap();
        let config = HardwareConfig {
            kind: HardwareKind::Gpio,
            gpio_root: root.path().to_path_buf(),
            ..HardwareConfig::default()
        };
        let handles = build_hardware(&config, Arc::new(SimulatedTimeHandler::default())).unwrap();
        assert!(handles.external_toggle.is_none());
        assert_eq!(
            std::fs::read_to_string(root.path().join("gpio17/value")).unwrap(),
            "0"
        );
    }
}
