//! Digital pin access

use lock_core::{LockError, LockResult};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pin mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    /// Driven by us
    Output,
    /// Read by us
    Input,
}

impl PinDirection {
    fn as_sysfs(self) -> &'static str {
        match self {
            Self::Output => "out",
            Self::Input => "in",
        }
    }
}

/// A pin we drive
pub trait OutputPin: Send + Sync {
    /// Drive the pin high
    fn set(&self) -> LockResult<()>;
    /// Drive the pin low
    fn clear(&self) -> LockResult<()>;
}

/// A pin we read
pub trait InputPin: Send + Sync {
    /// Whether the pin reads high
    fn get(&self) -> bool;
}

/// GPIO pin exposed through the Linux sysfs interface
#[derive(Debug)]
pub struct SysfsPin {
    number: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export `number` under `gpio_root` (normally `/sys/class/gpio`) and set its direction
    pub fn open(gpio_root: &Path, number: u32, direction: PinDirection) -> LockResult<Self> {
        let pin_dir = gpio_root.join(format!("gpio{number}"));
        if !pin_dir.exists() {
            fs::write(gpio_root.join("export"), number.to_string()).map_err(|e| {
                LockError::hardware_fault(format!("failed to export GPIO{number}: {e}"))
            })?;
        }
        fs::write(pin_dir.join("direction"), direction.as_sysfs()).map_err(|e| {
            LockError::hardware_fault(format!("failed to configure GPIO{number}: {e}"))
        })?;
        debug!(pin = number, direction = direction.as_sysfs(), "opened GPIO pin");
        Ok(Self {
            number,
            value_path: pin_dir.join("value"),
        })
    }

    fn write_value(&self, value: &str) -> LockResult<()> {
        fs::write(&self.value_path, value).map_err(|e| {
            LockError::hardware_fault(format!("failed to drive GPIO{}: {e}", self.number))
        })
    }
}

impl OutputPin for SysfsPin {
    fn set(&self) -> LockResult<()> {
        self.write_value("1")
    }

    fn clear(&self) -> LockResult<()> {
        self.write_value("0")
    }
}

impl InputPin for SysfsPin {
    fn get(&self) -> bool {
        match fs::read_to_string(&self.value_path) {
            Ok(value) => value.trim() == "1",
            Err(e) => {
                // A sensor that cannot be read reports the bolt as engaged.
                warn!(pin = self.number, error = %e, "failed to read GPIO pin");
                false
            }
        }
    }
}

/// Pin held in memory; clones share the level
#[derive(Debug, Clone, Default)]
pub struct MemoryPin {
    level: Arc<Mutex<bool>>,
}

impl MemoryPin {
    /// Pin starting at `high`
    pub fn new(high: bool) -> Self {
        Self {
            level: Arc::new(Mutex::new(high)),
        }
    }

    /// Force the level, as the outside world would
    pub fn drive(&self, high: bool) {
        *self.level.lock() = high;
    }
}

impl OutputPin for MemoryPin {
    fn set(&self) -> LockResult<()> {
        self.drive(true);
        Ok(())
    }

    fn clear(&self) -> LockResult<()> {
        self.drive(false);
        Ok(())
    }
}

impl InputPin for MemoryPin {
    fn get(&self) -> bool {
        *self.level.lock()
    }
}
