//! Relay and bolt sensor on GPIO pins
//!
//! Setting the relay pulses the motor; the sensor reads high while the bolt
//! is retracted. An actuation holds the relay until the sensor reports the
//! target state or the timeout passes, and always releases it afterwards.

use super::pins::{InputPin, OutputPin, PinDirection, SysfsPin};
use super::PollingConfig;
use async_trait::async_trait;
use lock_core::effects::{HardwareController, PhysicalTimeEffects};
use lock_core::{LockError, LockResult, LockStatus};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Relay pin on the reference board
pub const RELAY_PIN: u32 = 17;
/// Sensor pin on the reference board
pub const MONITOR_PIN: u32 = 22;

/// Hardware controller driving a relay and reading a sensor
pub struct RealHardware<R, M> {
    relay: R,
    monitor: M,
    time: Arc<dyn PhysicalTimeEffects>,
    polling: PollingConfig,
    actuation: Mutex<()>,
}

impl RealHardware<SysfsPin, SysfsPin> {
    /// Open the relay and sensor pins through sysfs
    pub fn open_sysfs(
        gpio_root: &Path,
        relay_pin: u32,
        monitor_pin: u32,
        time: Arc<dyn PhysicalTimeEffects>,
        polling: PollingConfig,
    ) -> LockResult<Self> {
        let relay = SysfsPin::open(gpio_root, relay_pin, PinDirection::Output)?;
        let monitor = SysfsPin::open(gpio_root, monitor_pin, PinDirection::Input)?;
        Self::new(relay, monitor, time, polling)
    }
}

impl<R: OutputPin, M: InputPin> RealHardware<R, M> {
    /// Controller over already opened pins; the relay starts released
    pub fn new(
        relay: R,
        monitor: M,
        time: Arc<dyn PhysicalTimeEffects>,
        polling: PollingConfig,
    ) -> LockResult<Self> {
        relay.clear()?;
        info!(
            poll_interval_ms = polling.poll_interval_ms,
            toggle_timeout_ms = polling.toggle_timeout_ms,
            "GPIO hardware ready"
        );
        Ok(Self {
            relay,
            monitor,
            time,
            polling,
            actuation: Mutex::new(()),
        })
    }

    async fn wait_for(&self, desired: bool) -> LockResult<()> {
        let start = self.time.physical_time().await?;
        loop {
            if self.monitor.get() == desired {
                return Ok(());
            }
            let waited = start.until(self.time.physical_time().await?);
            let waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
            if waited_ms > self.polling.toggle_timeout_ms {
                return Err(LockError::hardware_timeout(waited_ms));
            }
            self.time.sleep_ms(self.polling.poll_interval_ms).await?;
        }
    }
}

#[async_trait]
impl<R: OutputPin, M: InputPin> HardwareController for RealHardware<R, M> {
    fn status(&self) -> LockStatus {
        if self.monitor.get() {
            LockStatus::Unlocked
        } else {
            LockStatus::Locked
        }
    }

    async fn set_status(&self, target: LockStatus) -> LockResult<()> {
        let _guard = self.actuation.lock().await;
        let desired = target == LockStatus::Unlocked;
        debug!(%target, "actuating relay");
        let result = match self.relay.set() {
            Ok(()) => self.wait_for(desired).await,
            Err(e) => Err(e),
        };
        if let Err(e) = self.relay.clear() {
            error!(error = %e, "failed to release relay");
            return result.and(Err(e));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MemoryPin;
    use crate::time::SimulatedTimeHandler;

    /// Sensor that follows the relay after a number of reads
    struct Motor {
        relay: MemoryPin,
        bolt: MemoryPin,
        reads_to_move: usize,
        reads: parking_lot::Mutex<usize>,
    }

    impl InputPin for Arc<Motor> {
        fn get(&self) -> bool {
            let mut reads = self.reads.lock();
            if self.relay.get() {
                *reads += 1;
                if *reads >= self.reads_to_move {
                    *reads = 0;
                    self.bolt.drive(!self.bolt.get());
                }
            }
            self.bolt.get()
        }
    }

    fn hardware(reads_to_move: usize) -> (RealHardware<MemoryPin, Arc<Motor>>, SimulatedTimeHandler) {
        let time = SimulatedTimeHandler::new(0);
        let relay = MemoryPin::new(true);
        let motor = Arc::new(Motor {
            relay: relay.clone(),
            bolt: MemoryPin::new(false),
            reads_to_move,
            reads: parking_lot::Mutex::new(0),
        });
        let hw = RealHardware::new(relay, motor, Arc::new(time.clone()), PollingConfig::default())
            .unwrap();
        (hw, time)
    }

    #[tokio::test]
    async fn test_unlock_waits_for_sensor_and_releases_relay() {
        let (hw, time) = hardware(3);
        assert_eq!(hw.status(), LockStatus::Locked);
        hw.set_status(LockStatus::Unlocked).await.unwrap();
        assert_eq!(hw.status(), LockStatus::Unlocked);
        assert!(!hw.relay.get());
        assert_eq!(time.get_time(), 400);
    }

    #[tokio::test]
    async fn test_already_in_target_state_returns_immediately() {
        let (hw, time) = hardware(3);
        hw.set_status(LockStatus::Locked).await.unwrap();
        assert_eq!(time.get_time(), 0);
        assert!(!hw.relay.get());
    }

    #[tokio::test]
    async fn test_stuck_bolt_times_out() {
        let (hw, _time) = hardware(usize::MAX);
        let result = hw.set_status(LockStatus::Unlocked).await;
        match result {
            Err(LockError::HardwareTimeout { waited_ms }) => assert!(waited_ms > 5_000),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(!hw.relay.get());
        assert_eq!(hw.status(), LockStatus::Locked);
    }

    /// Relay that counts being driven while already engaged
    #[derive(Clone)]
    struct RecordingRelay {
        pin: MemoryPin,
        overlaps: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl OutputPin for RecordingRelay {
        fn set(&self) -> LockResult<()> {
            if self.pin.get() {
                self.overlaps
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            self.pin.set()
        }

        fn clear(&self) -> LockResult<()> {
            self.pin.clear()
        }
    }

    #[tokio::test]
    async fn test_concurrent_actuations_run_one_at_a_time() {
        let time = SimulatedTimeHandler::new(0);
        let relay = RecordingRelay {
            pin: MemoryPin::new(false),
            overlaps: Arc::default(),
        };
        let motor = Arc::new(Motor {
            relay: relay.pin.clone(),
            bolt: MemoryPin::new(false),
            reads_to_move: 3,
            reads: parking_lot::Mutex::new(0),
        });
        let hw = RealHardware::new(
            relay.clone(),
            motor,
            Arc::new(time.clone()),
            PollingConfig::default(),
        )
        .unwrap();

        let actuate = |target| {
            let hw = &hw;
            async move {
                hw.set_status(target).await?;
                Ok::<_, LockError>(hw.status())
            }
        };
        let (unlocked, locked) = tokio::join!(
            actuate(LockStatus::Unlocked),
            actuate(LockStatus::Locked)
        );

        assert_eq!(unlocked.unwrap(), LockStatus::Unlocked);
        assert_eq!(locked.unwrap(), LockStatus::Locked);
        assert_eq!(
            relay.overlaps.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
        assert!(!relay.pin.get());
        assert_eq!(time.get_time(), 800);
    }
}
