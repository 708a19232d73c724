// actuator.rs

use std::sync::Mutex;

use embedded_hal::digital::OutputPin;

use crate::*;

/// Readings above this value switch the indicator to alert.
pub const AQI_ALERT_ABOVE: i64 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IndicatorState {
    Normal,
    Alert,
}

impl IndicatorState {
    pub fn from_aqi(aqi: i64) -> Self {
        if aqi > AQI_ALERT_ABOVE {
            IndicatorState::Alert
        } else {
            IndicatorState::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorState::Normal => "normal",
            IndicatorState::Alert => "alert",
        }
    }
}

/// Two mutually exclusive output signals.
pub trait Actuator: Send + Sync {
    fn set_alert(&self) -> anyhow::Result<()>;
    fn set_normal(&self) -> anyhow::Result<()>;
    /// Both outputs off.
    fn clear(&self) -> anyhow::Result<()>;
}

/// Commits `state`, overwriting whatever was shown before.
pub fn actuate(actuator: &dyn Actuator, state: IndicatorState) -> Result<(), AqiError> {
    let res = match state {
        IndicatorState::Alert => actuator.set_alert(),
        IndicatorState::Normal => actuator.set_normal(),
    };
    res.map_err(|e| AqiError::upstream("actuator", e))
}

struct PinPair<P> {
    normal: P,
    alert: P,
}

/// Drives a "normal" and an "alert" output pin.
pub struct PinActuator<P> {
    pins: Mutex<PinPair<P>>,
}

impl<P: OutputPin + Send> PinActuator<P> {
    pub fn new(normal: P, alert: P) -> Self {
        PinActuator {
            pins: Mutex::new(PinPair { normal, alert }),
        }
    }

    fn with_pins<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut PinPair<P>) -> Result<(), P::Error>,
    {
        let mut pins = self
            .pins
            .lock()
            .map_err(|_| anyhow!("Pin lock poisoned"))?;
        f(&mut pins).map_err(|e| anyhow!("Pin write error: {e:?}"))
    }
}

impl<P: OutputPin + Send> Actuator for PinActuator<P> {
    fn set_alert(&self) -> anyhow::Result<()> {
        self.with_pins(|p| {
            p.normal.set_low()?;
            p.alert.set_high()
        })
    }

    fn set_normal(&self) -> anyhow::Result<()> {
        self.with_pins(|p| {
            p.alert.set_low()?;
            p.normal.set_high()
        })
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.with_pins(|p| {
            p.normal.set_low()?;
            p.alert.set_low()
        })
    }
}

/// Logs state changes without driving any pin.
#[derive(Debug, Default)]
pub struct LogActuator {
    current: Mutex<Option<IndicatorState>>,
}

impl LogActuator {
    fn set(&self, s: Option<IndicatorState>) -> anyhow::Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| anyhow!("Indicator lock poisoned"))?;
        if *current != s {
            info!(
                "Indicator {} -> {}",
                (*current).map(|s| s.as_str()).unwrap_or("off"),
                s.map(|s| s.as_str()).unwrap_or("off")
            );
        }
        *current = s;
        Ok(())
    }

    pub fn current(&self) -> Option<IndicatorState> {
        self.current.lock().map(|c| *c).unwrap_or(None)
    }
}

impl Actuator for LogActuator {
    fn set_alert(&self) -> anyhow::Result<()> {
        self.set(Some(IndicatorState::Alert))
    }

    fn set_normal(&self) -> anyhow::Result<()> {
        self.set(Some(IndicatorState::Normal))
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.set(None)
    }
}

/// Keeps every committed state, in order.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    history: Mutex<Vec<Option<IndicatorState>>>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, s: Option<IndicatorState>) -> anyhow::Result<()> {
        self.history
            .lock()
            .map_err(|_| anyhow!("History lock poisoned"))?
            .push(s);
        Ok(())
    }

    /// `None` entries are clears.
    pub fn history(&self) -> Vec<Option<IndicatorState>> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<IndicatorState> {
        self.history().last().copied().flatten()
    }
}

impl Actuator for RecordingActuator {
    fn set_alert(&self) -> anyhow::Result<()> {
        self.push(Some(IndicatorState::Alert))
    }

    fn set_normal(&self) -> anyhow::Result<()> {
        self.push(Some(IndicatorState::Normal))
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.push(None)
    }
}

#[cfg(feature = "hardware")]
mod sysfs {
    use linux_embedded_hal::SysfsPin;
    use sysfs_gpio::Direction;

    use super::*;

    fn output_pin(num: u64) -> anyhow::Result<SysfsPin> {
        let pin = SysfsPin::new(num);
        pin.export()
            .with_context(|| format!("Cannot export gpio {num}"))?;
        pin.set_direction(Direction::Out)
            .with_context(|| format!("Cannot set gpio {num} as output"))?;
        Ok(pin)
    }

    /// Opens both indicator pins through sysfs.
    pub fn sysfs_actuator(normal_pin: u64, alert_pin: u64) -> anyhow::Result<PinActuator<SysfsPin>> {
        info!("Opening gpio {normal_pin} (normal) and {alert_pin} (alert)");
        Ok(PinActuator::new(output_pin(normal_pin)?, output_pin(alert_pin)?))
    }
}

#[cfg(feature = "hardware")]
pub use sysfs::sysfs_actuator;


// EOF
