//! System services the power manager publishes to and is driven by.

use crate::datatypes::{AlarmChannel, AlarmLevel, FlightBatteryState};

/// Invokes the monitor's tick at a fixed cadence once registered.
pub trait PeriodicScheduler {
    fn register_periodic(&mut self, period_ms: u32) -> Result<(), ()>;
}

/// Shared flight battery record. Other tasks read it; the power manager is its only writer.
pub trait StateStore {
    /// Creates the record if it does not exist yet. Calling it twice is harmless.
    fn ensure_registered(&self) -> Result<(), ()>;
    fn get(&self) -> FlightBatteryState;
    fn set(&self, state: FlightBatteryState);
}

pub trait AlarmRegistry {
    fn set_alarm(&self, channel: AlarmChannel, level: AlarmLevel);
}

impl<T: StateStore + ?Sized> StateStore for &T {
    fn ensure_registered(&self) -> Result<(), ()> {
        (**self).ensure_registered()
    }

    fn get(&self) -> FlightBatteryState {
        (**self).get()
    }

    fn set(&self, state: FlightBatteryState) {
        (**self).set(state)
    }
}

impl<T: AlarmRegistry + ?Sized> AlarmRegistry for &T {
    fn set_alarm(&self, channel: AlarmChannel, level: AlarmLevel) {
        (**self).set_alarm(channel, level)
    }
}
