use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use power_manager_x::datatypes::{AlarmChannel, AlarmLevel, AlarmTable};
use power_manager_x::services::AlarmRegistry;

pub type AlarmSignal = Signal<NoopRawMutex, AlarmLevel>;

pub struct SystemAlarms {
    levels: Mutex<NoopRawMutex, Cell<AlarmTable>>,
    battery: AlarmSignal,
}

impl SystemAlarms {
    pub const fn new() -> Self {
        Self {
            levels: Mutex::new(Cell::new(AlarmTable::new())),
            battery: Signal::new(),
        }
    }

    pub fn get(&self, channel: AlarmChannel) -> AlarmLevel {
        self.levels.lock(|cell| cell.get().get(channel))
    }

    /// Fires when the battery alarm level changes.
    pub fn battery_signal(&self) -> &AlarmSignal {
        &self.battery
    }
}

impl AlarmRegistry for SystemAlarms {
    fn set_alarm(&self, channel: AlarmChannel, level: AlarmLevel) {
        let changed = self.levels.lock(|cell| {
            let mut levels = cell.get();
            let changed = levels.set(channel, level);
            cell.set(levels);
            changed
        });

        if !changed {
            return;
        }
        match channel {
            AlarmChannel::Battery => self.battery.signal(level),
        }
    }
}
