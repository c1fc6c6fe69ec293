use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use power_manager_x::datatypes::FlightBatteryState;
use power_manager_x::services::StateStore;

/// Shared record with a single writer. Readers either poll [`ObjectStore::get`] or wait for the
/// next write.
pub struct ObjectStore<T: Copy> {
    data: Mutex<NoopRawMutex, Cell<Option<T>>>,
    updated: Signal<NoopRawMutex, T>,
}

impl<T: Copy + Default> ObjectStore<T> {
    pub const fn new() -> Self {
        Self {
            data: Mutex::new(Cell::new(None)),
            updated: Signal::new(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.data.lock(|cell| cell.get().is_some())
    }

    pub fn register(&self) {
        self.data.lock(|cell| {
            if cell.get().is_none() {
                cell.set(Some(T::default()));
            }
        });
    }

    pub fn read(&self) -> T {
        self.data.lock(|cell| cell.get().unwrap_or_default())
    }

    pub fn write(&self, value: T) {
        self.data.lock(|cell| cell.set(Some(value)));
        self.updated.signal(value);
    }

    pub async fn wait_update(&self) -> T {
        self.updated.wait().await
    }
}

pub type FlightBatteryStore = ObjectStore<FlightBatteryState>;

impl StateStore for FlightBatteryStore {
    fn ensure_registered(&self) -> Result<(), ()> {
        self.register();
        Ok(())
    }

    fn get(&self) -> FlightBatteryState {
        self.read()
    }

    fn set(&self, state: FlightBatteryState) {
        self.write(state)
    }
}
