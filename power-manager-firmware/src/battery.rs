use core::cell::Cell;

use embassy_nrf::saadc::Saadc;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use power_manager_x::peripheral_traits::{AdConverter, AdcChannel};

const CHANNEL_COUNT: usize = 2;

fn channel_index(channel: AdcChannel) -> usize {
    // Must match the SAADC channel order used in main
    match channel {
        AdcChannel::Reference => 0,
        AdcChannel::Battery => 1,
    }
}

/// Most recent raw SAADC conversion of every channel.
pub struct AdcSnapshot {
    samples: Mutex<NoopRawMutex, Cell<[u16; CHANNEL_COUNT]>>,
}

impl AdcSnapshot {
    pub const fn new() -> Self {
        Self {
            samples: Mutex::new(Cell::new([0; CHANNEL_COUNT])),
        }
    }

    fn store(&self, samples: [u16; CHANNEL_COUNT]) {
        self.samples.lock(|cell| cell.set(samples));
    }
}

impl AdConverter for &AdcSnapshot {
    fn read_channel(&mut self, channel: AdcChannel) -> u16 {
        self.samples.lock(|cell| cell.get()[channel_index(channel)])
    }
}

pub struct BatteryAdc {
    adc: Saadc<'static, CHANNEL_COUNT>,
    snapshot: &'static AdcSnapshot,
}

impl BatteryAdc {
    pub fn new(adc: Saadc<'static, CHANNEL_COUNT>, snapshot: &'static AdcSnapshot) -> Self {
        Self { adc, snapshot }
    }

    /// Converts every channel once and refreshes the snapshot.
    pub async fn sample(self: &mut Self) {
        let mut adc_msmt_buf = [0i16; CHANNEL_COUNT];
        self.adc.sample(&mut adc_msmt_buf).await;

        // Single ended inputs can read slightly negative around 0 V
        self.snapshot.store(adc_msmt_buf.map(|raw| raw.max(0) as u16));
    }
}
