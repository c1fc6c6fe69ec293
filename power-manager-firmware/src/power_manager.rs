use embassy_time::{Duration, Ticker};

use power_manager_x::power_manager::BatteryMonitor;

use crate::battery::{AdcSnapshot, BatteryAdc};
use crate::bq24075::Bq24075;
use crate::object_store::FlightBatteryStore;
use crate::system_alarms::SystemAlarms;

pub type FlightBatteryMonitor =
    BatteryMonitor<&'static AdcSnapshot, Bq24075<'static>, &'static FlightBatteryStore, &'static SystemAlarms>;

/// Ticks the monitor forever. Each tick finishes before the next is awaited, so the
/// read-modify-write of the battery record never overlaps itself.
#[embassy_executor::task]
pub async fn power_manager_task(mut monitor: FlightBatteryMonitor, mut adc: BatteryAdc, period: Duration) -> ! {
    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;

        adc.sample().await;
        // Invalid readings are logged by the monitor and resampled next tick
        let _ = monitor.on_timer();
    }
}
