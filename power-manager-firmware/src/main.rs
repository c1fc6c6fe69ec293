#![no_main]
#![no_std]

use embassy_executor::Spawner;

use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::saadc;
use embassy_nrf::{bind_interrupts, interrupt};
use embassy_nrf::interrupt::InterruptExt;

use defmt::{info, unwrap};
use static_cell::StaticCell;

use power_manager_firmware::battery::{AdcSnapshot, BatteryAdc};
use power_manager_firmware::bq24075::Bq24075;
use power_manager_firmware::object_store::FlightBatteryStore;
use power_manager_firmware::power_manager::{self, FlightBatteryMonitor};
use power_manager_firmware::scheduler::TickerSchedule;
use power_manager_firmware::status_led;
use power_manager_firmware::system_alarms::SystemAlarms;

use power_manager_x::power_manager::MonitorConfig;

bind_interrupts!(struct SaadcIrqs {
    SAADC => saadc::InterruptHandler;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Power manager");

    let p = embassy_nrf::init(Default::default());

    // Setup shared data between tasks
    static ADC_SNAPSHOT: StaticCell<AdcSnapshot> = StaticCell::new();
    let adc_snapshot: &'static AdcSnapshot = ADC_SNAPSHOT.init(AdcSnapshot::new());
    static FLIGHT_BATTERY_STORE: StaticCell<FlightBatteryStore> = StaticCell::new();
    let flight_battery_store: &'static FlightBatteryStore = FLIGHT_BATTERY_STORE.init(FlightBatteryStore::new());
    static SYSTEM_ALARMS: StaticCell<SystemAlarms> = StaticCell::new();
    let system_alarms: &'static SystemAlarms = SYSTEM_ALARMS.init(SystemAlarms::new());

    // Initialize LED
    let led = Output::new(p.P1_10, Level::Low, OutputDrive::Standard);

    // Initialize ADC; channel order is reference then battery
    let adc_config = saadc::Config::default();
    let reference_channel_config = saadc::ChannelConfig::single_ended(p.P0_02);
    let battery_channel_config = saadc::ChannelConfig::single_ended(p.P0_29);
    interrupt::SAADC.set_priority(interrupt::Priority::P2);
    let saadc = saadc::Saadc::new(p.SAADC, SaadcIrqs, adc_config, [reference_channel_config, battery_channel_config]);
    let battery_adc = BatteryAdc::new(saadc, adc_snapshot);

    // Initialize charger
    let charger = Bq24075::new(
        Output::new(p.P0_13, Level::Low, OutputDrive::Standard),   // EN1
        Output::new(p.P0_14, Level::Low, OutputDrive::Standard),   // EN2
        Input::new(p.P0_15, Pull::Up),                             // CHG
        Input::new(p.P0_16, Pull::Up),                             // PGOOD
    );

    let mut monitor: FlightBatteryMonitor = power_manager_x::power_manager::BatteryMonitor::new(
        adc_snapshot,
        charger,
        flight_battery_store,
        system_alarms,
        MonitorConfig::default(),
    );

    let mut schedule = TickerSchedule::new();
    unwrap!(monitor.initialize(&mut schedule));
    let period = unwrap!(schedule.period());

    // Charging stays in its reset mode on failure; already reported by the monitor
    let _ = monitor.start();

    // Start tasks
    unwrap!(spawner.spawn(status_led::status_led_task(led, system_alarms.battery_signal())));
    unwrap!(spawner.spawn(battery_report_task(flight_battery_store)));
    unwrap!(spawner.spawn(power_manager::power_manager_task(monitor, battery_adc, period)));
}

#[embassy_executor::task]
async fn battery_report_task(store: &'static FlightBatteryStore) -> ! {
    let mut last_charge = None;

    loop {
        let state = store.wait_update().await;
        if last_charge != Some(state.estimated_flight_time) {
            info!("Battery at {} V, charge {}%", state.voltage, state.charge_percent());
            last_charge = Some(state.estimated_flight_time);
        }
    }
}
