#![no_main]
#![no_std]

use {defmt_rtt as _, panic_probe as _};

pub mod battery;
pub mod bq24075;
pub mod object_store;
pub mod power_manager;
pub mod scheduler;
pub mod status_led;
pub mod system_alarms;
