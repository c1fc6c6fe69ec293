use crate::utils::{adc_convert_to_voltage, charge_bucket_from_voltage};
use crate::xerror::{XError, XResult};

/// Number of 10%-wide charge buckets.
pub const CHARGE_BUCKET_COUNT: usize = 10;

/// Ascending voltage thresholds, each the lower bound of a 10% charge bucket.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChargeCurve([f32; CHARGE_BUCKET_COUNT]);

impl ChargeCurve {
    /// Single cell LiPo resting voltage curve.
    pub const LIPO_1S: ChargeCurve = ChargeCurve([
        3.00, // 00%
        3.78, // 10%
        3.83, // 20%
        3.87, // 30%
        3.89, // 40%
        3.92, // 50%
        3.96, // 60%
        4.00, // 70%
        4.04, // 80%
        4.10, // 90%
    ]);

    pub const fn new(thresholds: [f32; CHARGE_BUCKET_COUNT]) -> Self {
        Self(thresholds)
    }

    pub fn thresholds(&self) -> &[f32; CHARGE_BUCKET_COUNT] {
        &self.0
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Maps a voltage to its charge bucket, 0 (empty) through 9.
    pub fn classify(&self, voltage: f32) -> u8 {
        charge_bucket_from_voltage(voltage, &self.0)
    }
}

impl Default for ChargeCurve {
    fn default() -> Self {
        Self::LIPO_1S
    }
}

/// Raw ADC pair taken on a single tick.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleReading {
    pub reference_raw: u16,
    pub battery_raw: u16,
}

impl SampleReading {
    pub fn new(reference_raw: u16, battery_raw: u16) -> Self {
        Self {
            reference_raw,
            battery_raw,
        }
    }

    /// Converts the battery sample to volts. A zero reference (or anything else yielding a
    /// non-finite value) is reported as [`XError::InvalidReading`].
    pub fn to_voltage(&self, internal_vref: f32, divider: f32) -> XResult<f32> {
        if self.reference_raw == 0 {
            return Err(self.invalid());
        }

        let voltage = adc_convert_to_voltage(self.battery_raw, self.reference_raw, internal_vref, divider);
        if voltage.is_finite() {
            Ok(voltage)
        } else {
            Err(self.invalid())
        }
    }

    fn invalid(&self) -> XError {
        XError::InvalidReading {
            reference_raw: self.reference_raw,
            battery_raw: self.battery_raw,
        }
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FlightBatteryState {
    pub voltage: f32,
    /// Charging state code reported by the charger, see [`ChargeState::code`].
    pub current: f32,
    /// Charge bucket index (0-9).
    pub estimated_flight_time: u32,
}

impl FlightBatteryState {
    /// Lower bound of the charge bucket in percent.
    pub fn charge_percent(&self) -> u32 {
        self.estimated_flight_time * 10
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AlarmLevel {
    #[default]
    Ok,
    Warning,
    Error,
}

impl AlarmLevel {
    /// Bucket 0 is an error, bucket 1 a warning, everything above is fine.
    pub fn from_charge_bucket(bucket: u8) -> Self {
        match bucket {
            0 => AlarmLevel::Error,
            1 => AlarmLevel::Warning,
            _ => AlarmLevel::Ok,
        }
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlarmChannel {
    Battery = 0,
}

impl AlarmChannel {
    pub const COUNT: usize = 1;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Last level written to each alarm channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmTable {
    levels: [Option<AlarmLevel>; AlarmChannel::COUNT],
}

impl AlarmTable {
    pub const fn new() -> Self {
        Self {
            levels: [None; AlarmChannel::COUNT],
        }
    }

    /// Channels never written read as [`AlarmLevel::Ok`].
    pub fn get(&self, channel: AlarmChannel) -> AlarmLevel {
        self.levels[channel.index()].unwrap_or_default()
    }

    /// Records `level` and returns true if the channel's level changed. The first write to a
    /// channel always counts as a change.
    pub fn set(&mut self, channel: AlarmChannel, level: AlarmLevel) -> bool {
        let previous = self.levels[channel.index()].replace(level);
        previous != Some(level)
    }
}

/// Input current limit selections of a BQ24075 style charger (EN1/EN2 pin combinations).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChargeMode {
    Usb100mA,
    Usb500mA,
    InputLimited,
    Standby,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChargeState {
    NotCharging = 0,
    Charging = 1,
    Fault = 2,
}

impl ChargeState {
    /// Value published in [`FlightBatteryState::current`].
    pub fn code(self) -> f32 {
        self as u8 as f32
    }
}
