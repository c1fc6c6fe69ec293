//! Measures the battery level and controls the charging circuit.
//!
//! Every tick the reference and battery ADC channels are sampled, the battery sample is scaled to
//! volts and bucketed against a [`ChargeCurve`], and the result is written to the shared
//! [`FlightBatteryState`] record. The battery alarm is then set from the bucket.

use crate::datatypes::{AlarmChannel, AlarmLevel, ChargeCurve, ChargeMode, FlightBatteryState, SampleReading};
use crate::peripheral_traits::{AdConverter, AdcChannel, ChargeController};
use crate::services::{AlarmRegistry, PeriodicScheduler, StateStore};
use crate::xerror::{InitStage, XError, XResult};

pub const SAMPLE_PERIOD_MS: u32 = 500;
pub const ADC_INTERNAL_VREF: f32 = 1.20;
pub const PM_BAT_DIVIDER: f32 = 3.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    pub sample_period_ms: u32,
    pub adc_internal_vref: f32,
    pub divider: f32,
    pub charge_mode: ChargeMode,
    pub curve: ChargeCurve,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: SAMPLE_PERIOD_MS,
            adc_internal_vref: ADC_INTERNAL_VREF,
            divider: PM_BAT_DIVIDER,
            charge_mode: ChargeMode::Usb500mA,
            curve: ChargeCurve::LIPO_1S,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> XResult<()> {
        let scale_ok = self.adc_internal_vref.is_finite()
            && self.adc_internal_vref > 0.0
            && self.divider.is_finite()
            && self.divider > 0.0;

        if self.sample_period_ms == 0 || !scale_ok || !self.curve.is_strictly_increasing() {
            return Err(InitStage::InvalidConfig.into());
        }
        Ok(())
    }
}

pub struct BatteryMonitor<A, C, S, L> {
    adc: A,
    charger: C,
    store: S,
    alarms: L,
    config: MonitorConfig,
}

impl<A, C, S, L> BatteryMonitor<A, C, S, L>
where
    A: AdConverter,
    C: ChargeController,
    S: StateStore,
    L: AlarmRegistry,
{
    pub fn new(adc: A, charger: C, store: S, alarms: L, config: MonitorConfig) -> Self {
        Self {
            adc,
            charger,
            store,
            alarms,
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Registers the state record and the periodic tick. Any error here is fatal.
    pub fn initialize(&mut self, scheduler: &mut impl PeriodicScheduler) -> XResult<()> {
        self.config.validate()?;

        self.store
            .ensure_registered()
            .map_err(|_| XError::from(InitStage::StateRegistration))?;
        scheduler
            .register_periodic(self.config.sample_period_ms)
            .map_err(|_| XError::from(InitStage::CallbackRegistration))?;

        info!("Power manager sampling every {} ms", self.config.sample_period_ms);
        Ok(())
    }

    /// Selects the charge current. A failure leaves the charger in whatever mode it was in and
    /// is reported as [`XError::StartupDegraded`]; ticks still run.
    pub fn start(&mut self) -> XResult<()> {
        if self.charger.set_charge_mode(self.config.charge_mode).is_err() {
            warn!("Charger rejected charge mode; battery charging left at its default.");
            return Err(XError::StartupDegraded);
        }
        Ok(())
    }

    /// Runs one sample/classify/publish pass and returns the published record.
    ///
    /// On [`XError::InvalidReading`] neither the state record nor the alarm is touched, so the
    /// last good voltage stays published until the next tick resamples.
    pub fn on_timer(&mut self) -> XResult<FlightBatteryState> {
        let reading = SampleReading::new(
            self.adc.read_channel(AdcChannel::Reference),
            self.adc.read_channel(AdcChannel::Battery),
        );

        let voltage = match reading.to_voltage(self.config.adc_internal_vref, self.config.divider) {
            Ok(voltage) => voltage,
            Err(e) => {
                warn!("Discarding battery sample: {}", e);
                return Err(e);
            }
        };
        let charge = self.config.curve.classify(voltage);

        let mut state = self.store.get();
        state.voltage = voltage;
        state.current = self.charger.get_charge_state().code();
        state.estimated_flight_time = charge as u32;
        self.store.set(state);

        let level = AlarmLevel::from_charge_bucket(charge);
        self.alarms.set_alarm(AlarmChannel::Battery, level);

        debug!("Battery {} V, charge bucket {}, alarm {}", voltage, charge, level);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::ChargeState;
    use assert_float_eq::*;
    use std::cell::{Cell, RefCell};

    struct FakeAdc {
        reference: u16,
        battery: u16,
    }

    impl AdConverter for FakeAdc {
        fn read_channel(&mut self, channel: AdcChannel) -> u16 {
            match channel {
                AdcChannel::Reference => self.reference,
                AdcChannel::Battery => self.battery,
            }
        }
    }

    struct FakeCharger {
        reject: bool,
        mode: Option<ChargeMode>,
        state: ChargeState,
    }

    impl FakeCharger {
        fn new(state: ChargeState) -> Self {
            Self {
                reject: false,
                mode: None,
                state,
            }
        }
    }

    impl ChargeController for FakeCharger {
        fn set_charge_mode(&mut self, mode: ChargeMode) -> Result<(), ()> {
            if self.reject {
                return Err(());
            }
            self.mode = Some(mode);
            Ok(())
        }

        fn get_charge_state(&mut self) -> ChargeState {
            self.state
        }
    }

    #[derive(Default)]
    struct FakeStore {
        reject: bool,
        registrations: Cell<u32>,
        data: Cell<FlightBatteryState>,
        writes: Cell<u32>,
    }

    impl StateStore for FakeStore {
        fn ensure_registered(&self) -> Result<(), ()> {
            if self.reject {
                return Err(());
            }
            self.registrations.set(self.registrations.get() + 1);
            Ok(())
        }

        fn get(&self) -> FlightBatteryState {
            self.data.get()
        }

        fn set(&self, state: FlightBatteryState) {
            self.writes.set(self.writes.get() + 1);
            self.data.set(state);
        }
    }

    #[derive(Default)]
    struct FakeAlarms {
        history: RefCell<Vec<(AlarmChannel, AlarmLevel)>>,
    }

    impl FakeAlarms {
        fn last(&self) -> Option<AlarmLevel> {
            self.history.borrow().last().map(|(_, level)| *level)
        }
    }

    impl AlarmRegistry for FakeAlarms {
        fn set_alarm(&self, channel: AlarmChannel, level: AlarmLevel) {
            self.history.borrow_mut().push((channel, level));
        }
    }

    #[derive(Default)]
    struct FakeScheduler {
        reject: bool,
        period_ms: Option<u32>,
    }

    impl PeriodicScheduler for FakeScheduler {
        fn register_periodic(&mut self, period_ms: u32) -> Result<(), ()> {
            if self.reject {
                return Err(());
            }
            self.period_ms = Some(period_ms);
            Ok(())
        }
    }

    fn monitor<'a>(
        reference: u16,
        battery: u16,
        store: &'a FakeStore,
        alarms: &'a FakeAlarms,
    ) -> BatteryMonitor<FakeAdc, FakeCharger, &'a FakeStore, &'a FakeAlarms> {
        BatteryMonitor::new(
            FakeAdc { reference, battery },
            FakeCharger::new(ChargeState::Charging),
            store,
            alarms,
            MonitorConfig::default(),
        )
    }

    // Battery sample that converts to `voltage` against a 4096 reference
    fn battery_raw_for(voltage: f32) -> u16 {
        (voltage / PM_BAT_DIVIDER * (4096.0 / ADC_INTERNAL_VREF)).round() as u16
    }

    #[test]
    fn initialize_registers_state_and_period() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();
        let mut scheduler = FakeScheduler::default();

        let mut pm = monitor(4096, 2048, &store, &alarms);
        assert_eq!(pm.initialize(&mut scheduler), Ok(()));
        assert_eq!(pm.initialize(&mut scheduler), Ok(()));

        assert_eq!(scheduler.period_ms, Some(500));
        assert_eq!(store.registrations.get(), 2);
    }

    #[test]
    fn initialize_fails_when_state_registration_fails() {
        let store = FakeStore {
            reject: true,
            ..Default::default()
        };
        let alarms = FakeAlarms::default();
        let mut scheduler = FakeScheduler::default();

        let mut pm = monitor(4096, 2048, &store, &alarms);
        assert_eq!(
            pm.initialize(&mut scheduler),
            Err(XError::InitializationFailure(InitStage::StateRegistration))
        );
        assert_eq!(scheduler.period_ms, None);
    }

    #[test]
    fn initialize_fails_when_callback_registration_fails() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();
        let mut scheduler = FakeScheduler {
            reject: true,
            ..Default::default()
        };

        let mut pm = monitor(4096, 2048, &store, &alarms);
        assert_eq!(
            pm.initialize(&mut scheduler),
            Err(XError::InitializationFailure(InitStage::CallbackRegistration))
        );
    }

    #[test]
    fn initialize_rejects_non_increasing_curve() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();
        let mut scheduler = FakeScheduler::default();
        let config = MonitorConfig {
            curve: ChargeCurve::new([3.0; 10]),
            ..Default::default()
        };

        let mut pm = BatteryMonitor::new(
            FakeAdc {
                reference: 4096,
                battery: 2048,
            },
            FakeCharger::new(ChargeState::NotCharging),
            &store,
            &alarms,
            config,
        );
        assert_eq!(
            pm.initialize(&mut scheduler),
            Err(XError::InitializationFailure(InitStage::InvalidConfig))
        );
        assert_eq!(store.registrations.get(), 0);
    }

    #[test]
    fn start_selects_500ma_charge_mode() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();

        let mut pm = monitor(4096, 2048, &store, &alarms);
        assert_eq!(pm.start(), Ok(()));
        assert_eq!(pm.charger.mode, Some(ChargeMode::Usb500mA));
    }

    #[test]
    fn start_failure_is_degraded_and_ticks_continue() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();

        let mut pm = monitor(4096, battery_raw_for(3.95), &store, &alarms);
        pm.charger.reject = true;
        assert_eq!(pm.start(), Err(XError::StartupDegraded));

        let state = pm.on_timer().unwrap();
        assert_eq!(state.estimated_flight_time, 6);
        assert_eq!(store.writes.get(), 1);
    }

    #[test]
    fn on_timer_publishes_voltage_charge_state_and_bucket() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();

        let mut pm = monitor(4096, 2048, &store, &alarms);
        let state = pm.on_timer().unwrap();

        assert_float_absolute_eq!(state.voltage, 1.8, 1e-5);
        assert_eq!(state.current, ChargeState::Charging.code());
        assert_eq!(state.estimated_flight_time, 0);
        assert_eq!(store.get(), state);
        assert_eq!(alarms.history.borrow().as_slice(), &[(AlarmChannel::Battery, AlarmLevel::Error)]);
    }

    #[test]
    fn on_timer_low_voltage_sample_raises_error() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();

        // 3000 / (4096 / 1.2) * 3.0 = 2.637 V, below the bottom of the curve
        let mut pm = monitor(4096, 3000, &store, &alarms);
        let state = pm.on_timer().unwrap();

        assert_float_absolute_eq!(state.voltage, 2.63671875, 1e-5);
        assert_eq!(store.get().estimated_flight_time, 0);
        assert_eq!(alarms.last(), Some(AlarmLevel::Error));
    }

    #[test]
    fn on_timer_alarm_follows_bucket() {
        let cases = [
            (3.50, 1, AlarmLevel::Warning),
            (3.80, 2, AlarmLevel::Ok),
            (3.91, 5, AlarmLevel::Ok),
            (4.20, 9, AlarmLevel::Ok),
        ];

        for (voltage, bucket, level) in cases {
            let store = FakeStore::default();
            let alarms = FakeAlarms::default();

            let mut pm = monitor(4096, battery_raw_for(voltage), &store, &alarms);
            let state = pm.on_timer().unwrap();

            assert_eq!(state.estimated_flight_time, bucket, "{} V", voltage);
            assert_eq!(alarms.last(), Some(level), "{} V", voltage);
        }
    }

    #[test]
    fn on_timer_overwrites_previous_record() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();
        store.data.set(FlightBatteryState {
            voltage: 4.0,
            current: ChargeState::Fault.code(),
            estimated_flight_time: 7,
        });

        let mut pm = monitor(4096, battery_raw_for(4.20), &store, &alarms);
        pm.charger.state = ChargeState::NotCharging;
        let state = pm.on_timer().unwrap();

        assert_eq!(state.current, ChargeState::NotCharging.code());
        assert_eq!(state.estimated_flight_time, 9);
        assert_eq!(store.writes.get(), 1);
    }

    #[test]
    fn on_timer_zero_reference_leaves_state_and_alarm_untouched() {
        let store = FakeStore::default();
        let alarms = FakeAlarms::default();

        let mut pm = monitor(4096, battery_raw_for(3.85), &store, &alarms);
        let good = pm.on_timer().unwrap();
        assert_eq!(alarms.last(), Some(AlarmLevel::Ok));

        pm.adc.reference = 0;
        assert_eq!(
            pm.on_timer(),
            Err(XError::InvalidReading {
                reference_raw: 0,
                battery_raw: battery_raw_for(3.85),
            })
        );

        assert_eq!(store.get(), good);
        assert!(store.get().voltage.is_finite());
        assert_eq!(store.writes.get(), 1);
        assert_eq!(alarms.history.borrow().len(), 1);

        // Next good sample publishes again
        pm.adc.reference = 4096;
        pm.adc.battery = battery_raw_for(3.50);
        assert_eq!(pm.on_timer().unwrap().estimated_flight_time, 1);
        assert_eq!(alarms.last(), Some(AlarmLevel::Warning));
    }
}
