use embassy_nrf::gpio::{Input, Output};

use power_manager_x::datatypes::{ChargeMode, ChargeState};
use power_manager_x::peripheral_traits::ChargeController;

/// TI BQ24075 linear charger. Input current limit is set with EN1/EN2, status is read from the
/// open drain CHG and PGOOD outputs (both active low).
pub struct Bq24075<'d> {
    en1: Output<'d>,
    en2: Output<'d>,
    chg: Input<'d>,
    pgood: Input<'d>,
}

impl<'d> Bq24075<'d> {
    pub fn new(en1: Output<'d>, en2: Output<'d>, chg: Input<'d>, pgood: Input<'d>) -> Self {
        Self { en1, en2, chg, pgood }
    }
}

impl ChargeController for Bq24075<'_> {
    fn set_charge_mode(&mut self, mode: ChargeMode) -> Result<(), ()> {
        // (EN2, EN1)
        let (en2, en1) = match mode {
            ChargeMode::Usb100mA => (false, false),
            ChargeMode::Usb500mA => (false, true),
            ChargeMode::InputLimited => (true, false),
            ChargeMode::Standby => (true, true),
        };

        self.en1.set_level(en1.into());
        self.en2.set_level(en2.into());
        Ok(())
    }

    fn get_charge_state(&mut self) -> ChargeState {
        let power_good = self.pgood.is_low();
        let charging = self.chg.is_low();

        match (power_good, charging) {
            (true, true) => ChargeState::Charging,
            // CHG asserted without input power is not a state the charger should report
            (false, true) => ChargeState::Fault,
            _ => ChargeState::NotCharging,
        }
    }
}
