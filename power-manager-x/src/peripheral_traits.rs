use crate::datatypes::{ChargeMode, ChargeState};

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdcChannel {
    /// Internal voltage reference.
    Reference,
    /// Battery, behind the resistor divider.
    Battery,
}

pub trait AdConverter {
    // Latest raw sample on the channel. Must not block.
    fn read_channel(&mut self, channel: AdcChannel) -> u16;
}

pub trait ChargeController {
    fn set_charge_mode(&mut self, mode: ChargeMode) -> Result<(), ()>;
    fn get_charge_state(&mut self) -> ChargeState;
}
