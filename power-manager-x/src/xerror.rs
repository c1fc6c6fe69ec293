/// Which part of module initialization failed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitStage {
    StateRegistration,
    CallbackRegistration,
    InvalidConfig,
}

// Basic intra-project error type
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum XError {
    /// Fatal; the monitor must not be scheduled.
    InitializationFailure(InitStage),
    /// Charger rejected the charge mode. Sampling carries on.
    StartupDegraded,
    /// Sample could not be converted to a finite voltage; nothing was published this tick.
    InvalidReading { reference_raw: u16, battery_raw: u16 },
}

impl From<InitStage> for XError {
    fn from(stage: InitStage) -> Self {
        XError::InitializationFailure(stage)
    }
}

pub type XResult<T> = Result<T, XError>;
