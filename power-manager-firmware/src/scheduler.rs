use embassy_time::Duration;

use power_manager_x::services::PeriodicScheduler;

/// Holds the single period a module asks to be ticked at. The owning task builds its
/// `Ticker` from [`TickerSchedule::period`].
#[derive(Default)]
pub struct TickerSchedule {
    period: Option<Duration>,
}

impl TickerSchedule {
    pub fn new() -> Self {
        Self { period: None }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl PeriodicScheduler for TickerSchedule {
    fn register_periodic(&mut self, period_ms: u32) -> Result<(), ()> {
        if period_ms == 0 || self.period.is_some() {
            return Err(());
        }
        self.period = Some(Duration::from_millis(period_ms as u64));
        Ok(())
    }
}
