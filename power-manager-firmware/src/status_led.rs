use core::future::{Future, Pending, pending};
use core::pin::Pin;
use core::task::{Context, Poll};
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio;
use embassy_time::{Duration, Timer};

use power_manager_x::datatypes::AlarmLevel;

use crate::system_alarms::AlarmSignal;

const WARNING_BLINK_INTERVAL: Duration = Duration::from_millis(500);
const ERROR_BLINK_INTERVAL: Duration = Duration::from_millis(100);

enum TimerOrPending {
    Timer(Timer),
    Pending(Pending<()>),
}

impl Future for TimerOrPending {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match core::pin::Pin::get_mut(self) {
            Self::Timer(timer) => {
                let repinned = core::pin::pin!(timer);
                repinned.poll(cx)
            },
            Self::Pending(pending_) => {
                let repinned = core::pin::pin!(pending_);
                repinned.poll(cx)
            },
        }
    }
}

/// Shows the battery alarm: off when ok, slow blink on warning, fast blink on error.
#[embassy_executor::task]
pub async fn status_led_task(mut led: gpio::Output<'static>, battery_alarm: &'static AlarmSignal) -> ! {
    let mut level = battery_alarm.wait().await;

    loop {
        let blink_future = match level {
            AlarmLevel::Ok => {
                led.set_low();
                TimerOrPending::Pending(pending())
            },
            AlarmLevel::Warning => TimerOrPending::Timer(Timer::after(WARNING_BLINK_INTERVAL)),
            AlarmLevel::Error => TimerOrPending::Timer(Timer::after(ERROR_BLINK_INTERVAL)),
        };

        // Wait for the next blink or the next alarm change
        match select(blink_future, battery_alarm.wait()).await {
            Either::First(_) => led.toggle(),
            Either::Second(new_level) => level = new_level,
        }
    }
}
