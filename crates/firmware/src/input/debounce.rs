//! Debounce strategies.
//!
//! [`BusyWaitDebounce`] blocks for the window and decides on the spot; it is
//! only usable from the main loop. [`TimerDebounce`] arms a one-shot timer
//! and leaves the decision to the engine's expiry handler.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use platform::{OneShotTimer, PinState, Polarity};

/// Result of starting a debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// The line held for the whole window.
    Confirmed,
    /// The line did not hold, or the debounce could not be started.
    Rejected,
    /// A timer is running; the decision comes at expiry.
    Armed,
}

/// How an edge is confirmed.
pub trait DebounceStrategy {
    /// Start confirming an edge on `pin`.
    fn begin<P: InputPin>(&mut self, pin: &mut P, polarity: Polarity) -> DebounceOutcome;

    /// Abandon a running confirmation. No-op for synchronous strategies.
    fn cancel(&mut self);

    /// Length of the debounce window in milliseconds.
    fn window_ms(&self) -> u32;
}

/// Delay for the window, then resample.
pub struct BusyWaitDebounce<D> {
    delay: D,
    window_ms: u32,
}

impl<D: DelayNs> BusyWaitDebounce<D> {
    /// Busy-wait debounce of `window_ms` using `delay`.
    pub fn new(delay: D, window_ms: u32) -> Self {
        Self { delay, window_ms }
    }
}

impl<D: DelayNs> DebounceStrategy for BusyWaitDebounce<D> {
    fn begin<P: InputPin>(&mut self, pin: &mut P, polarity: Polarity) -> DebounceOutcome {
        self.delay.delay_ms(self.window_ms);
        match pin.is_high() {
            Ok(high) if polarity.is_asserted(PinState::from(high)) => DebounceOutcome::Confirmed,
            Ok(_) => DebounceOutcome::Rejected,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("debounce: pin read failed after busy-wait");
                DebounceOutcome::Rejected
            }
        }
    }

    fn cancel(&mut self) {}

    fn window_ms(&self) -> u32 {
        self.window_ms
    }
}

/// Arm a one-shot timer; the engine resamples on expiry.
pub struct TimerDebounce<T> {
    timer: T,
    window_ms: u32,
}

impl<T: OneShotTimer> TimerDebounce<T> {
    /// Timer debounce. `window_ms` must match the timer's configured interval.
    pub fn new(timer: T, window_ms: u32) -> Self {
        Self { timer, window_ms }
    }
}

impl<T: OneShotTimer> DebounceStrategy for TimerDebounce<T> {
    fn begin<P: InputPin>(&mut self, _pin: &mut P, _polarity: Polarity) -> DebounceOutcome {
        match self.timer.start() {
            Ok(()) => DebounceOutcome::Armed,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("debounce: timer start failed, edge dropped");
                DebounceOutcome::Rejected
            }
        }
    }

    fn cancel(&mut self) {
        if self.timer.stop().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("debounce: timer stop failed");
        }
    }

    fn window_ms(&self) -> u32 {
        self.window_ms
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use platform::mocks::{MockInputPin, MockOneShotTimer};

    /// Delay that releases a pin while waiting and records the total wait.
    struct ReleasingDelay {
        pin: MockInputPin,
        waited_ns: u64,
    }

    impl DelayNs for ReleasingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.waited_ns += u64::from(ns);
            self.pin.drive(false);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.delay_ns(ms * 1_000_000);
        }
    }

    #[test]
    fn busy_wait_samples_after_the_window() {
        let handle = MockInputPin::new(true);
        let mut pin = handle.clone();
        let mut delay = ReleasingDelay {
            pin: handle,
            waited_ns: 0,
        };
        {
            let mut strategy = BusyWaitDebounce::new(&mut delay, 50);
            assert_eq!(
                strategy.begin(&mut pin, Polarity::ActiveHigh),
                DebounceOutcome::Rejected,
                "line released during the window must be rejected"
            );
        }
        assert_eq!(delay.waited_ns, 50_000_000);
    }

    #[test]
    fn busy_wait_follows_polarity() {
        let mut strategy = BusyWaitDebounce::new(NoopDelay::new(), 50);
        let mut pin = MockInputPin::new(false);
        assert_eq!(
            strategy.begin(&mut pin, Polarity::ActiveHigh),
            DebounceOutcome::Rejected
        );
        assert_eq!(
            strategy.begin(&mut pin, Polarity::ActiveLow),
            DebounceOutcome::Confirmed,
            "a low line is the pressed level for active-low inputs"
        );
    }

    #[test]
    fn timer_strategy_arms_and_cancels() {
        let timer = MockOneShotTimer::new();
        let mut strategy = TimerDebounce::new(timer.clone(), 50);
        let mut pin = MockInputPin::new(true);

        assert_eq!(
            strategy.begin(&mut pin, Polarity::ActiveHigh),
            DebounceOutcome::Armed
        );
        assert!(timer.is_running());
        strategy.cancel();
        assert!(!timer.is_running());
        assert_eq!(strategy.window_ms(), 50);
    }
}
