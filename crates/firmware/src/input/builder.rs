//! Fluent builder API for the input engine.
//!
//! Picks the edge source and the debounce strategy once, at composition
//! time, and fixes both in the engine's type:
//!
//! ```text
//! InputBuilder::polling()   .busy_wait(delay) ─┐
//! InputBuilder::polling()   .timer(one_shot)  ─┼─ .debounce_ms(ms) ─ .build(pins)
//! InputBuilder::interrupt() .timer(one_shot)  ─┘
//! ```
//!
//! `InputBuilder::interrupt().busy_wait(..)` does not compile: an edge
//! handler must never block for the debounce window.
//!
//! # Usage
//!
//! ```
//! use embedded_hal_mock::eh1::delay::NoopDelay;
//! use firmware::input::InputBuilder;
//! use platform::mocks::MockInputPin;
//!
//! let pins = core::array::from_fn(|_| MockInputPin::new(false));
//! let mut engine = InputBuilder::polling()
//!     .debounce_ms(20)
//!     .busy_wait(NoopDelay::new())
//!     .build(pins);
//! engine.poll_inputs();
//! ```

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use platform::config::DEBOUNCE_MS;
use platform::{OneShotTimer, CHANNEL_COUNT};

use super::debounce::{BusyWaitDebounce, DebounceStrategy, TimerDebounce};
use super::engine::{InputEngine, InterruptSource, PollingSource};

/// Strategy slot before `.busy_wait()` / `.timer()` is chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unselected;

/// Fluent builder for [`InputEngine`].
///
/// `S` is the edge source marker, `D` the debounce strategy (or
/// [`Unselected`]).
pub struct InputBuilder<S, D> {
    debounce_ms: u32,
    debounce: D,
    _source: PhantomData<S>,
}

impl InputBuilder<PollingSource, Unselected> {
    /// Edges found by sampling from the main loop.
    ///
    /// Default debounce: [`DEBOUNCE_MS`].
    pub fn polling() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            debounce: Unselected,
            _source: PhantomData,
        }
    }

    /// Confirm edges by blocking for the window, then resampling.
    pub fn busy_wait<D: DelayNs>(
        self,
        delay: D,
    ) -> InputBuilder<PollingSource, BusyWaitDebounce<D>> {
        InputBuilder {
            debounce_ms: self.debounce_ms,
            debounce: BusyWaitDebounce::new(delay, self.debounce_ms),
            _source: PhantomData,
        }
    }
}

impl InputBuilder<InterruptSource, Unselected> {
    /// Edges delivered by EXTI line from interrupt context.
    ///
    /// Default debounce: [`DEBOUNCE_MS`].
    pub fn interrupt() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            debounce: Unselected,
            _source: PhantomData,
        }
    }
}

impl<S> InputBuilder<S, Unselected> {
    /// Set debounce time in milliseconds.
    ///
    /// Must be called before choosing the strategy.
    #[must_use]
    pub fn debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Confirm edges with a one-shot timer.
    ///
    /// The timer must be configured for the builder's debounce window.
    pub fn timer<T: OneShotTimer>(self, timer: T) -> InputBuilder<S, TimerDebounce<T>> {
        InputBuilder {
            debounce_ms: self.debounce_ms,
            debounce: TimerDebounce::new(timer, self.debounce_ms),
            _source: PhantomData,
        }
    }
}

impl<S, D> InputBuilder<S, D> {
    /// Get the configured debounce time in milliseconds.
    pub fn debounce(&self) -> u32 {
        self.debounce_ms
    }
}

impl<S, D: DebounceStrategy> InputBuilder<S, D> {
    /// Build the engine over one pin per channel, ordered as
    /// [`InputChannel::ALL`](platform::InputChannel::ALL).
    pub fn build<P: InputPin>(self, pins: [P; CHANNEL_COUNT]) -> InputEngine<P, S, D> {
        InputEngine::new(pins, self.debounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use platform::mocks::{MockInputPin, MockOneShotTimer};

    #[test]
    fn default_window_is_board_debounce() {
        assert_eq!(InputBuilder::polling().debounce(), DEBOUNCE_MS);
        assert_eq!(InputBuilder::interrupt().debounce(), 50);
    }

    #[test]
    fn window_reaches_the_strategy() {
        let pins: [MockInputPin; CHANNEL_COUNT] =
            core::array::from_fn(|_| MockInputPin::new(false));
        let engine = InputBuilder::polling()
            .debounce_ms(20)
            .busy_wait(NoopDelay::new())
            .build(pins);
        assert_eq!(engine.debounce().window_ms(), 20);

        let pins: [MockInputPin; CHANNEL_COUNT] =
            core::array::from_fn(|_| MockInputPin::new(false));
        let engine = InputBuilder::interrupt()
            .debounce_ms(75)
            .timer(MockOneShotTimer::new())
            .build(pins);
        assert_eq!(engine.debounce().window_ms(), 75);
    }
}
