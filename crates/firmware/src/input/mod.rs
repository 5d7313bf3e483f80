//! Debounced joystick and user-button input.
//!
//! Six channels ([`platform::InputChannel`]) are watched by an
//! [`InputEngine`]. Edges come from main-loop polling or from EXTI lines,
//! and are confirmed by a busy-wait or by a one-shot timer. The
//! combination is picked once with [`InputBuilder`]:
//!
//! | Source      | Debounce            | Confirmation path                      |
//! |-------------|---------------------|----------------------------------------|
//! | polling     | [`BusyWaitDebounce`] | `confirmed` set inside `poll_inputs`   |
//! | polling     | [`TimerDebounce`]    | `pending` at expiry, then promoted     |
//! | interrupt   | [`TimerDebounce`]    | `pending` at expiry, then promoted     |
//!
//! The application consumes events in its main loop:
//!
//! ```text
//! engine.promote_pending_events();
//! for ch in engine.confirmed_channels() { ... }
//! engine.reset_confirmed_events();
//! ```

pub mod builder;
pub mod debounce;
pub mod engine;

/// Embassy wiring: EXTI tasks, debounce timer task, IDR-backed pins.
#[cfg(feature = "hardware")]
pub mod hardware;

pub use builder::{InputBuilder, Unselected};
pub use debounce::{BusyWaitDebounce, DebounceOutcome, DebounceStrategy, TimerDebounce};
pub use engine::{ChannelState, InputEngine, InterruptSource, PollingSource};
