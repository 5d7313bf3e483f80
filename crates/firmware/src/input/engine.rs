//! Debounce and edge-event engine for the six joystick/button channels.
//!
//! The engine turns raw line levels into clean one-shot "pressed" events.
//! Every channel carries three pieces of state ([`ChannelState`]):
//!
//! - `raw`: the level seen at the previous sample (edge detection)
//! - `pending`: confirmed by the debounce timer, not yet handed to the loop
//! - `confirmed`: visible to the main loop until [`reset_confirmed_events`]
//!
//! At most one debounce is in flight at any time. While it is, new edges are
//! dropped, not queued.
//!
//! Two choices are fixed by type at composition time (see
//! [`InputBuilder`](super::builder::InputBuilder)):
//!
//! | Source              | Debounce             | Edge → event path                         |
//! |---------------------|----------------------|-------------------------------------------|
//! | [`PollingSource`]   | [`BusyWaitDebounce`] | poll → delay → resample → `confirmed`     |
//! | [`PollingSource`]   | [`TimerDebounce`]    | poll → arm timer → expiry → `pending`     |
//! | [`InterruptSource`] | [`TimerDebounce`]    | EXTI → arm timer → expiry → `pending`     |
//!
//! Interrupt + busy-wait does not exist: delaying inside an edge handler
//! would stall every other interrupt, so that combination has no
//! `handle_interrupt`.
//!
//! [`reset_confirmed_events`]: InputEngine::reset_confirmed_events
//! [`BusyWaitDebounce`]: super::debounce::BusyWaitDebounce

use core::marker::PhantomData;

use embedded_hal::digital::InputPin;
use platform::{InputChannel, OneShotTimer, PinState, Polarity, CHANNEL_COUNT};

use super::debounce::{DebounceOutcome, DebounceStrategy, TimerDebounce};

// ---------------------------------------------------------------------------
// Source markers
// ---------------------------------------------------------------------------

/// Edges are found by sampling every channel from the main loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollingSource;

/// Edges arrive as EXTI line numbers from interrupt context.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterruptSource;

// ---------------------------------------------------------------------------
// Per-channel state
// ---------------------------------------------------------------------------

/// Edge-event state of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Level at the previous sample.
    pub raw: PinState,
    /// Confirmed by the timer, awaiting promotion.
    pub pending: bool,
    /// Visible to the main loop until reset.
    pub confirmed: bool,
}

impl ChannelState {
    const IDLE: Self = Self {
        raw: PinState::Low,
        pending: false,
        confirmed: false,
    };
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Debounce and edge-event engine.
///
/// `P` is the pin type (one per channel, indexed by
/// [`InputChannel::index`]), `S` the edge source marker and `D` the
/// debounce strategy.
pub struct InputEngine<P, S, D> {
    pins: [P; CHANNEL_COUNT],
    states: [ChannelState; CHANNEL_COUNT],
    debounce: D,
    debounce_in_progress: bool,
    recorded: Option<InputChannel>,
    _source: PhantomData<S>,
}

impl<P, S, D> InputEngine<P, S, D>
where
    P: InputPin,
    D: DebounceStrategy,
{
    /// Assemble an engine. Usually called through
    /// [`InputBuilder::build`](super::builder::InputBuilder::build).
    ///
    /// Every channel starts with `raw = Low` and no events.
    pub fn new(pins: [P; CHANNEL_COUNT], debounce: D) -> Self {
        Self {
            pins,
            states: [ChannelState::IDLE; CHANNEL_COUNT],
            debounce,
            debounce_in_progress: false,
            recorded: None,
            _source: PhantomData,
        }
    }

    /// Current level of `channel`.
    ///
    /// A read error counts as "not asserted": the idle level for the
    /// channel's polarity is returned.
    fn sample(&mut self, channel: InputChannel) -> PinState {
        let idle = match channel.polarity() {
            Polarity::ActiveHigh => PinState::Low,
            Polarity::ActiveLow => PinState::High,
        };
        let Some(pin) = self.pins.get_mut(channel.index()) else {
            return idle;
        };
        match pin.is_high() {
            Ok(high) => PinState::from(high),
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("input: read of {} failed", channel.name());
                idle
            }
        }
    }

    fn state_mut(&mut self, channel: InputChannel) -> Option<&mut ChannelState> {
        self.states.get_mut(channel.index())
    }

    fn state(&self, channel: InputChannel) -> ChannelState {
        self.states
            .get(channel.index())
            .copied()
            .unwrap_or(ChannelState::IDLE)
    }

    /// Start confirming an edge on `channel`.
    ///
    /// Busy-wait: blocks for the debounce window, then sets `confirmed` if
    /// the line is still asserted. Timer: records the channel, sets the
    /// latch and arms the one-shot timer, then returns immediately. Ignored
    /// while a timer debounce is already in flight.
    pub fn begin_debounce(&mut self, channel: InputChannel) {
        if self.debounce_in_progress {
            return;
        }
        let polarity = channel.polarity();
        let outcome = match self.pins.get_mut(channel.index()) {
            Some(pin) => self.debounce.begin(pin, polarity),
            None => DebounceOutcome::Rejected,
        };
        match outcome {
            DebounceOutcome::Confirmed => {
                #[cfg(feature = "defmt")]
                defmt::debug!("input: {} confirmed", channel.name());
                if let Some(state) = self.state_mut(channel) {
                    state.confirmed = true;
                }
            }
            DebounceOutcome::Armed => {
                self.recorded = Some(channel);
                self.debounce_in_progress = true;
            }
            DebounceOutcome::Rejected => {}
        }
    }

    /// Copy every pending event to confirmed and clear pending.
    ///
    /// Main loop only.
    pub fn promote_pending_events(&mut self) {
        for state in &mut self.states {
            if state.pending {
                state.confirmed = true;
                state.pending = false;
            }
        }
    }

    /// Clear all confirmed flags so each event is seen once.
    pub fn reset_confirmed_events(&mut self) {
        for state in &mut self.states {
            state.confirmed = false;
        }
    }

    /// `true` if `channel` has a confirmed event.
    pub fn is_confirmed(&self, channel: InputChannel) -> bool {
        self.state(channel).confirmed
    }

    /// `true` if `channel` has a pending (not yet promoted) event.
    pub fn is_pending(&self, channel: InputChannel) -> bool {
        self.state(channel).pending
    }

    /// Channels with a confirmed event, in channel order.
    pub fn confirmed_channels(&self) -> impl Iterator<Item = InputChannel> + '_ {
        InputChannel::ALL
            .into_iter()
            .filter(move |ch| self.is_confirmed(*ch))
    }

    /// Debounce strategy (e.g. to read the configured window).
    pub fn debounce(&self) -> &D {
        &self.debounce
    }

    /// Full state of `channel`.
    pub fn channel_state(&self, channel: InputChannel) -> ChannelState {
        self.state(channel)
    }

    /// `true` while a timer debounce is in flight.
    pub fn debounce_in_progress(&self) -> bool {
        self.debounce_in_progress
    }

    /// Channel of the last armed debounce, cleared when it did not hold.
    pub fn recorded_channel(&self) -> Option<InputChannel> {
        self.recorded
    }

    /// Sample `channel`, begin a debounce on a qualifying edge and remember
    /// the level for the next call.
    fn poll_single(&mut self, channel: InputChannel) {
        let current = self.sample(channel);
        let previous = self.state(channel).raw;
        if channel.polarity().is_press_edge(previous, current) && !self.debounce_in_progress {
            self.begin_debounce(channel);
        }
        if let Some(state) = self.state_mut(channel) {
            state.raw = current;
        }
    }
}

// ---------------------------------------------------------------------------
// Polling source
// ---------------------------------------------------------------------------

impl<P, D> InputEngine<P, PollingSource, D>
where
    P: InputPin,
    D: DebounceStrategy,
{
    /// Sample every channel once and react to the first qualifying edge.
    ///
    /// Channels are checked in [`InputChannel::ALL`] order; only the first
    /// channel with an edge starts a debounce. All channels still record
    /// their new level. Does nothing while a debounce is in flight.
    pub fn poll_inputs(&mut self) {
        if self.debounce_in_progress {
            return;
        }
        let mut current = [PinState::Low; CHANNEL_COUNT];
        for (slot, channel) in current.iter_mut().zip(InputChannel::ALL) {
            *slot = self.sample(channel);
        }

        let edge = InputChannel::ALL
            .into_iter()
            .zip(current)
            .find(|(channel, level)| {
                channel
                    .polarity()
                    .is_press_edge(self.state(*channel).raw, *level)
            })
            .map(|(channel, _)| channel);

        if let Some(channel) = edge {
            self.begin_debounce(channel);
        }

        for (state, level) in self.states.iter_mut().zip(current) {
            state.raw = level;
        }
    }
}

// ---------------------------------------------------------------------------
// Timer debounce
// ---------------------------------------------------------------------------

impl<P, S, T> InputEngine<P, S, TimerDebounce<T>>
where
    P: InputPin,
    T: OneShotTimer,
{
    /// Debounce timer elapsed: resample the recorded channel.
    ///
    /// Still asserted → `pending`. Otherwise the recorded channel is
    /// cleared. The latch is always released and the timer stopped.
    pub fn on_debounce_timer_expired(&mut self) {
        if let Some(channel) = self.recorded {
            let level = self.sample(channel);
            if channel.polarity().is_asserted(level) {
                #[cfg(feature = "defmt")]
                defmt::debug!("input: {} pending", channel.name());
                if let Some(state) = self.state_mut(channel) {
                    state.pending = true;
                }
            } else {
                self.recorded = None;
            }
        }
        self.debounce_in_progress = false;
        self.debounce.cancel();
    }
}

// ---------------------------------------------------------------------------
// Interrupt source
// ---------------------------------------------------------------------------

impl<P, T> InputEngine<P, InterruptSource, TimerDebounce<T>>
where
    P: InputPin,
    T: OneShotTimer,
{
    /// Edge on EXTI `line`.
    ///
    /// Unknown lines and edges during a debounce are ignored. Line 5 is
    /// shared by `Left` and `Right` and always resolves to `Right`.
    pub fn handle_interrupt(&mut self, line: u8) {
        if self.debounce_in_progress {
            return;
        }
        if let Some(channel) = InputChannel::from_interrupt_line(line) {
            self.begin_debounce(channel);
        }
    }

    /// Polled edge detection for `Left`, which has no usable interrupt.
    ///
    /// Call once per main loop iteration.
    pub fn poll_left_channel(&mut self) {
        self.poll_single(InputChannel::Left);
    }
}
