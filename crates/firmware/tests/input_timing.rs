//! Input timing tests: a pulse on one channel, simulated millisecond by
//! millisecond, against the 50 ms debounce window in every source/strategy
//! combination.
//!
//! The press starts at `PRESS_AT_MS`, after a few idle samples. A pulse of
//! `d` ms keeps the line asserted for every sample taken up to and including
//! `PRESS_AT_MS + d`.
//!
//! Run with: cargo test -p mds-firmware --test input_timing

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use firmware::input::InputBuilder;
use platform::config::DEBOUNCE_MS;
use platform::mocks::{MockInputPin, MockOneShotTimer};
use platform::{InputChannel, Polarity, CHANNEL_COUNT};

const PULSES_MS: [u32; 6] = [10, 30, 49, 50, 51, 100];
const SIM_END_MS: u32 = 200;
const PRESS_AT_MS: u32 = 5;

fn idle_level(channel: InputChannel) -> bool {
    channel.polarity() == Polarity::ActiveLow
}

/// Level of `channel` at `t` for a pulse of `d` ms.
fn level(channel: InputChannel, d: u32, t: u32) -> bool {
    let asserted = t >= PRESS_AT_MS && t - PRESS_AT_MS <= d;
    asserted != idle_level(channel)
}

fn idle_pins() -> [MockInputPin; CHANNEL_COUNT] {
    core::array::from_fn(|i| {
        let channel = InputChannel::from_index(i).unwrap();
        MockInputPin::new(idle_level(channel))
    })
}

/// Delay that advances a simulated clock and replays the pulse on the pin.
struct PulseDelay {
    now: Rc<Cell<u32>>,
    pin: MockInputPin,
    channel: InputChannel,
    pulse_ms: u32,
}

impl DelayNs for PulseDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        let t = self.now.get() + ms;
        self.now.set(t);
        self.pin.drive(level(self.channel, self.pulse_ms, t));
    }
}

/// Interrupt source + timer debounce. Returns how often the channel was
/// seen confirmed by the main loop.
fn interrupt_timer(channel: InputChannel, pulse_ms: u32) -> u32 {
    let pins = idle_pins();
    let handle = pins[channel.index()].clone();
    let timer = MockOneShotTimer::new();
    let mut engine = InputBuilder::interrupt().timer(timer.clone()).build(pins);
    let line = channel.pin().exti_line();

    let mut armed_at = None;
    let mut confirmations = 0;
    for t in 0..=SIM_END_MS {
        handle.drive(level(channel, pulse_ms, t));
        if t == PRESS_AT_MS {
            engine.handle_interrupt(line);
            armed_at = timer.is_running().then_some(t);
        }
        if armed_at.is_some_and(|start| t == start + DEBOUNCE_MS) {
            engine.on_debounce_timer_expired();
            armed_at = None;
        }
        engine.promote_pending_events();
        if engine.is_confirmed(channel) {
            confirmations += 1;
        }
        engine.reset_confirmed_events();
    }
    confirmations
}

/// Polling source + timer debounce.
fn polling_timer(channel: InputChannel, pulse_ms: u32) -> u32 {
    let pins = idle_pins();
    let handle = pins[channel.index()].clone();
    let timer = MockOneShotTimer::new();
    let mut engine = InputBuilder::polling().timer(timer.clone()).build(pins);

    let mut armed_at = None;
    let mut confirmations = 0;
    for t in 0..=SIM_END_MS {
        handle.drive(level(channel, pulse_ms, t));
        if armed_at.is_some_and(|start| t == start + DEBOUNCE_MS) {
            engine.on_debounce_timer_expired();
            armed_at = None;
        }
        engine.poll_inputs();
        if armed_at.is_none() && timer.is_running() {
            armed_at = Some(t);
        }
        engine.promote_pending_events();
        if engine.is_confirmed(channel) {
            confirmations += 1;
        }
        engine.reset_confirmed_events();
    }
    confirmations
}

/// Polling source + busy-wait debounce.
fn polling_busy_wait(channel: InputChannel, pulse_ms: u32) -> u32 {
    let pins = idle_pins();
    let handle = pins[channel.index()].clone();
    let now = Rc::new(Cell::new(0));
    let delay = PulseDelay {
        now: Rc::clone(&now),
        pin: handle.clone(),
        channel,
        pulse_ms,
    };
    let mut engine = InputBuilder::polling().busy_wait(delay).build(pins);

    let mut confirmations = 0;
    while now.get() <= SIM_END_MS {
        handle.drive(level(channel, pulse_ms, now.get()));
        engine.poll_inputs();
        if engine.is_confirmed(channel) {
            confirmations += 1;
        }
        engine.reset_confirmed_events();
        now.set(now.get() + 1);
    }
    confirmations
}

fn expected(pulse_ms: u32) -> u32 {
    u32::from(pulse_ms >= DEBOUNCE_MS)
}

#[test]
fn interrupt_mode_confirms_only_pulses_of_at_least_the_window() {
    for channel in InputChannel::ALL.into_iter().filter(|c| c.is_interrupt_routed()) {
        for pulse in PULSES_MS {
            assert_eq!(
                interrupt_timer(channel, pulse),
                expected(pulse),
                "{} with a {pulse} ms pulse",
                channel.name()
            );
        }
    }
}

#[test]
fn polling_with_timer_confirms_only_pulses_of_at_least_the_window() {
    for channel in InputChannel::ALL {
        for pulse in PULSES_MS {
            assert_eq!(
                polling_timer(channel, pulse),
                expected(pulse),
                "{} with a {pulse} ms pulse",
                channel.name()
            );
        }
    }
}

#[test]
fn polling_with_busy_wait_confirms_only_pulses_of_at_least_the_window() {
    for channel in InputChannel::ALL {
        for pulse in PULSES_MS {
            assert_eq!(
                polling_busy_wait(channel, pulse),
                expected(pulse),
                "{} with a {pulse} ms pulse",
                channel.name()
            );
        }
    }
}

#[test]
fn held_press_confirms_exactly_once() {
    assert_eq!(interrupt_timer(InputChannel::Up, SIM_END_MS), 1);
    assert_eq!(polling_timer(InputChannel::UserButton, SIM_END_MS), 1);
    assert_eq!(polling_busy_wait(InputChannel::Left, SIM_END_MS), 1);
}
