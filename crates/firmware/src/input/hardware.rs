//! Embassy wiring for the input engine on the STM32H743.
//!
//! # Pin assignments
//!
//! | Channel          | MCU pin | EXTI line | Notes                         |
//! |------------------|---------|-----------|-------------------------------|
//! | Left             | PE5     | (5)       | polled; line 5 belongs to PB5 |
//! | Right            | PB5     | 5         | rising edge                   |
//! | Up               | PE15    | 15        | rising edge                   |
//! | Down             | PE10    | 10        | rising edge                   |
//! | Joystick button  | PD14    | 14        | rising edge                   |
//! | User button      | PC13    | 13        | falling edge, active-low      |
//!
//! # Architecture
//!
//! The engine lives in [`INPUT`], a critical-section mutex shared by:
//!
//! - one EXTI task per routed line ([`spawn_input_tasks`]), calling
//!   [`InputEngine::handle_interrupt`] on every press edge;
//! - [`debounce_timer_task`], which turns [`SignalTimer`] commands into
//!   a one-shot Embassy timer and calls
//!   [`InputEngine::on_debounce_timer_expired`] when it elapses;
//! - the main loop, via [`with_input`].
//!
//! The EXTI tasks own the `ExtiInput` peripherals, so the engine reads
//! levels through [`IdrPin`] straight from the port's IDR register.

use core::cell::RefCell;
use core::convert::Infallible;

use embassy_executor::{SpawnError, Spawner};
use embassy_futures::select::{select, Either};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::AnyPin;
use embassy_stm32::pac;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embedded_hal::digital::{ErrorType, InputPin};

use platform::{InputChannel, OneShotTimer, Pin, Polarity, Port};

use super::debounce::TimerDebounce;
use super::engine::{InputEngine, InterruptSource};

/// Engine type used on the board.
pub type BoardInput = InputEngine<IdrPin, InterruptSource, TimerDebounce<SignalTimer>>;

/// Shared engine. `None` until [`install`] runs.
pub static INPUT: Mutex<CriticalSectionRawMutex, RefCell<Option<BoardInput>>> =
    Mutex::new(RefCell::new(None));

static DEBOUNCE_TIMER: Signal<CriticalSectionRawMutex, TimerCommand> = Signal::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerCommand {
    Start,
    Stop,
}

/// Move the engine into [`INPUT`].
pub fn install(engine: BoardInput) {
    INPUT.lock(|cell| {
        cell.replace(Some(engine));
    });
}

/// Run `f` on the shared engine. Returns `None` before [`install`].
pub fn with_input<R>(f: impl FnOnce(&mut BoardInput) -> R) -> Option<R> {
    INPUT.lock(|cell| cell.borrow_mut().as_mut().map(f))
}

// ---------------------------------------------------------------------------
// IdrPin
// ---------------------------------------------------------------------------

/// Read-only view of a GPIO line through its port's IDR.
///
/// The pin must already be configured as an input elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct IdrPin(Pin);

impl IdrPin {
    /// View of `pin`.
    pub const fn new(pin: Pin) -> Self {
        Self(pin)
    }

    /// View of the pin assigned to `channel`.
    pub fn for_channel(channel: InputChannel) -> Self {
        Self(channel.pin())
    }

    fn level(self) -> bool {
        let block = match self.0.port() {
            Port::A => pac::GPIOA,
            Port::B => pac::GPIOB,
            Port::C => pac::GPIOC,
            Port::D => pac::GPIOD,
            Port::E => pac::GPIOE,
            Port::F => pac::GPIOF,
            Port::G => pac::GPIOG,
            Port::H => pac::GPIOH,
        };
        block.idr().read().idr(usize::from(self.0.number())) == pac::gpio::vals::Idr::HIGH
    }
}

impl ErrorType for IdrPin {
    type Error = Infallible;
}

impl InputPin for IdrPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

/// One IDR view per channel, ordered as [`InputChannel::ALL`].
pub fn board_pins() -> [IdrPin; platform::CHANNEL_COUNT] {
    InputChannel::ALL.map(IdrPin::for_channel)
}

// ---------------------------------------------------------------------------
// Debounce timer
// ---------------------------------------------------------------------------

/// [`OneShotTimer`] backed by [`debounce_timer_task`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalTimer;

impl OneShotTimer for SignalTimer {
    type Error = Infallible;

    fn start(&mut self) -> Result<(), Self::Error> {
        DEBOUNCE_TIMER.signal(TimerCommand::Start);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        DEBOUNCE_TIMER.signal(TimerCommand::Stop);
        Ok(())
    }
}

/// One-shot timer of `window_ms`. A new `Start` while running restarts it.
#[embassy_executor::task]
pub async fn debounce_timer_task(window_ms: u32) {
    loop {
        let mut command = DEBOUNCE_TIMER.wait().await;
        while command == TimerCommand::Start {
            match select(
                Timer::after_millis(u64::from(window_ms)),
                DEBOUNCE_TIMER.wait(),
            )
            .await
            {
                Either::First(()) => {
                    with_input(BoardInput::on_debounce_timer_expired);
                    break;
                }
                Either::Second(next) => command = next,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EXTI tasks
// ---------------------------------------------------------------------------

#[embassy_executor::task(pool_size = 5)]
async fn exti_task(mut input: ExtiInput<'static, AnyPin>, channel: InputChannel) {
    let line = channel.pin().exti_line();
    loop {
        match channel.polarity() {
            Polarity::ActiveHigh => input.wait_for_rising_edge().await,
            Polarity::ActiveLow => input.wait_for_falling_edge().await,
        }
        with_input(|engine| engine.handle_interrupt(line));
    }
}

/// Spawn one EXTI task per routed channel plus the debounce timer task.
///
/// Call [`install`] first; edges arriving before it are dropped.
pub fn spawn_input_tasks(
    spawner: &Spawner,
    lines: [(ExtiInput<'static, AnyPin>, InputChannel); 5],
    window_ms: u32,
) -> Result<(), SpawnError> {
    spawner.spawn(debounce_timer_task(window_ms))?;
    for (input, channel) in lines {
        defmt::debug!(
            "input: EXTI{=u8} -> {}",
            channel.pin().exti_line(),
            channel.name()
        );
        spawner.spawn(exti_task(input, channel))?;
    }
    Ok(())
}
