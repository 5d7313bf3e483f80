//! Green/yellow/red status LEDs (PD3, PD4, PD5)

use embedded_hal::digital::{OutputPin, PinState, StatefulOutputPin};

/// One of the three board LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    /// Heartbeat
    Green,
    /// Input activity
    Yellow,
    /// Errors
    Red,
}

impl Led {
    /// All LEDs in pin order.
    pub const ALL: [Self; 3] = [Self::Green, Self::Yellow, Self::Red];
}

/// The three status LEDs, active-high.
pub struct StatusLeds<P> {
    green: P,
    yellow: P,
    red: P,
}

impl<P: StatefulOutputPin> StatusLeds<P> {
    /// Take ownership of the three pins.
    pub fn new(green: P, yellow: P, red: P) -> Self {
        Self { green, yellow, red }
    }

    fn pin(&mut self, led: Led) -> &mut P {
        match led {
            Led::Green => &mut self.green,
            Led::Yellow => &mut self.yellow,
            Led::Red => &mut self.red,
        }
    }

    /// Switch `led` on or off.
    pub fn set(&mut self, led: Led, on: bool) -> Result<(), P::Error> {
        self.pin(led).set_state(PinState::from(on))
    }

    /// Invert `led`.
    pub fn toggle(&mut self, led: Led) -> Result<(), P::Error> {
        self.pin(led).toggle()
    }

    /// Whether `led` is currently driven on.
    pub fn is_on(&mut self, led: Led) -> Result<bool, P::Error> {
        self.pin(led).is_set_high()
    }

    /// Switch every LED off.
    pub fn all_off(&mut self) -> Result<(), P::Error> {
        Led::ALL.into_iter().try_for_each(|led| self.set(led, false))
    }
}
