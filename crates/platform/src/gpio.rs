//! GPIO pin identity and signal polarity
//!
//! A [`Pin`] names one digital line on the board (port + number). It carries
//! no mode and no handle: drivers receive their embedded-hal pin objects at
//! construction, and `Pin` values only describe *which* line a component is
//! wired to (channel tables, EXTI routing, logging).

/// GPIO port letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// GPIOA
    A,
    /// GPIOB
    B,
    /// GPIOC
    C,
    /// GPIOD
    D,
    /// GPIOE
    E,
    /// GPIOF
    F,
    /// GPIOG
    G,
    /// GPIOH
    H,
}

impl Port {
    /// Port letter as a `char` (for log output).
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::H => 'H',
        }
    }
}

/// One digital I/O line: `{port, number}`.
///
/// Immutable and `Copy`; board wiring is declared as `const` values of this
/// type (see [`crate::config::pins`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    port: Port,
    number: u8,
}

impl Pin {
    /// Highest pin number on an STM32 GPIO port.
    pub const MAX_NUMBER: u8 = 15;

    /// Create a pin. Numbers above 15 are clamped to 15.
    pub const fn new(port: Port, number: u8) -> Self {
        let number = if number > Self::MAX_NUMBER {
            Self::MAX_NUMBER
        } else {
            number
        };
        Self { port, number }
    }

    /// Port of this pin.
    pub const fn port(self) -> Port {
        self.port
    }

    /// Pin number within the port (0..=15).
    pub const fn number(self) -> u8 {
        self.number
    }

    /// EXTI line this pin triggers. On STM32 the line equals the pin
    /// number, so `PE5` and `PB5` share line 5.
    pub const fn exti_line(self) -> u8 {
        self.number
    }

    /// Single-bit mask as used by the GPIO BSRR/IDR registers.
    pub const fn mask(self) -> u16 {
        match 1u16.checked_shl(self.number as u32) {
            Some(mask) => mask,
            None => 0,
        }
    }
}

/// Pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    /// High (logic 1)
    High,
    /// Low (logic 0)
    Low,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl From<PinState> for bool {
    fn from(value: PinState) -> Self {
        matches!(value, PinState::High)
    }
}

/// External interrupt configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    /// Trigger on rising edge
    RisingEdge,
    /// Trigger on falling edge
    FallingEdge,
    /// Trigger on both edges
    BothEdges,
}

/// Which level means "pressed" for an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Pressed = high. Qualifying edge is rising.
    ActiveHigh,
    /// Pressed = low (pull-up to idle). Qualifying edge is falling.
    ActiveLow,
}

impl Polarity {
    /// `true` if `level` is the pressed level for this polarity.
    pub fn is_asserted(self, level: PinState) -> bool {
        match self {
            Self::ActiveHigh => level == PinState::High,
            Self::ActiveLow => level == PinState::Low,
        }
    }

    /// `true` if going from `previous` to `current` is the qualifying edge.
    pub fn is_press_edge(self, previous: PinState, current: PinState) -> bool {
        !self.is_asserted(previous) && self.is_asserted(current)
    }

    /// Edge the EXTI line must be configured for.
    pub const fn interrupt_mode(self) -> InterruptMode {
        match self {
            Self::ActiveHigh => InterruptMode::RisingEdge,
            Self::ActiveLow => InterruptMode::FallingEdge,
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn level() -> impl Strategy<Value = PinState> {
        any::<bool>().prop_map(PinState::from)
    }

    fn polarity() -> impl Strategy<Value = Polarity> {
        prop_oneof![Just(Polarity::ActiveHigh), Just(Polarity::ActiveLow)]
    }

    proptest! {
        #[test]
        fn press_edge_leaves_idle_for_pressed(
            p in polarity(),
            previous in level(),
            current in level(),
        ) {
            let edge = p.is_press_edge(previous, current);
            prop_assert_eq!(edge, !p.is_asserted(previous) && p.is_asserted(current));
            if edge {
                prop_assert_ne!(previous, current);
            }
        }

        #[test]
        fn any_number_maps_to_one_line_bit(number in any::<u8>()) {
            let pin = Pin::new(Port::D, number);
            prop_assert!(pin.number() <= Pin::MAX_NUMBER);
            prop_assert_eq!(pin.exti_line(), pin.number());
            prop_assert_eq!(pin.mask(), 1u16 << pin.number());
        }
    }

    #[test]
    fn pins_on_different_ports_share_exti_line() {
        let left = Pin::new(Port::E, 5);
        let right = Pin::new(Port::B, 5);
        assert_ne!(left, right);
        assert_eq!(left.exti_line(), right.exti_line());
    }

    #[test]
    fn pin_number_is_clamped() {
        assert_eq!(Pin::new(Port::A, 42).number(), 15);
        assert_eq!(Pin::new(Port::C, 13).mask(), 0x2000);
    }

    #[test]
    fn active_high_edge_is_rising() {
        let p = Polarity::ActiveHigh;
        assert!(p.is_press_edge(PinState::Low, PinState::High));
        assert!(!p.is_press_edge(PinState::High, PinState::Low));
        assert!(!p.is_press_edge(PinState::High, PinState::High));
        assert_eq!(p.interrupt_mode(), InterruptMode::RisingEdge);
    }

    #[test]
    fn active_low_edge_is_falling() {
        let p = Polarity::ActiveLow;
        assert!(p.is_press_edge(PinState::High, PinState::Low));
        assert!(!p.is_press_edge(PinState::Low, PinState::High));
        assert!(p.is_asserted(PinState::Low));
        assert_eq!(p.interrupt_mode(), InterruptMode::FallingEdge);
    }
}
