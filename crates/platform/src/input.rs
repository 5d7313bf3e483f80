//! Logical input channels and their board wiring
//!
//! Six channels feed the debounce engine. Each is bound to one [`Pin`] and a
//! [`Polarity`]. The EXTI routing table is kept here too, including the one
//! wiring exception of this board:
//!
//! | Channel          | Pin   | Polarity    | EXTI line            |
//! |------------------|-------|-------------|----------------------|
//! | `Left`           | PE5   | active-high | 5 (shared, not used) |
//! | `Right`          | PB5   | active-high | 5                    |
//! | `Up`             | PE15  | active-high | 15                   |
//! | `Down`           | PE10  | active-high | 10                   |
//! | `JoystickButton` | PD14  | active-high | 14                   |
//! | `UserButton`     | PC13  | active-low  | 13                   |
//!
//! `Left` and `Right` sit on the same EXTI line, so an edge on line 5 cannot
//! tell them apart. Line 5 is routed to `Right`; `Left` is excluded from
//! interrupt dispatch and polled every loop iteration instead.

use crate::config::pins;
use crate::gpio::{Pin, Polarity};

/// Number of logical input channels.
pub const CHANNEL_COUNT: usize = 6;

/// One logical input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputChannel {
    /// Joystick left
    Left,
    /// Joystick right
    Right,
    /// Joystick up
    Up,
    /// Joystick down
    Down,
    /// Joystick centre push
    JoystickButton,
    /// Blue user button on the MCU board
    UserButton,
}

impl InputChannel {
    /// All channels in table order. Polling walks this order.
    pub const ALL: [Self; CHANNEL_COUNT] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::JoystickButton,
        Self::UserButton,
    ];

    /// Index into per-channel tables.
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Up => 2,
            Self::Down => 3,
            Self::JoystickButton => 4,
            Self::UserButton => 5,
        }
    }

    /// Inverse of [`index`](Self::index).
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            2 => Some(Self::Up),
            3 => Some(Self::Down),
            4 => Some(Self::JoystickButton),
            5 => Some(Self::UserButton),
            _ => None,
        }
    }

    /// Board pin this channel is wired to.
    pub const fn pin(self) -> Pin {
        match self {
            Self::Left => pins::LEFT,
            Self::Right => pins::RIGHT,
            Self::Up => pins::UP,
            Self::Down => pins::DOWN,
            Self::JoystickButton => pins::JOYSTICK_BUTTON,
            Self::UserButton => pins::USER_BUTTON,
        }
    }

    /// Pressed level convention for this channel.
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::UserButton => Polarity::ActiveLow,
            _ => Polarity::ActiveHigh,
        }
    }

    /// Short name for log output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::JoystickButton => "joystick-button",
            Self::UserButton => "user-button",
        }
    }

    /// Channel that an edge on EXTI `line` is dispatched to.
    ///
    /// Returns `None` for lines with no input attached. `Left` is never
    /// returned: its line is shared with `Right` (see module docs).
    pub const fn from_interrupt_line(line: u8) -> Option<Self> {
        match line {
            15 => Some(Self::Up),
            14 => Some(Self::JoystickButton),
            5 => Some(Self::Right),
            10 => Some(Self::Down),
            13 => Some(Self::UserButton),
            _ => None,
        }
    }

    /// `true` if this channel is reachable through interrupt dispatch.
    pub const fn is_interrupt_routed(self) -> bool {
        !matches!(self, Self::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_every_channel() {
        for (i, ch) in InputChannel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
            assert_eq!(InputChannel::from_index(i), Some(*ch));
        }
        assert_eq!(InputChannel::from_index(CHANNEL_COUNT), None);
    }

    #[test]
    fn only_user_button_is_active_low() {
        for ch in InputChannel::ALL {
            let expected = if ch == InputChannel::UserButton {
                Polarity::ActiveLow
            } else {
                Polarity::ActiveHigh
            };
            assert_eq!(ch.polarity(), expected, "{}", ch.name());
        }
    }

    #[test]
    fn shared_line_routes_to_right_never_left() {
        assert_eq!(
            InputChannel::Left.pin().exti_line(),
            InputChannel::Right.pin().exti_line(),
            "left and right must share an EXTI line on this board"
        );
        assert_eq!(InputChannel::from_interrupt_line(5), Some(InputChannel::Right));
        for line in 0..=15 {
            assert_ne!(InputChannel::from_interrupt_line(line), Some(InputChannel::Left));
        }
        assert!(!InputChannel::Left.is_interrupt_routed());
    }

    #[test]
    fn every_routed_channel_is_found_on_its_own_pin_line() {
        for ch in InputChannel::ALL.into_iter().filter(|c| c.is_interrupt_routed()) {
            assert_eq!(
                InputChannel::from_interrupt_line(ch.pin().exti_line()),
                Some(ch),
                "{} must be dispatched from its own pin's line",
                ch.name()
            );
        }
    }

    #[test]
    fn unknown_lines_are_ignored() {
        assert_eq!(InputChannel::from_interrupt_line(0), None);
        assert_eq!(InputChannel::from_interrupt_line(200), None);
    }
}
