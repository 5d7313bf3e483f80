//! Demo application helpers
//!
//! Everything the board's main loop decides that does not touch a
//! peripheral: when to refresh the sensor, what to print on the OLED, what
//! to show for a confirmed input and which colour the WS2812 shows next.

use core::fmt::Write;

use heapless::String;
use platform::InputChannel;

use crate::sensor::Measurement;

/// Capacity of one OLED status line.
pub const LINE_CAPACITY: usize = 16;

/// One line of OLED text.
pub type Line = String<LINE_CAPACITY>;

/// Heart shown on the LED matrix and the OLED at start-up (MSB = left).
pub const HEART: [u8; 8] = [0x66, 0xFF, 0xFF, 0xFF, 0xFF, 0x7E, 0x3C, 0x18];

/// Title line on the OLED and the TFT.
pub const TITLE: &str = "Demo Programm";

/// Elapsed-time gate over a wrapping millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u32,
    last_ms: u32,
}

impl Interval {
    /// Gate that first opens `period_ms` after `start_ms`.
    pub const fn new(period_ms: u32, start_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: start_ms,
        }
    }

    /// `true` once at least one period has elapsed since the last time
    /// this returned `true`. Restarts the period from `now_ms`.
    pub fn is_due(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) >= self.period_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

/// The two OLED lines for a sensor reading: `"Temp: 23.4 C"`, `"Hum: 45.6 %"`.
///
/// Values that do not fit a line are cut off.
pub fn format_climate(m: &Measurement) -> (Line, Line) {
    let mut temperature = Line::new();
    let mut humidity = Line::new();
    // Overflow only truncates the line.
    let _ = write!(temperature, "Temp: {:.1} C", m.temperature_c);
    let _ = write!(humidity, "Hum: {:.1} %", m.humidity_percent);
    (temperature, humidity)
}

/// Header text on the TFT for a confirmed channel.
///
/// The user button clears the header without printing anything.
pub const fn event_label(channel: InputChannel) -> Option<&'static str> {
    match channel {
        InputChannel::Left => Some("LEFT"),
        InputChannel::Right => Some("RIGHT"),
        InputChannel::Up => Some("UP"),
        InputChannel::Down => Some("DOWN"),
        InputChannel::JoystickButton => Some("BUTTON"),
        InputChannel::UserButton => None,
    }
}

/// LED matrix picture for a confirmed channel.
pub const fn matrix_pattern(channel: InputChannel) -> [u8; 8] {
    match channel {
        InputChannel::Left => [0x10, 0x30, 0x70, 0xFF, 0xFF, 0x70, 0x30, 0x10],
        InputChannel::Right => [0x08, 0x0C, 0x0E, 0xFF, 0xFF, 0x0E, 0x0C, 0x08],
        InputChannel::Up => [0x18, 0x3C, 0x7E, 0xFF, 0x18, 0x18, 0x18, 0x18],
        InputChannel::Down => [0x18, 0x18, 0x18, 0x18, 0xFF, 0x7E, 0x3C, 0x18],
        InputChannel::JoystickButton => HEART,
        InputChannel::UserButton => [0; 8],
    }
}

/// The channel the main loop reacts to: the first confirmed one in
/// [`InputChannel::ALL`] order.
pub fn first_event(mut confirmed: impl Iterator<Item = InputChannel>) -> Option<InputChannel> {
    confirmed.next()
}

/// Offsets of the lit pixels of `pattern`, each cell drawn as a
/// `scale`×`scale` block.
pub fn pattern_pixels(pattern: &[u8; 8], scale: u8) -> impl Iterator<Item = (u8, u8)> + '_ {
    (0u8..8).zip(pattern.iter()).flat_map(move |(row, &bits)| {
        (0u8..8)
            .filter(move |&col| bits & 0x80u8.checked_shr(u32::from(col)).unwrap_or(0) != 0)
            .flat_map(move |col| {
                (0..scale).flat_map(move |dy| {
                    (0..scale).map(move |dx| {
                        (
                            col.saturating_mul(scale).saturating_add(dx),
                            row.saturating_mul(scale).saturating_add(dy),
                        )
                    })
                })
            })
    })
}

/// RGB on a 256-step colour wheel (red → green → blue → red).
#[allow(clippy::arithmetic_side_effects)] // each branch keeps `pos * 3` below 256
pub fn color_wheel(pos: u8) -> (u8, u8, u8) {
    match pos {
        0..=84 => (255 - pos * 3, pos * 3, 0),
        85..=169 => {
            let p = pos - 85;
            (0, 255 - p * 3, p * 3)
        }
        _ => {
            let p = pos - 170;
            (p * 3, 0, 255 - p * 3)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn interval_opens_once_per_period() {
        let mut gate = Interval::new(1000, 0);
        assert!(!gate.is_due(999));
        assert!(gate.is_due(1000));
        assert!(!gate.is_due(1500), "period restarts at the last refresh");
        assert!(gate.is_due(2300));
        assert!(!gate.is_due(3299));
    }

    #[test]
    fn interval_survives_clock_wrap() {
        let mut gate = Interval::new(1000, u32::MAX - 200);
        assert!(!gate.is_due(500));
        assert!(gate.is_due(800));
    }

    #[test]
    fn climate_lines_have_one_decimal() {
        let (t, h) = format_climate(&Measurement {
            temperature_c: 23.44,
            humidity_percent: 45.66,
        });
        assert_eq!(t.as_str(), "Temp: 23.4 C");
        assert_eq!(h.as_str(), "Hum: 45.7 %");

        let (t, _) = format_climate(&Measurement {
            temperature_c: -12.0,
            humidity_percent: 0.0,
        });
        assert_eq!(t.as_str(), "Temp: -12.0 C");
    }

    #[test]
    fn labels_and_patterns_cover_every_channel() {
        let labels: Vec<_> = InputChannel::ALL.iter().map(|&c| event_label(c)).collect();
        assert_eq!(
            labels,
            vec![Some("LEFT"), Some("RIGHT"), Some("UP"), Some("DOWN"), Some("BUTTON"), None]
        );
        assert_eq!(matrix_pattern(InputChannel::JoystickButton), HEART);
        assert_eq!(matrix_pattern(InputChannel::UserButton), [0; 8]);
    }

    #[test]
    fn first_confirmed_channel_wins() {
        let confirmed = [InputChannel::Up, InputChannel::UserButton];
        assert_eq!(first_event(confirmed.into_iter()), Some(InputChannel::Up));
        assert_eq!(first_event(core::iter::empty()), None);
    }

    #[test]
    fn heart_scales_to_two_by_two_blocks() {
        let lit: u32 = HEART.iter().map(|b| b.count_ones()).sum();
        let pixels: Vec<_> = pattern_pixels(&HEART, 2).collect();
        assert_eq!(pixels.len(), lit as usize * 4);
        assert!(pixels.contains(&(2, 0)) && pixels.contains(&(3, 1)), "cell (1,0) lit");
        assert!(!pixels.contains(&(0, 0)), "cell (0,0) dark");
        assert!(pixels.iter().all(|&(x, y)| x < 16 && y < 16));
    }

    #[test]
    fn color_wheel_is_continuous() {
        assert_eq!(color_wheel(0), (255, 0, 0));
        assert_eq!(color_wheel(85), (0, 255, 0));
        assert_eq!(color_wheel(170), (0, 0, 255));
        assert_eq!(color_wheel(255), (255, 0, 0));
    }
}
