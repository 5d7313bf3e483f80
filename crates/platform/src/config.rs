//! Board configuration and constants
//!
//! Central place for timing values and the pin map of the demo board
//! (STM32H743ZI Nucleo + joystick shield + peripheral breakouts). Drivers and
//! the input engine reference these constants rather than hardcoding values.

/// Board name shown in the boot log.
pub const BOARD_NAME: &str = "MDS Peripheral Board";

/// Firmware version (synchronized with Cargo.toml)
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Debounce confirmation delay in milliseconds.
pub const DEBOUNCE_MS: u32 = 50;

/// Period of the real-time tick in milliseconds.
pub const TICK_MS: u32 = 1;

/// Heartbeat LED toggle period in milliseconds.
pub const HEARTBEAT_MS: u32 = 1000;

/// Minimum interval between climate sensor reads in milliseconds.
pub const SENSOR_REFRESH_MS: u32 = 1000;

/// Board pin map.
///
/// Only lines that are referenced by value (input channels, status LEDs,
/// chip selects) are listed. Bus pins (SPI SCK/MOSI, I2C SCL/SDA, QUADSPI
/// IOs) are fixed by the peripheral instance and wired in `main.rs`.
pub mod pins {
    use crate::gpio::{Pin, Port};

    /// Joystick left (EXTI line 5, shared with `RIGHT`)
    pub const LEFT: Pin = Pin::new(Port::E, 5);
    /// Joystick right
    pub const RIGHT: Pin = Pin::new(Port::B, 5);
    /// Joystick up
    pub const UP: Pin = Pin::new(Port::E, 15);
    /// Joystick down
    pub const DOWN: Pin = Pin::new(Port::E, 10);
    /// Joystick centre push
    pub const JOYSTICK_BUTTON: Pin = Pin::new(Port::D, 14);
    /// Nucleo blue user button (active-low)
    pub const USER_BUTTON: Pin = Pin::new(Port::C, 13);

    /// Heartbeat LED
    pub const LED_GREEN: Pin = Pin::new(Port::D, 3);
    /// Status LED
    pub const LED_YELLOW: Pin = Pin::new(Port::D, 4);
    /// Error LED
    pub const LED_RED: Pin = Pin::new(Port::D, 5);

    /// ILI9341 chip select
    pub const TFT_CS: Pin = Pin::new(Port::D, 8);
    /// ILI9341 data/command select
    pub const TFT_DC: Pin = Pin::new(Port::D, 10);
    /// ILI9341 reset
    pub const TFT_RST: Pin = Pin::new(Port::D, 9);

    /// MAX7219 chip select (LOAD)
    pub const MATRIX_CS: Pin = Pin::new(Port::D, 6);
}
