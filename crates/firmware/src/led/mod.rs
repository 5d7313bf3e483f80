//! LED outputs
//!
//! - [`Ws2812`]: one addressable RGB LED on a DMA-fed PWM channel
//! - [`Max7219`]: 8×8 LED matrix on SPI
//! - [`StatusLeds`]: the three board LEDs

pub mod max7219;
pub mod status;
pub mod ws2812;

pub use max7219::{Max7219, MatrixError, Mode as MatrixMode};
pub use status::{Led, StatusLeds};
pub use ws2812::{Ws2812, Ws2812Error};
