//! Display drivers
//!
//! - [`Ili9341`]: 240×320 RGB565 TFT on SPI, written pixel-window by
//!   pixel-window with a bounded burst buffer.
//! - [`Ssd1306`]: 128×64 monochrome OLED on I2C with a local framebuffer.
//!
//! Both implement `embedded_graphics::DrawTarget`.

pub mod ili9341;
mod image;
mod shapes;
pub mod ssd1306;
mod text;

pub use ili9341::{Ili9341, Orientation, Rotation, BURST_MAX};
pub use image::{ImageError, MAX_ROW_BYTES};
pub use ssd1306::{Ssd1306, SSD1306_ADDRESS};

/// Common RGB565 colours.
pub mod color {
    #![allow(missing_docs)]
    pub const BLACK: u16 = 0x0000;
    pub const NAVY: u16 = 0x000F;
    pub const DARK_GREEN: u16 = 0x03E0;
    pub const DARK_CYAN: u16 = 0x03EF;
    pub const MAROON: u16 = 0x7800;
    pub const PURPLE: u16 = 0x780F;
    pub const OLIVE: u16 = 0x7BE0;
    pub const LIGHT_GREY: u16 = 0xC618;
    pub const DARK_GREY: u16 = 0x7BEF;
    pub const BLUE: u16 = 0x001F;
    pub const GREEN: u16 = 0x07E0;
    pub const CYAN: u16 = 0x07FF;
    pub const RED: u16 = 0xF800;
    pub const MAGENTA: u16 = 0xF81F;
    pub const YELLOW: u16 = 0xFFE0;
    pub const WHITE: u16 = 0xFFFF;
    pub const ORANGE: u16 = 0xFD20;
    pub const GREEN_YELLOW: u16 = 0xAFE5;
}

/// Pack 8-bit RGB into RGB565.
#[allow(clippy::arithmetic_side_effects)] // masked shifts stay inside 16 bits
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r = (r as u16 & 0xF8) << 8;
    let g = (g as u16 & 0xFC) << 3;
    let b = b as u16 >> 3;
    r | g | b
}

/// Errors returned by the display drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// SPI or I2C transfer failed.
    Communication,
    /// GPIO operation error.
    Gpio,
    /// Caller supplied a pixel buffer with the wrong number of bytes.
    InvalidBuffer,
    /// A glyph or window does not fit on the display.
    OutOfBounds,
    /// Character outside the font's printable range.
    UnsupportedCharacter,
}

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "bus communication error"),
            Self::Gpio => write!(f, "GPIO error"),
            Self::InvalidBuffer => write!(f, "invalid buffer size"),
            Self::OutOfBounds => write!(f, "outside the display area"),
            Self::UnsupportedCharacter => write!(f, "unsupported character"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DisplayError {}
