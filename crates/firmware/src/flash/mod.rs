//! External NOR flash
//!
//! [`W25qxx`] drives a Winbond W25Q part through [`platform::QspiBus`].
//! Writes of any length are split so that no page program crosses a
//! 256-byte page boundary.

pub mod commands;
mod w25qxx;

pub use w25qxx::{DeviceId, W25qxx, DEFAULT_BUSY_POLLS};

/// Errors returned by the flash driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// QUADSPI transfer failed.
    Communication,
    /// BUSY stayed set past the polling limit.
    Timeout,
    /// Page program longer than a page or crossing a page boundary.
    InvalidLength,
    /// Address range extends past the end of the device.
    OutOfRange,
}

impl core::fmt::Display for FlashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "QSPI communication error"),
            Self::Timeout => write!(f, "flash busy timeout"),
            Self::InvalidLength => write!(f, "page program crosses a page boundary"),
            Self::OutOfRange => write!(f, "address outside the flash array"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FlashError {}
