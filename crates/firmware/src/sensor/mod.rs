//! Environmental sensors

pub mod aht20;

pub use aht20::{Aht20, Measurement, AHT20_ADDRESS};

/// Errors returned by the sensor drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I2C transfer failed.
    Communication,
    /// The sensor stayed busy past the polling limit.
    Timeout,
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "I2C communication error"),
            Self::Timeout => write!(f, "sensor busy timeout"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SensorError {}
