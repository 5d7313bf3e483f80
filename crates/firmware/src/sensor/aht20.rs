//! AHT20 temperature/humidity sensor over I2C
//!
//! Datasheet: AHT20, Aosong, 2020-04 (§5.4 measurement flow)

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::SensorError;

/// 7-bit I2C address.
pub const AHT20_ADDRESS: u8 = 0x38;

const REG_STATUS: u8 = 0x71;
const CMD_INITIALISE: [u8; 3] = [0xBE, 0x08, 0x00];
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];

const STATUS_CALIBRATED: u8 = 1 << 3;
const STATUS_BUSY: u8 = 1 << 7;

const CALIBRATION_MS: u32 = 10;
const MEASUREMENT_MS: u32 = 80;
const POLL_MS: u32 = 1;
/// 2^20: full scale of the 20-bit readings.
const FULL_SCALE: f32 = 1_048_576.0;

/// Status polls after the measurement delay before giving up.
pub const MAX_BUSY_POLLS: u32 = 100;

/// One temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_percent: f32,
}

/// Convert a raw 6-byte measurement frame (status + 5 data bytes).
///
/// Humidity is the 20 bits after the status byte, temperature the next 20;
/// both are full-scale fractions of 2^20.
#[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)] // 20-bit values
pub fn decode(frame: &[u8; 6]) -> Measurement {
    let [_, b1, b2, b3, b4, b5] = frame.map(u32::from);
    let h20 = (b1 << 12) | (b2 << 4) | (b3 >> 4);
    let t20 = ((b3 & 0x0F) << 16) | (b4 << 8) | b5;
    Measurement {
        temperature_c: t20 as f32 / FULL_SCALE * 200.0 - 50.0,
        humidity_percent: h20 as f32 / FULL_SCALE * 100.0,
    }
}

/// AHT20 driver.
pub struct Aht20<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Aht20<I2C, D> {
    /// Wrap the bus and a delay source.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Release the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Read the status byte.
    pub fn status(&mut self) -> Result<u8, SensorError> {
        let mut status = [0u8];
        self.i2c
            .write_read(AHT20_ADDRESS, &[REG_STATUS], &mut status)
            .map_err(|_| SensorError::Communication)?;
        let [byte] = status;
        Ok(byte)
    }

    /// Calibrate if the sensor reports it is not, then take one sample.
    ///
    /// Blocks for at least 80 ms.
    pub fn read(&mut self) -> Result<Measurement, SensorError> {
        if self.status()? & STATUS_CALIBRATED == 0 {
            #[cfg(feature = "defmt")]
            defmt::debug!("AHT20: calibrating");
            self.write(&CMD_INITIALISE)?;
            self.delay.delay_ms(CALIBRATION_MS);
        }

        self.write(&CMD_TRIGGER)?;
        self.delay.delay_ms(MEASUREMENT_MS);
        self.wait_ready()?;

        let mut frame = [0u8; 6];
        self.i2c
            .read(AHT20_ADDRESS, &mut frame)
            .map_err(|_| SensorError::Communication)?;
        Ok(decode(&frame))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SensorError> {
        self.i2c
            .write(AHT20_ADDRESS, bytes)
            .map_err(|_| SensorError::Communication)
    }

    fn wait_ready(&mut self) -> Result<(), SensorError> {
        for _ in 0..MAX_BUSY_POLLS {
            let status = self.status()?;
            self.delay.delay_ms(POLL_MS);
            if status & STATUS_BUSY == 0 {
                return Ok(());
            }
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("AHT20: still busy after {=u32} polls", MAX_BUSY_POLLS);
        Err(SensorError::Timeout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    fn status(byte: u8) -> Transaction {
        Transaction::write_read(AHT20_ADDRESS, vec![REG_STATUS], vec![byte])
    }

    fn trigger() -> Transaction {
        Transaction::write(AHT20_ADDRESS, CMD_TRIGGER.to_vec())
    }

    #[test]
    fn decode_midscale() {
        // h20 = 0x80000, t20 = 0x80000: half of full scale for both.
        let m = decode(&[0x1C, 0x80, 0x00, 0x08, 0x00, 0x00]);
        assert!((m.humidity_percent - 50.0).abs() < 1e-3, "{m:?}");
        assert!((m.temperature_c - 50.0).abs() < 1e-3, "{m:?}");

        let zero = decode(&[0; 6]);
        assert_eq!(zero.humidity_percent, 0.0);
        assert_eq!(zero.temperature_c, -50.0);
    }

    #[test]
    fn calibrated_sensor_skips_initialisation() {
        let expectations = [
            status(STATUS_CALIBRATED),
            trigger(),
            status(STATUS_CALIBRATED | STATUS_BUSY),
            status(STATUS_CALIBRATED),
            Transaction::read(AHT20_ADDRESS, vec![0x1C, 0x80, 0x00, 0x08, 0x00, 0x00]),
        ];
        let mut sensor = Aht20::new(I2cMock::new(&expectations), NoopDelay::new());
        let m = sensor.read().unwrap();
        assert!((m.temperature_c - 50.0).abs() < 1e-3);
        sensor.release().0.done();
    }

    #[test]
    fn uncalibrated_sensor_is_initialised_first() {
        let expectations = [
            status(0x00),
            Transaction::write(AHT20_ADDRESS, CMD_INITIALISE.to_vec()),
            trigger(),
            status(STATUS_CALIBRATED),
            Transaction::read(AHT20_ADDRESS, vec![0; 6]),
        ];
        let mut sensor = Aht20::new(I2cMock::new(&expectations), NoopDelay::new());
        sensor.read().unwrap();
        sensor.release().0.done();
    }

    #[test]
    fn stuck_busy_flag_times_out() {
        let mut expectations = vec![status(STATUS_CALIBRATED), trigger()];
        expectations.extend((0..MAX_BUSY_POLLS).map(|_| status(STATUS_BUSY)));
        let mut sensor = Aht20::new(I2cMock::new(&expectations), NoopDelay::new());
        assert_eq!(sensor.read(), Err(SensorError::Timeout));
        sensor.release().0.done();
    }

    #[test]
    fn bus_error_is_mapped() {
        let expectations = [
            status(STATUS_CALIBRATED),
            trigger().with_error(ErrorKind::Other),
        ];
        let mut sensor = Aht20::new(I2cMock::new(&expectations), NoopDelay::new());
        assert_eq!(sensor.read(), Err(SensorError::Communication));
        sensor.release().0.done();
    }
}
