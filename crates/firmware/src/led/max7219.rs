//! MAX7219 8×8 LED matrix driver
//!
//! Every register access is one 16-bit frame `[register, data]` clocked in
//! while LOAD (chip select) is low; the rising edge latches it. Keep the SPI
//! clock at or below 10 MHz.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

const REG_DIGIT0: u8 = 0x01;
const REG_DECODE_MODE: u8 = 0x09;
const REG_INTENSITY: u8 = 0x0A;
const REG_SCAN_LIMIT: u8 = 0x0B;
const REG_SHUTDOWN: u8 = 0x0C;

/// Rows (digit registers) on the matrix.
pub const ROWS: u8 = 8;
/// Highest intensity step.
pub const MAX_INTENSITY: u8 = 15;
/// Intensity applied by [`Max7219::setup`].
pub const DEFAULT_INTENSITY: u8 = 2;

/// Operating mode (shutdown register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Display blanked, registers retained
    Shutdown,
    /// Normal operation
    Normal,
}

/// Errors from [`Max7219`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatrixError {
    /// SPI transfer failed.
    Communication,
    /// Chip-select pin error.
    Gpio,
}

impl core::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "SPI communication error"),
            Self::Gpio => write!(f, "GPIO error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MatrixError {}

/// Pack one row of cells into a digit byte, column 0 in the MSB.
///
/// Any non-zero cell is lit.
pub fn pack_row(cells: &[u8; 8]) -> u8 {
    cells
        .iter()
        .fold(0u8, |acc, &c| acc.rotate_left(1) | u8::from(c != 0))
}

/// MAX7219 on a shared SPI bus with its own LOAD pin.
pub struct Max7219<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Max7219<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Wrap the bus and LOAD pin. Call [`setup`](Self::setup) before use.
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    fn frame(&mut self, bytes: &[u8]) -> Result<(), MatrixError> {
        self.cs.set_low().map_err(|_| MatrixError::Gpio)?;
        let written = self.spi.write(bytes);
        let flushed = self.spi.flush();
        self.cs.set_high().map_err(|_| MatrixError::Gpio)?;
        written
            .and(flushed)
            .map_err(|_| MatrixError::Communication)
    }

    /// Write `data` to `register`.
    pub fn send_command(&mut self, register: u8, data: u8) -> Result<(), MatrixError> {
        self.frame(&[register, data])
    }

    /// Bring the chip into a known state: blank, no decode, all rows
    /// scanned, low intensity, then cleared and running.
    pub fn setup(&mut self) -> Result<(), MatrixError> {
        // The first transfer after power-up is not reliably latched.
        self.frame(&[0x00])?;
        self.set_mode(Mode::Shutdown)?;
        self.send_command(REG_DECODE_MODE, 0x00)?;
        self.send_command(REG_SCAN_LIMIT, ROWS.saturating_sub(1))?;
        self.set_intensity(DEFAULT_INTENSITY)?;
        self.reset()
    }

    /// Select shutdown or normal operation.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), MatrixError> {
        self.send_command(REG_SHUTDOWN, u8::from(mode == Mode::Normal))
    }

    /// Set the PWM intensity, clamped to `0..=15`.
    pub fn set_intensity(&mut self, intensity: u8) -> Result<(), MatrixError> {
        self.send_command(REG_INTENSITY, intensity.min(MAX_INTENSITY))
    }

    /// Light row `row` with `bits` (MSB = column 0). Rows past 7 are ignored.
    pub fn draw_row(&mut self, row: u8, bits: u8) -> Result<(), MatrixError> {
        if row >= ROWS {
            return Ok(());
        }
        self.send_command(REG_DIGIT0.saturating_add(row), bits)
    }

    /// Draw a full 8×8 cell grid, `matrix[row][column]`.
    pub fn draw_matrix(&mut self, matrix: &[[u8; 8]; 8]) -> Result<(), MatrixError> {
        for (row, cells) in (0..ROWS).zip(matrix) {
            self.draw_row(row, pack_row(cells))?;
        }
        Ok(())
    }

    /// Clear every row and return to normal operation.
    pub fn reset(&mut self) -> Result<(), MatrixError> {
        for row in 0..ROWS {
            self.draw_row(row, 0)?;
        }
        self.set_mode(Mode::Normal)
    }
}
