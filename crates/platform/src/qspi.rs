//! QUADSPI command transport and W25Q128 geometry
//!
//! NOR flash on this board is driven in *indirect* mode: every operation is
//! one command phase sequence (instruction, optional address, optional dummy
//! cycles, optional data) described by a [`QspiCommand`]. The [`QspiBus`]
//! trait executes such a descriptor with no data, with a write payload, or
//! with a read buffer.
//!
//! # Hardware
//!
//! **Flash chip:** W25Q128JV (Winbond): 16 MB, 133 MHz max, 256-byte pages,
//! 4 KB sectors.
//!
//! Instruction and address phases are always single-line here; only the data
//! phase of Fast Read Quad Output (0x6B) uses four lines.

/// Page size in bytes. A page program never spans more than one page.
pub const PAGE_SIZE: u32 = 256;

/// Sector (smallest erase unit) size in bytes.
pub const SECTOR_SIZE: u32 = 4096;

/// Total capacity of the W25Q128JV in bytes.
pub const FLASH_CAPACITY: u32 = 0x0100_0000;

/// QUADSPI clock prescaler for target read frequency.
///
/// `QUADSPI_CLK = AHB_CLK / (QSPI_PRESCALER + 1)`
///
/// At AHB = 240 MHz: `prescaler = 1` → 120 MHz (within the 133 MHz limit).
pub const QSPI_PRESCALER: u8 = 1;

/// Flash size field for `QUADSPI_DCR.FSIZE`.
///
/// Addressable bytes = 2^(`FSIZE` + 1). 16 MB = 2^24 → `FSIZE = 23`.
pub const QSPI_FLASH_SIZE: u8 = 23;

/// W25Q128JV maximum operating frequency (Hz).
pub const QSPI_MAX_FREQ_HZ: u32 = 133_000_000;

/// Number of data lines used by a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QspiLines {
    /// Phase is skipped
    None,
    /// Single line (IO0 out / IO1 in)
    Single,
    /// Four lines (IO0..IO3)
    Quad,
}

/// Address phase width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressWidth {
    /// 8-bit address
    Bits8,
    /// 16-bit address
    Bits16,
    /// 24-bit address (W25Q128 default)
    Bits24,
    /// 32-bit address
    Bits32,
}

/// One indirect-mode QUADSPI command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QspiCommand {
    /// Instruction byte, always sent on one line.
    pub instruction: u8,
    /// Address phase, if any. Sent on one line.
    pub address: Option<u32>,
    /// Width of the address phase.
    pub address_width: AddressWidth,
    /// Data phase line count.
    pub data_lines: QspiLines,
    /// Dummy clock cycles between address and data.
    pub dummy_cycles: u8,
}

impl QspiCommand {
    /// Instruction-only command (no address, no data).
    pub const fn new(instruction: u8) -> Self {
        Self {
            instruction,
            address: None,
            address_width: AddressWidth::Bits24,
            data_lines: QspiLines::None,
            dummy_cycles: 0,
        }
    }

    /// Add a 24-bit address phase.
    #[must_use]
    pub const fn with_address(mut self, address: u32) -> Self {
        self.address = Some(address);
        self
    }

    /// Add a data phase on `lines`.
    #[must_use]
    pub const fn with_data(mut self, lines: QspiLines) -> Self {
        self.data_lines = lines;
        self
    }

    /// Insert `cycles` dummy cycles before the data phase.
    #[must_use]
    pub const fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }
}

/// Indirect-mode QUADSPI transport.
///
/// Implemented by the board (wrapping `embassy_stm32::qspi::Qspi`) and by
/// [`crate::mocks::MockQspiFlash`] on the host.
pub trait QspiBus {
    /// Error type
    type Error: core::fmt::Debug;

    /// Execute a command with no data phase.
    fn command(&mut self, cmd: &QspiCommand) -> Result<(), Self::Error>;

    /// Execute a command and transmit `data` in its data phase.
    fn write(&mut self, cmd: &QspiCommand, data: &[u8]) -> Result<(), Self::Error>;

    /// Execute a command and receive `buf.len()` bytes in its data phase.
    fn read(&mut self, cmd: &QspiCommand, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: QspiBus + ?Sized> QspiBus for &mut T {
    type Error = T::Error;

    fn command(&mut self, cmd: &QspiCommand) -> Result<(), Self::Error> {
        T::command(self, cmd)
    }

    fn write(&mut self, cmd: &QspiCommand, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, cmd, data)
    }

    fn read(&mut self, cmd: &QspiCommand, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, cmd, buf)
    }
}

/// Validate that a QUADSPI prescaler value produces a clock within W25Q128JV limits.
///
/// Returns the resulting QSPI clock in Hz, or an error if it exceeds 133 MHz.
///
/// ```rust
/// use platform::qspi::validate_qspi_prescaler;
/// assert_eq!(validate_qspi_prescaler(240_000_000, 1), Ok(120_000_000));
/// ```
pub fn validate_qspi_prescaler(ahb_hz: u32, prescaler: u8) -> Result<u32, &'static str> {
    let divider = u32::from(prescaler).saturating_add(1);
    let qspi_hz = ahb_hz.checked_div(divider).unwrap_or(ahb_hz);
    if qspi_hz > QSPI_MAX_FREQ_HZ {
        return Err("QSPI clock exceeds W25Q128JV maximum of 133 MHz");
    }
    Ok(qspi_hz)
}
