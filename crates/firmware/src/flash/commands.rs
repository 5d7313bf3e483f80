//! W25Q instruction set
//!
//! Source: Winbond W25Q128JV datasheet, rev. F, §8.1 instruction tables.
//! Instruction and address phases are single-line; 24-bit addresses.

/// Set the write-enable latch. Required before every program, erase or
/// status-register write; the chip clears it when the operation ends.
pub const WRITE_ENABLE: u8 = 0x06;

/// Read status register 1.
pub const READ_STATUS_1: u8 = 0x05;

/// Read status register 2.
pub const READ_STATUS_2: u8 = 0x35;

/// Write status register 2.
pub const WRITE_STATUS_2: u8 = 0x31;

/// Erase one 4 KiB sector.
pub const SECTOR_ERASE: u8 = 0x20;

/// Erase the whole array. Can take minutes.
pub const CHIP_ERASE: u8 = 0xC7;

/// Program up to 256 bytes within one page. Addresses past the page end
/// wrap to its start, so callers must split at page boundaries.
pub const PAGE_PROGRAM: u8 = 0x02;

/// Read data, no dummy cycles, limited clock.
pub const READ_DATA: u8 = 0x03;

/// Fast read, 8 dummy cycles.
pub const FAST_READ: u8 = 0x0B;

/// Fast read with the data phase on four lines, 8 dummy cycles. Needs QE.
pub const FAST_READ_QUAD_OUTPUT: u8 = 0x6B;

/// Manufacturer + device ID, address 0, two data bytes.
pub const MANUFACTURER_DEVICE_ID: u8 = 0x90;

// ---------------------------------------------------------------------------
// Status bits
// ---------------------------------------------------------------------------

/// SR1 bit 0: program/erase in progress.
pub const STATUS1_BUSY: u8 = 1 << 0;

/// SR2 bit 1: quad enable.
pub const STATUS2_QE: u8 = 1 << 1;

/// Dummy cycles for [`FAST_READ`] and [`FAST_READ_QUAD_OUTPUT`].
pub const FAST_READ_DUMMY_CYCLES: u8 = 8;

/// JEDEC manufacturer ID of Winbond.
pub const WINBOND_ID: u8 = 0xEF;
