//! [`QspiBus`] over the Embassy QUADSPI driver in indirect mode.

use core::convert::Infallible;

use embassy_stm32::peripherals::QUADSPI;
use embassy_stm32::qspi::enums::{DummyCycles, QspiWidth};
use embassy_stm32::qspi::{Qspi, TransferConfig};
use platform::{QspiBus, QspiCommand, QspiLines};

/// QUADSPI bank 1 wired to the W25Qxx.
pub struct BoardQspi<'d, Dma> {
    qspi: Qspi<'d, QUADSPI, Dma>,
}

impl<'d, Dma> BoardQspi<'d, Dma> {
    /// Wrap a configured QUADSPI driver.
    pub fn new(qspi: Qspi<'d, QUADSPI, Dma>) -> Self {
        Self { qspi }
    }
}

fn width(lines: QspiLines) -> QspiWidth {
    match lines {
        QspiLines::None => QspiWidth::NONE,
        QspiLines::Single => QspiWidth::SING,
        QspiLines::Quad => QspiWidth::QUAD,
    }
}

fn dummy(cycles: u8) -> DummyCycles {
    match cycles {
        0 => DummyCycles::_0,
        1 => DummyCycles::_1,
        2 => DummyCycles::_2,
        3 => DummyCycles::_3,
        4 => DummyCycles::_4,
        5 => DummyCycles::_5,
        6 => DummyCycles::_6,
        7 => DummyCycles::_7,
        8 => DummyCycles::_8,
        9 => DummyCycles::_9,
        10 => DummyCycles::_10,
        11 => DummyCycles::_11,
        12 => DummyCycles::_12,
        13 => DummyCycles::_13,
        14 => DummyCycles::_14,
        _ => DummyCycles::_15,
    }
}

/// Instruction on one line, address on one line when present.
fn transfer(cmd: &QspiCommand) -> TransferConfig {
    TransferConfig {
        iwidth: QspiWidth::SING,
        awidth: if cmd.address.is_some() {
            QspiWidth::SING
        } else {
            QspiWidth::NONE
        },
        dwidth: width(cmd.data_lines),
        instruction: cmd.instruction,
        address: cmd.address,
        dummy: dummy(cmd.dummy_cycles),
    }
}

impl<Dma> QspiBus for BoardQspi<'_, Dma> {
    type Error = Infallible;

    fn command(&mut self, cmd: &QspiCommand) -> Result<(), Self::Error> {
        self.qspi.command(transfer(cmd));
        Ok(())
    }

    fn write(&mut self, cmd: &QspiCommand, data: &[u8]) -> Result<(), Self::Error> {
        self.qspi.blocking_write(data, transfer(cmd));
        Ok(())
    }

    fn read(&mut self, cmd: &QspiCommand, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.qspi.blocking_read(buf, transfer(cmd));
        Ok(())
    }
}
