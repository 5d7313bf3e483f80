//! `embedded_sdmmc::BlockDevice` over the Embassy SDMMC1 driver.
//!
//! `embedded-sdmmc` is blocking, so each block access runs the async driver
//! to completion with `block_on`. Only the start-up image loading uses it.

use core::cell::RefCell;

use embassy_futures::block_on;
use embassy_stm32::peripherals::SDMMC1;
use embassy_stm32::sdmmc::{DataBlock, Error, Sdmmc};
use embedded_sdmmc::{Block, BlockCount, BlockDevice, BlockIdx, TimeSource, Timestamp};

/// Initialised SD card on SDMMC1.
pub struct SdmmcBlocks<'d> {
    sdmmc: RefCell<Sdmmc<'d, SDMMC1>>,
}

impl<'d> SdmmcBlocks<'d> {
    /// Wrap a driver on which `init_card` has succeeded.
    pub fn new(sdmmc: Sdmmc<'d, SDMMC1>) -> Self {
        Self {
            sdmmc: RefCell::new(sdmmc),
        }
    }
}

impl BlockDevice for SdmmcBlocks<'_> {
    type Error = Error;

    fn read(&self, blocks: &mut [Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        let mut sdmmc = self.sdmmc.borrow_mut();
        let mut data = DataBlock([0; 512]);
        for (idx, block) in (start_block_idx.0..).zip(blocks.iter_mut()) {
            block_on(sdmmc.read_block(idx, &mut data))?;
            block.contents.copy_from_slice(&data.0);
        }
        Ok(())
    }

    fn write(&self, blocks: &[Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        let mut sdmmc = self.sdmmc.borrow_mut();
        for (idx, block) in (start_block_idx.0..).zip(blocks.iter()) {
            let data = DataBlock(block.contents);
            block_on(sdmmc.write_block(idx, &data))?;
        }
        Ok(())
    }

    fn num_blocks(&self) -> Result<BlockCount, Self::Error> {
        let sdmmc = self.sdmmc.borrow();
        let blocks = sdmmc.card()?.csd.block_count();
        Ok(BlockCount(u32::try_from(blocks).unwrap_or(u32::MAX)))
    }
}

/// The board has no RTC; files are stamped 2025-01-01 00:00:00.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 55,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}
