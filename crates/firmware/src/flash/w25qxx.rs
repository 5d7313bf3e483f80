//! W25Qxx driver over indirect-mode QUADSPI

use platform::qspi::{FLASH_CAPACITY, PAGE_SIZE, SECTOR_SIZE};
use platform::{QspiBus, QspiCommand, QspiLines};

use super::commands::*;
use super::FlashError;

/// Default bound on status polls while waiting for BUSY to clear.
///
/// A full chip erase of the W25Q128 takes up to 200 s; at roughly 1 µs per
/// status read this leaves headroom.
pub const DEFAULT_BUSY_POLLS: u32 = 400_000_000;

/// Manufacturer and device ID (instruction 0x90).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    /// JEDEC manufacturer, 0xEF for Winbond
    pub manufacturer: u8,
    /// Device code
    pub device: u8,
}

impl DeviceId {
    /// `true` for a Winbond part.
    pub fn is_winbond(&self) -> bool {
        self.manufacturer == WINBOND_ID
    }
}

/// W25Q NOR flash.
pub struct W25qxx<Q> {
    bus: Q,
    capacity: u32,
    busy_polls: u32,
}

impl<Q: QspiBus> W25qxx<Q> {
    /// Driver for a 16 MiB W25Q128.
    pub fn new(bus: Q) -> Self {
        Self {
            bus,
            capacity: FLASH_CAPACITY,
            busy_polls: DEFAULT_BUSY_POLLS,
        }
    }

    /// Override the BUSY polling bound.
    #[must_use]
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Release the bus.
    pub fn release(self) -> Q {
        self.bus
    }

    /// Enable quad output and read the device ID.
    pub fn begin(&mut self) -> Result<DeviceId, FlashError> {
        self.enable_quad_mode()?;
        let id = self.read_manufacturer_id()?;
        #[cfg(feature = "defmt")]
        {
            if id.is_winbond() {
                defmt::info!("W25Q: device {=u8:#x}", id.device);
            } else {
                defmt::warn!("W25Q: unexpected manufacturer {=u8:#x}", id.manufacturer);
            }
        }
        Ok(id)
    }

    fn command(&mut self, cmd: &QspiCommand) -> Result<(), FlashError> {
        self.bus.command(cmd).map_err(|_| FlashError::Communication)
    }

    fn read_register(&mut self, instruction: u8) -> Result<u8, FlashError> {
        let mut value = [0u8];
        self.bus
            .read(
                &QspiCommand::new(instruction).with_data(QspiLines::Single),
                &mut value,
            )
            .map_err(|_| FlashError::Communication)?;
        let [value] = value;
        Ok(value)
    }

    fn check_range(&self, address: u32, len: usize) -> Result<(), FlashError> {
        let end = u64::from(address).saturating_add(u64::try_from(len).unwrap_or(u64::MAX));
        if end > u64::from(self.capacity) {
            return Err(FlashError::OutOfRange);
        }
        Ok(())
    }

    /// Set the write-enable latch.
    pub fn write_enable(&mut self) -> Result<(), FlashError> {
        self.command(&QspiCommand::new(WRITE_ENABLE))
    }

    /// Status register 1.
    pub fn read_status1(&mut self) -> Result<u8, FlashError> {
        self.read_register(READ_STATUS_1)
    }

    /// Status register 2.
    pub fn read_status2(&mut self) -> Result<u8, FlashError> {
        self.read_register(READ_STATUS_2)
    }

    /// Poll status register 1 until BUSY clears.
    pub fn wait_for_write_complete(&mut self) -> Result<(), FlashError> {
        for _ in 0..self.busy_polls {
            if self.read_status1()? & STATUS1_BUSY == 0 {
                return Ok(());
            }
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("W25Q: still busy after {=u32} polls", self.busy_polls);
        Err(FlashError::Timeout)
    }

    /// Set the QE bit in status register 2 if it is clear.
    pub fn enable_quad_mode(&mut self) -> Result<(), FlashError> {
        let status2 = self.read_status2()?;
        if status2 & STATUS2_QE != 0 {
            return Ok(());
        }
        self.write_enable()?;
        self.bus
            .write(
                &QspiCommand::new(WRITE_STATUS_2).with_data(QspiLines::Single),
                &[status2 | STATUS2_QE],
            )
            .map_err(|_| FlashError::Communication)?;
        self.wait_for_write_complete()
    }

    /// Manufacturer and device ID.
    pub fn read_manufacturer_id(&mut self) -> Result<DeviceId, FlashError> {
        let mut id = [0u8; 2];
        self.bus
            .read(
                &QspiCommand::new(MANUFACTURER_DEVICE_ID)
                    .with_address(0)
                    .with_data(QspiLines::Single),
                &mut id,
            )
            .map_err(|_| FlashError::Communication)?;
        let [manufacturer, device] = id;
        Ok(DeviceId {
            manufacturer,
            device,
        })
    }

    /// Erase the 4 KiB sector containing `address`.
    pub fn erase_sector(&mut self, address: u32) -> Result<(), FlashError> {
        self.check_range(address, 1)?;
        let base = address.saturating_sub(address.checked_rem(SECTOR_SIZE).unwrap_or(0));
        self.write_enable()?;
        self.command(&QspiCommand::new(SECTOR_ERASE).with_address(base))?;
        self.wait_for_write_complete()
    }

    /// Erase the whole device.
    pub fn chip_erase(&mut self) -> Result<(), FlashError> {
        self.write_enable()?;
        self.command(&QspiCommand::new(CHIP_ERASE))?;
        self.wait_for_write_complete()
    }

    /// Program `data` at `address` and wait for completion.
    ///
    /// `data` must fit in the page that contains `address`.
    pub fn page_program(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        if data.len() > page_room(address) {
            return Err(FlashError::InvalidLength);
        }
        self.check_range(address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        self.write_enable()?;
        self.bus
            .write(
                &QspiCommand::new(PAGE_PROGRAM)
                    .with_address(address)
                    .with_data(QspiLines::Single),
                data,
            )
            .map_err(|_| FlashError::Communication)?;
        self.wait_for_write_complete()
    }

    /// Program `data` starting at `address`, one page-bounded chunk at a
    /// time. The target range must already be erased.
    pub fn write_data(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError> {
        self.check_range(address, data.len())?;
        let mut address = address;
        let mut rest = data;
        while !rest.is_empty() {
            let (chunk, tail) = rest.split_at(rest.len().min(page_room(address)));
            self.page_program(address, chunk)?;
            address = address.saturating_add(u32::try_from(chunk.len()).unwrap_or(PAGE_SIZE));
            rest = tail;
        }
        Ok(())
    }

    fn read_with(
        &mut self,
        cmd: QspiCommand,
        address: u32,
        buf: &mut [u8],
    ) -> Result<(), FlashError> {
        self.check_range(address, buf.len())?;
        self.bus
            .read(&cmd.with_address(address), buf)
            .map_err(|_| FlashError::Communication)
    }

    /// Standard read (0x03).
    pub fn read_data(&mut self, address: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        self.read_with(
            QspiCommand::new(READ_DATA).with_data(QspiLines::Single),
            address,
            buf,
        )
    }

    /// Fast read (0x0B).
    pub fn fast_read_data(&mut self, address: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        self.read_with(
            QspiCommand::new(FAST_READ)
                .with_data(QspiLines::Single)
                .with_dummy_cycles(FAST_READ_DUMMY_CYCLES),
            address,
            buf,
        )
    }

    /// Fast read with quad data output (0x6B). Call
    /// [`enable_quad_mode`](Self::enable_quad_mode) first.
    pub fn fast_read_quad_output(
        &mut self,
        address: u32,
        buf: &mut [u8],
    ) -> Result<(), FlashError> {
        self.read_with(
            QspiCommand::new(FAST_READ_QUAD_OUTPUT)
                .with_data(QspiLines::Quad)
                .with_dummy_cycles(FAST_READ_DUMMY_CYCLES),
            address,
            buf,
        )
    }
}

/// Bytes left in the page containing `address`.
pub(crate) fn page_room(address: u32) -> usize {
    let offset = address.checked_rem(PAGE_SIZE).unwrap_or(0);
    usize::try_from(PAGE_SIZE.saturating_sub(offset)).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::{MockQspiFlash, QspiOp};

    fn flash() -> (W25qxx<MockQspiFlash>, MockQspiFlash) {
        let handle = MockQspiFlash::new(64 * 1024);
        (W25qxx::new(handle.clone()), handle)
    }

    fn instructions(handle: &MockQspiFlash) -> Vec<u8> {
        handle
            .log()
            .iter()
            .map(|op| match op {
                QspiOp::Command { instruction, .. }
                | QspiOp::Write { instruction, .. }
                | QspiOp::Read { instruction, .. } => *instruction,
            })
            .collect()
    }

    #[test]
    fn begin_sets_quad_enable_and_reads_id() {
        let (mut flash, handle) = flash();
        let id = flash.begin().unwrap();
        assert!(id.is_winbond());
        assert_eq!(id.device, 0x17);
        assert_eq!(handle.status2() & STATUS2_QE, STATUS2_QE);

        let ops = instructions(&handle);
        assert_eq!(&ops[..3], &[0x35, 0x06, 0x31]);
        assert_eq!(ops.last(), Some(&0x90));
    }

    #[test]
    fn begin_leaves_quad_enable_alone_when_set() {
        let handle = MockQspiFlash::new(4096).with_status2(STATUS2_QE);
        let mut flash = W25qxx::new(handle.clone());
        flash.begin().unwrap();
        assert_eq!(instructions(&handle), vec![0x35, 0x90]);
    }

    #[test]
    fn write_data_splits_at_page_boundaries() {
        let (mut flash, handle) = flash();
        let data: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
        flash.write_data(200, &data).unwrap();

        assert_eq!(handle.page_programs(), vec![(200, 56), (256, 244)]);
        assert_eq!(&handle.memory()[200..500], data.as_slice());
    }

    #[test]
    fn every_program_is_preceded_by_write_enable() {
        let (mut flash, handle) = flash();
        flash.write_data(0, &[0u8; 600]).unwrap();
        let ops = instructions(&handle);
        for (i, op) in ops.iter().enumerate() {
            if *op == PAGE_PROGRAM {
                assert_eq!(ops[i - 1], WRITE_ENABLE, "program at {i} without WEL");
            }
        }
        assert_eq!(handle.page_programs().len(), 3);
    }

    #[test]
    fn page_program_rejects_oversize_and_crossing() {
        let (mut flash, handle) = flash();
        assert_eq!(flash.page_program(0, &[0; 257]), Err(FlashError::InvalidLength));
        assert_eq!(flash.page_program(250, &[0; 7]), Err(FlashError::InvalidLength));
        assert!(flash.page_program(250, &[0; 6]).is_ok());
        assert_eq!(handle.page_programs(), vec![(250, 6)]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let (mut flash, _) = flash();
        let mut buf = [0u8; 4];
        assert_eq!(flash.read_data(FLASH_CAPACITY - 2, &mut buf), Err(FlashError::OutOfRange));
        assert_eq!(flash.write_data(FLASH_CAPACITY, &[1]), Err(FlashError::OutOfRange));
    }

    #[test]
    fn erase_then_read_back() {
        let (mut flash, handle) = flash();
        flash.write_data(4096 + 10, &[0x12, 0x34]).unwrap();
        let mut buf = [0u8; 2];
        flash.fast_read_data(4096 + 10, &mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34]);

        flash.erase_sector(4096 + 100).unwrap();
        flash.read_data(4096 + 10, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF]);
        assert!(handle
            .log()
            .contains(&QspiOp::Command { instruction: SECTOR_ERASE, address: Some(4096) }));
    }

    #[test]
    fn reads_use_the_documented_dummy_cycles() {
        let (mut flash, handle) = flash();
        let mut buf = [0u8; 8];
        flash.read_data(0, &mut buf).unwrap();
        flash.fast_read_data(0, &mut buf).unwrap();
        flash.fast_read_quad_output(0, &mut buf).unwrap();
        let dummies: Vec<(u8, u8)> = handle
            .log()
            .iter()
            .filter_map(|op| match op {
                QspiOp::Read {
                    instruction,
                    dummy_cycles,
                    ..
                } => Some((*instruction, *dummy_cycles)),
                _ => None,
            })
            .collect();
        assert_eq!(dummies, vec![(0x03, 0), (0x0B, 8), (0x6B, 8)]);
    }

    #[test]
    fn chip_erase_clears_everything() {
        let (mut flash, handle) = flash();
        flash.write_data(0, &[0; 16]).unwrap();
        flash.chip_erase().unwrap();
        assert!(handle.memory().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn stuck_busy_times_out() {
        let handle = MockQspiFlash::new(4096);
        let mut flash = W25qxx::new(handle.clone()).with_busy_polls(10);
        handle.set_stuck_busy(true);
        assert_eq!(flash.chip_erase(), Err(FlashError::Timeout));
        let polls = instructions(&handle).iter().filter(|&&i| i == READ_STATUS_1).count();
        assert_eq!(polls, 10);
    }

    #[test]
    fn bus_fault_is_mapped() {
        let (mut flash, handle) = flash();
        handle.set_bus_fault(true);
        assert_eq!(flash.begin(), Err(FlashError::Communication));
    }
}
