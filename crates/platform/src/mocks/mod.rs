//! Mock implementations for testing
//!
//! Recording test doubles for the platform traits that `embedded-hal-mock`
//! does not cover. Most mocks are cheap `Clone` handles over shared state so
//! a test can keep a handle after moving the mock into a driver.

#![cfg(any(test, feature = "std"))]

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use crate::dma::{PwmDma, TransferFlag};
use crate::qspi::{QspiBus, QspiCommand};
use crate::storage::{OpenMode, Volume};
use crate::timer::OneShotTimer;

// ---------------------------------------------------------------------------
// Input pin
// ---------------------------------------------------------------------------

/// Error returned by a [`MockInputPin`] switched to failing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Input pin whose level is driven by the test.
///
/// Clones share the level, so the test keeps one clone and moves the other
/// into the engine.
#[derive(Clone, Default)]
pub struct MockInputPin {
    high: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
}

impl MockInputPin {
    /// New pin at the given level.
    pub fn new(high: bool) -> Self {
        let pin = Self::default();
        pin.drive(high);
        pin
    }

    /// Set the electrical level seen by the next read.
    pub fn drive(&self, high: bool) {
        self.high.set(high);
    }

    /// Make every read fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl embedded_hal::digital::ErrorType for MockInputPin {
    type Error = MockPinError;
}

impl embedded_hal::digital::InputPin for MockInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.failing.get() {
            return Err(MockPinError);
        }
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

// ---------------------------------------------------------------------------
// One-shot timer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TimerState {
    running: Cell<bool>,
    starts: Cell<u32>,
    stops: Cell<u32>,
}

/// One-shot timer that records arm/disarm calls.
#[derive(Clone, Default)]
pub struct MockOneShotTimer {
    state: Rc<TimerState>,
}

impl MockOneShotTimer {
    /// New, disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while armed.
    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    /// Number of `start` calls so far.
    pub fn start_count(&self) -> u32 {
        self.state.starts.get()
    }

    /// Number of `stop` calls so far.
    pub fn stop_count(&self) -> u32 {
        self.state.stops.get()
    }
}

impl OneShotTimer for MockOneShotTimer {
    type Error = Infallible;

    fn start(&mut self) -> Result<(), Self::Error> {
        self.state.running.set(true);
        self.state.starts.set(self.state.starts.get().saturating_add(1));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.state.running.set(false);
        self.state.stops.set(self.state.stops.get().saturating_add(1));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PWM + DMA
// ---------------------------------------------------------------------------

/// Error returned by a [`MockPwmDma`] set to refuse transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDmaError;

#[derive(Default)]
struct PwmState {
    frames: RefCell<Vec<Vec<u16>>>,
    stops: Cell<u32>,
    refuse: Cell<bool>,
}

/// PWM timer channel that records every duty buffer it is asked to stream.
///
/// With [`completing`](Self::completing), `start` signals the given flag
/// immediately, as if the transfer finished in zero time.
#[derive(Clone)]
pub struct MockPwmDma<'a> {
    period: u32,
    flag: Option<&'a TransferFlag>,
    state: Rc<PwmState>,
}

impl<'a> MockPwmDma<'a> {
    /// Timer with auto-reload value `period`.
    pub fn new(period: u32) -> Self {
        Self {
            period,
            flag: None,
            state: Rc::default(),
        }
    }

    /// Signal `flag` on every successful `start`.
    #[must_use]
    pub fn completing(mut self, flag: &'a TransferFlag) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Make `start` fail.
    pub fn refuse_transfers(&self, refuse: bool) {
        self.state.refuse.set(refuse);
    }

    /// Every duty buffer passed to `start`, in order.
    pub fn frames(&self) -> Vec<Vec<u16>> {
        self.state.frames.borrow().clone()
    }

    /// Number of `stop` calls.
    pub fn stop_count(&self) -> u32 {
        self.state.stops.get()
    }
}

impl PwmDma for MockPwmDma<'_> {
    type Error = MockDmaError;

    fn period(&self) -> u32 {
        self.period
    }

    fn start(&mut self, duties: &[u16]) -> Result<(), Self::Error> {
        if self.state.refuse.get() {
            return Err(MockDmaError);
        }
        self.state.frames.borrow_mut().push(duties.to_vec());
        if let Some(flag) = self.flag {
            flag.signal();
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.state.stops.set(self.state.stops.get().saturating_add(1));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// QSPI NOR flash emulator
// ---------------------------------------------------------------------------

/// One bus transaction seen by [`MockQspiFlash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QspiOp {
    /// Command without data phase
    Command {
        /// Instruction byte
        instruction: u8,
        /// Address phase
        address: Option<u32>,
    },
    /// Command with transmitted data
    Write {
        /// Instruction byte
        instruction: u8,
        /// Address phase
        address: Option<u32>,
        /// Payload
        data: Vec<u8>,
    },
    /// Command with received data
    Read {
        /// Instruction byte
        instruction: u8,
        /// Address phase
        address: Option<u32>,
        /// Dummy cycles
        dummy_cycles: u8,
        /// Bytes requested
        len: usize,
    },
}

/// Error returned by a [`MockQspiFlash`] with an injected bus fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockQspiError;

struct FlashState {
    memory: Vec<u8>,
    write_enabled: bool,
    status2: u8,
    busy_remaining: u32,
    busy_per_operation: u32,
    stuck_busy: bool,
    fail_bus: bool,
    id: [u8; 2],
    log: Vec<QspiOp>,
}

/// Behavioural model of a Winbond W25Q NOR flash behind a QUADSPI bus.
///
/// Models the write-enable latch, busy status after program/erase, the QE
/// bit in status register 2, AND-programming of erased cells, and in-page
/// address wrap on page program. Every transaction is logged.
#[derive(Clone)]
pub struct MockQspiFlash {
    state: Rc<RefCell<FlashState>>,
}

impl MockQspiFlash {
    const PAGE: usize = 256;
    const SECTOR: usize = 4096;

    /// Erased flash of `capacity` bytes reporting Winbond ID `EF 17`.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(FlashState {
                memory: std::vec![0xFF; capacity],
                write_enabled: false,
                status2: 0,
                busy_remaining: 0,
                busy_per_operation: 2,
                stuck_busy: false,
                fail_bus: false,
                id: [0xEF, 0x17],
                log: Vec::new(),
            })),
        }
    }

    /// Override the manufacturer/device ID.
    #[must_use]
    pub fn with_id(self, manufacturer: u8, device: u8) -> Self {
        self.state.borrow_mut().id = [manufacturer, device];
        self
    }

    /// Preset status register 2.
    #[must_use]
    pub fn with_status2(self, status2: u8) -> Self {
        self.state.borrow_mut().status2 = status2;
        self
    }

    /// Number of status polls that report busy after each program/erase.
    pub fn set_busy_polls(&self, polls: u32) {
        self.state.borrow_mut().busy_per_operation = polls;
    }

    /// Report busy forever.
    pub fn set_stuck_busy(&self, stuck: bool) {
        self.state.borrow_mut().stuck_busy = stuck;
    }

    /// Fail every following transaction.
    pub fn set_bus_fault(&self, fail: bool) {
        self.state.borrow_mut().fail_bus = fail;
    }

    /// Copy of the memory array.
    pub fn memory(&self) -> Vec<u8> {
        self.state.borrow().memory.clone()
    }

    /// Current status register 2.
    pub fn status2(&self) -> u8 {
        self.state.borrow().status2
    }

    /// All transactions so far.
    pub fn log(&self) -> Vec<QspiOp> {
        self.state.borrow().log.clone()
    }

    /// Forget logged transactions.
    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// `(address, len)` of every page program so far.
    pub fn page_programs(&self) -> Vec<(u32, usize)> {
        self.state
            .borrow()
            .log
            .iter()
            .filter_map(|op| match op {
                QspiOp::Write {
                    instruction: 0x02,
                    address: Some(a),
                    data,
                } => Some((*a, data.len())),
                _ => None,
            })
            .collect()
    }

    fn begin(&self) -> Result<(), MockQspiError> {
        if self.state.borrow().fail_bus {
            Err(MockQspiError)
        } else {
            Ok(())
        }
    }
}

// Host-only model; indices are reduced modulo capacity.
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
impl FlashState {
    fn start_busy(&mut self) {
        self.write_enabled = false;
        self.busy_remaining = self.busy_per_operation;
    }

    fn wrap(&self, address: usize) -> usize {
        if self.memory.is_empty() {
            0
        } else {
            address % self.memory.len()
        }
    }

    fn erase(&mut self, start: usize, len: usize) {
        for i in 0..len {
            let at = self.wrap(start + i);
            self.memory[at] = 0xFF;
        }
    }

    fn program(&mut self, address: usize, data: &[u8]) {
        let page_base = address - address % MockQspiFlash::PAGE;
        let mut offset = address % MockQspiFlash::PAGE;
        for byte in data {
            let at = self.wrap(page_base + offset);
            self.memory[at] &= *byte;
            offset = (offset + 1) % MockQspiFlash::PAGE;
        }
    }

    fn status1(&mut self) -> u8 {
        let busy = if self.stuck_busy {
            true
        } else if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            true
        } else {
            false
        };
        u8::from(busy) | (u8::from(self.write_enabled) << 1)
    }
}

#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)] // host-only model
impl QspiBus for MockQspiFlash {
    type Error = MockQspiError;

    fn command(&mut self, cmd: &QspiCommand) -> Result<(), Self::Error> {
        self.begin()?;
        let mut s = self.state.borrow_mut();
        s.log.push(QspiOp::Command {
            instruction: cmd.instruction,
            address: cmd.address,
        });
        match cmd.instruction {
            0x06 => s.write_enabled = true,
            0x04 => s.write_enabled = false,
            0x20 if s.write_enabled => {
                let addr = cmd.address.unwrap_or(0) as usize;
                let base = addr - addr % Self::SECTOR;
                s.erase(base, Self::SECTOR);
                s.start_busy();
            }
            0xC7 | 0x60 if s.write_enabled => {
                let len = s.memory.len();
                s.erase(0, len);
                s.start_busy();
            }
            _ => {}
        }
        Ok(())
    }

    fn write(&mut self, cmd: &QspiCommand, data: &[u8]) -> Result<(), Self::Error> {
        self.begin()?;
        let mut s = self.state.borrow_mut();
        s.log.push(QspiOp::Write {
            instruction: cmd.instruction,
            address: cmd.address,
            data: data.to_vec(),
        });
        match cmd.instruction {
            0x02 if s.write_enabled => {
                s.program(cmd.address.unwrap_or(0) as usize, data);
                s.start_busy();
            }
            0x31 if s.write_enabled => {
                s.status2 = data.first().copied().unwrap_or(s.status2);
                s.start_busy();
            }
            _ => {}
        }
        Ok(())
    }

    fn read(&mut self, cmd: &QspiCommand, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.begin()?;
        let mut s = self.state.borrow_mut();
        s.log.push(QspiOp::Read {
            instruction: cmd.instruction,
            address: cmd.address,
            dummy_cycles: cmd.dummy_cycles,
            len: buf.len(),
        });
        match cmd.instruction {
            0x05 => {
                let status = s.status1();
                buf.fill(status);
            }
            0x35 => buf.fill(s.status2),
            0x90 => {
                let id = s.id;
                for (slot, byte) in buf.iter_mut().zip(id.iter().cycle()) {
                    *slot = *byte;
                }
            }
            0x03 | 0x0B | 0x6B => {
                let start = cmd.address.unwrap_or(0) as usize;
                for (i, slot) in buf.iter_mut().enumerate() {
                    let at = s.wrap(start.saturating_add(i));
                    *slot = s.memory.get(at).copied().unwrap_or(0xFF);
                }
            }
            _ => buf.fill(0),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SPI bus + output pins
// ---------------------------------------------------------------------------

/// Error returned by a [`MockSpiBus`] or [`MockOutputPin`] set to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

impl embedded_hal::spi::Error for MockBusError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

impl embedded_hal::digital::Error for MockBusError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// One event recorded on a [`BusLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// `SpiBus::write` payload.
    Write(Vec<u8>),
    /// `SpiBus::flush`.
    Flush,
    /// Output pin driven to a level.
    Pin {
        /// Name given to [`BusLog::pin`].
        name: &'static str,
        /// New level.
        high: bool,
    },
}

/// Shared, ordered record of SPI writes and pin changes.
///
/// Hand out a bus with [`spi`](Self::spi) and pins with [`pin`](Self::pin);
/// everything they do lands in one timeline, so tests can check
/// command/data framing and chip-select placement.
#[derive(Clone, Default)]
pub struct BusLog {
    events: Rc<RefCell<Vec<BusEvent>>>,
    failing: Rc<Cell<bool>>,
}

impl BusLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// SPI bus writing into this log.
    pub fn spi(&self) -> MockSpiBus {
        MockSpiBus { log: self.clone() }
    }

    /// Output pin named `name`, starting low.
    pub fn pin(&self, name: &'static str) -> MockOutputPin {
        MockOutputPin {
            name,
            high: Rc::new(Cell::new(false)),
            log: self.clone(),
        }
    }

    /// Make every bus transfer fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Snapshot of all events.
    pub fn events(&self) -> Vec<BusEvent> {
        self.events.borrow().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Every byte written, in order.
    pub fn written(&self) -> Vec<u8> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                BusEvent::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Writes grouped into `(command, data)` pairs using the `dc` pin.
    ///
    /// Each byte written with `dc` low opens a new command; bytes written
    /// with `dc` high are appended to the current one. Data before the
    /// first command is dropped.
    pub fn commands(&self, dc: &str) -> Vec<(u8, Vec<u8>)> {
        let mut dc_high = false;
        let mut out: Vec<(u8, Vec<u8>)> = Vec::new();
        for event in self.events.borrow().iter() {
            match event {
                BusEvent::Pin { name, high } if *name == dc => dc_high = *high,
                BusEvent::Write(bytes) if dc_high => {
                    if let Some((_, data)) = out.last_mut() {
                        data.extend_from_slice(bytes);
                    }
                }
                BusEvent::Write(bytes) => out.extend(bytes.iter().map(|&c| (c, Vec::new()))),
                _ => {}
            }
        }
        out
    }

    /// Bytes written between each falling and rising edge of `cs`.
    pub fn cs_frames(&self, cs: &str) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in self.events.borrow().iter() {
            match event {
                BusEvent::Pin { name, high: false } if *name == cs => current = Some(Vec::new()),
                BusEvent::Pin { name, high: true } if *name == cs => {
                    if let Some(frame) = current.take() {
                        frames.push(frame);
                    }
                }
                BusEvent::Write(bytes) => {
                    if let Some(frame) = current.as_mut() {
                        frame.extend_from_slice(bytes);
                    }
                }
                _ => {}
            }
        }
        frames
    }

    /// `true` if every rising edge of `cs` is directly preceded by a flush
    /// whenever bytes were written since the falling edge.
    pub fn flushed_before_release(&self, cs: &str) -> bool {
        let mut dirty = false;
        for event in self.events.borrow().iter() {
            match event {
                BusEvent::Write(_) => dirty = true,
                BusEvent::Flush => dirty = false,
                BusEvent::Pin { name, high: true } if *name == cs && dirty => return false,
                _ => {}
            }
        }
        true
    }

    fn push(&self, event: BusEvent) -> Result<(), MockBusError> {
        if self.failing.get() {
            return Err(MockBusError);
        }
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

/// Write-only SPI bus recording into a [`BusLog`]. Reads return zeros.
#[derive(Clone)]
pub struct MockSpiBus {
    log: BusLog,
}

impl embedded_hal::spi::ErrorType for MockSpiBus {
    type Error = MockBusError;
}

impl embedded_hal::spi::SpiBus for MockSpiBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Write(words.to_vec()))
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let sent = words.to_vec();
        words.fill(0);
        self.write(&sent)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Flush)
    }
}

/// Output pin recording level changes into a [`BusLog`].
#[derive(Clone)]
pub struct MockOutputPin {
    name: &'static str,
    high: Rc<Cell<bool>>,
    log: BusLog,
}

impl MockOutputPin {
    /// Current level.
    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl embedded_hal::digital::ErrorType for MockOutputPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        self.log.events.borrow_mut().push(BusEvent::Pin {
            name: self.name,
            high: false,
        });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        self.log.events.borrow_mut().push(BusEvent::Pin {
            name: self.name,
            high: true,
        });
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for MockOutputPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.get())
    }
}

// ---------------------------------------------------------------------------
// Volume
// ---------------------------------------------------------------------------

/// Errors reported by [`MockVolume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStorageError {
    /// Mount refused
    MountFailed,
    /// Operation on an unmounted volume
    NotMounted,
    /// No such file
    NotFound,
    /// Injected read failure
    Io,
}

/// Open handle into a [`MockVolume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockFile {
    index: usize,
    position: usize,
}

/// In-memory volume with fault injection and call counters.
#[derive(Default)]
pub struct MockVolume {
    files: Vec<(String, Vec<u8>)>,
    mounted: bool,
    refuse_mount: bool,
    read_chunk: Option<usize>,
    fail_read_after: Option<usize>,
    reads: usize,
    mounts: usize,
    unmounts: usize,
    closes: usize,
}

impl MockVolume {
    /// Empty volume.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    #[must_use]
    pub fn with_file(mut self, name: &str, contents: &[u8]) -> Self {
        self.files.push((String::from(name), contents.to_vec()));
        self
    }

    /// Make `mount` fail.
    pub fn refuse_mount(&mut self, refuse: bool) {
        self.refuse_mount = refuse;
    }

    /// Return at most `chunk` bytes per read.
    pub fn set_read_chunk(&mut self, chunk: usize) {
        self.read_chunk = Some(chunk);
    }

    /// Let `reads` reads succeed, then fail every following one.
    pub fn fail_reads_after(&mut self, reads: usize) {
        self.fail_read_after = Some(reads);
    }

    /// `true` while mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Number of successful mounts.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    /// Number of unmounts.
    pub fn unmount_count(&self) -> usize {
        self.unmounts
    }

    /// Number of closed files.
    pub fn close_count(&self) -> usize {
        self.closes
    }
}

impl Volume for MockVolume {
    type Error = MockStorageError;
    type File = MockFile;

    async fn mount(&mut self) -> Result<(), Self::Error> {
        if self.refuse_mount {
            return Err(MockStorageError::MountFailed);
        }
        self.mounted = true;
        self.mounts = self.mounts.saturating_add(1);
        Ok(())
    }

    async fn unmount(&mut self) -> Result<(), Self::Error> {
        if !self.mounted {
            return Err(MockStorageError::NotMounted);
        }
        self.mounted = false;
        self.unmounts = self.unmounts.saturating_add(1);
        Ok(())
    }

    async fn open(&mut self, path: &str, _mode: OpenMode) -> Result<Self::File, Self::Error> {
        if !self.mounted {
            return Err(MockStorageError::NotMounted);
        }
        let name = path.trim_start_matches('/');
        self.files
            .iter()
            .position(|(n, _)| n == name)
            .map(|index| MockFile { index, position: 0 })
            .ok_or(MockStorageError::NotFound)
    }

    async fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.mounted {
            return Err(MockStorageError::NotMounted);
        }
        if self.fail_read_after.is_some_and(|limit| self.reads >= limit) {
            return Err(MockStorageError::Io);
        }
        self.reads = self.reads.saturating_add(1);
        let contents = self
            .files
            .get(file.index)
            .map(|(_, c)| c.as_slice())
            .ok_or(MockStorageError::NotFound)?;
        let rest = contents.get(file.position..).unwrap_or(&[]);
        let mut n = rest.len().min(buf.len());
        if let Some(chunk) = self.read_chunk {
            n = n.min(chunk);
        }
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), rest.get(..n)) {
            dst.copy_from_slice(src);
        }
        file.position = file.position.saturating_add(n);
        Ok(n)
    }

    async fn close(&mut self, _file: Self::File) -> Result<(), Self::Error> {
        self.closes = self.closes.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::qspi::QspiLines;
    use embedded_hal::digital::InputPin;

    #[test]
    fn input_pin_clones_share_level() {
        let handle = MockInputPin::new(false);
        let mut pin = handle.clone();
        assert_eq!(pin.is_high(), Ok(false));
        handle.drive(true);
        assert_eq!(pin.is_high(), Ok(true));
        handle.set_failing(true);
        assert_eq!(pin.is_high(), Err(MockPinError));
    }

    #[test]
    fn flash_model_ignores_program_without_write_enable() {
        let mut flash = MockQspiFlash::new(4096);
        let program = QspiCommand::new(0x02)
            .with_address(0)
            .with_data(QspiLines::Single);
        flash.write(&program, &[0x00]).unwrap();
        assert_eq!(flash.memory()[0], 0xFF, "WEL clear: program must be ignored");

        flash.command(&QspiCommand::new(0x06)).unwrap();
        flash.write(&program, &[0x12]).unwrap();
        assert_eq!(flash.memory()[0], 0x12);
    }

    #[test]
    fn flash_model_reports_busy_then_ready() {
        let mut flash = MockQspiFlash::new(4096);
        flash.set_busy_polls(1);
        flash.command(&QspiCommand::new(0x06)).unwrap();
        flash
            .command(&QspiCommand::new(0x20).with_address(0))
            .unwrap();
        let status = QspiCommand::new(0x05).with_data(QspiLines::Single);
        let mut sr = [0u8; 1];
        flash.read(&status, &mut sr).unwrap();
        assert_eq!(sr[0] & 0x01, 0x01, "first poll after erase must be busy");
        flash.read(&status, &mut sr).unwrap();
        assert_eq!(sr[0] & 0x01, 0x00);
    }

    #[test]
    fn bus_log_splits_commands_on_dc() {
        use embedded_hal::digital::OutputPin;
        use embedded_hal::spi::SpiBus;

        let log = BusLog::new();
        let mut spi = log.spi();
        let mut dc = log.pin("dc");
        let mut cs = log.pin("cs");
        cs.set_low().unwrap();
        dc.set_low().unwrap();
        spi.write(&[0x2A]).unwrap();
        dc.set_high().unwrap();
        spi.write(&[0, 1]).unwrap();
        spi.write(&[0, 2]).unwrap();
        spi.flush().unwrap();
        cs.set_high().unwrap();

        assert_eq!(log.commands("dc"), vec![(0x2A, vec![0, 1, 0, 2])]);
        assert_eq!(log.cs_frames("cs"), vec![vec![0x2A, 0, 1, 0, 2]]);
        assert!(log.flushed_before_release("cs"));
    }

    #[tokio::test]
    async fn volume_requires_mount() {
        let mut vol = MockVolume::new().with_file("A.BIN", &[1]);
        assert_eq!(
            vol.open("A.BIN", OpenMode::Read).await,
            Err(MockStorageError::NotMounted)
        );
        vol.mount().await.unwrap();
        assert!(vol.open("/A.BIN", OpenMode::Read).await.is_ok());
        assert_eq!(
            vol.open("B.BIN", OpenMode::Read).await,
            Err(MockStorageError::NotFound)
        );
    }
}
