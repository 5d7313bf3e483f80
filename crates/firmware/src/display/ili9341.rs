//! ILI9341 TFT driver (240×320, RGB565, 4-wire SPI)
//!
//! # Wiring
//!
//! | Signal | MCU pin | Notes                          |
//! |--------|---------|--------------------------------|
//! | SCK    | PA5     | SPI1                           |
//! | MOSI   | PA7     | SPI1                           |
//! | CS     | PD8     | driven by the driver, active low |
//! | DC     | PD10    | low = command, high = data     |
//! | RST    | PD9     | active low                     |
//!
//! Every command runs under its own chip-select assertion. Pixel data for a
//! filled area is streamed from a [`BURST_MAX`]-byte buffer that is reused
//! for every fill, so a full-screen clear costs no more RAM than a line.
//!
//! Shapes, text and image streaming live in sibling modules as further
//! `impl` blocks on [`Ili9341`].

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::DisplayError;

/// Size of the burst buffer in bytes (250 pixels).
pub const BURST_MAX: usize = 500;

/// Panel width in portrait orientation.
pub const PANEL_WIDTH: u16 = 240;
/// Panel height in portrait orientation.
pub const PANEL_HEIGHT: u16 = 320;

/// ILI9341 command codes used by the driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Software reset; wait 5 ms (150 ms used) before the next command.
    SoftwareReset = 0x01,
    /// Sleep out; wait 120 ms.
    SleepOut = 0x11,
    /// Display off.
    DisplayOff = 0x28,
    /// Display on.
    DisplayOn = 0x29,
    /// Column address set: 4 data bytes.
    ColumnAddressSet = 0x2A,
    /// Page (row) address set: 4 data bytes.
    PageAddressSet = 0x2B,
    /// Memory write: pixel data follows.
    MemoryWrite = 0x2C,
    /// Memory access control (MADCTL): 1 data byte.
    MemoryAccessControl = 0x36,
}

/// Vendor configuration sent between software reset and sleep-out.
///
/// Power control A/B, driver timing A/B, power-on sequence, pump ratio,
/// power control 1/2, VCOM 1/2, MADCTL, pixel format (16 bpp), frame rate,
/// display function, 3-gamma off, gamma curve, positive/negative gamma.
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (0xCB, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    (0xCF, &[0x00, 0xC1, 0x30]),
    (0xE8, &[0x85, 0x00, 0x78]),
    (0xEA, &[0x00, 0x00]),
    (0xED, &[0x64, 0x03, 0x12, 0x81]),
    (0xF7, &[0x20]),
    (0xC0, &[0x23]),
    (0xC1, &[0x10]),
    (0xC5, &[0x3E, 0x28]),
    (0xC7, &[0x86]),
    (0x36, &[0x48]),
    (0x3A, &[0x55]),
    (0xB1, &[0x00, 0x18]),
    (0xB6, &[0x08, 0x82, 0x27]),
    (0xF2, &[0x00]),
    (0x26, &[0x01]),
    (
        0xE0,
        &[
            0x0F, 0x31, 0x2B, 0x0C, 0x0E, 0x08, 0x4E, 0xF1, 0x37, 0x07, 0x10, 0x03, 0x0E, 0x09,
            0x00,
        ],
    ),
    (
        0xE1,
        &[
            0x00, 0x0E, 0x14, 0x03, 0x11, 0x07, 0x31, 0xC1, 0x48, 0x08, 0x0F, 0x0C, 0x31, 0x36,
            0x0F,
        ],
    ),
];

/// Screen rotation presets (MADCTL with BGR order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Portrait, 240×320.
    Vertical1,
    /// Landscape, 320×240.
    Horizontal1,
    /// Portrait rotated 180°, 240×320. Default after `init`.
    Vertical2,
    /// Landscape rotated 180°, 320×240.
    Horizontal2,
}

impl Rotation {
    /// Decode the raw rotation index (0..=3).
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Vertical1),
            1 => Some(Self::Horizontal1),
            2 => Some(Self::Vertical2),
            3 => Some(Self::Horizontal2),
            _ => None,
        }
    }

    /// MADCTL value.
    pub const fn madctl(self) -> u8 {
        match self {
            Self::Vertical1 => 0x48,
            Self::Horizontal1 => 0x28,
            Self::Vertical2 => 0x88,
            Self::Horizontal2 => 0xE8,
        }
    }

    /// `(width, height)` in this rotation.
    pub const fn dimensions(self) -> (u16, u16) {
        match self {
            Self::Vertical1 | Self::Vertical2 => (PANEL_WIDTH, PANEL_HEIGHT),
            Self::Horizontal1 | Self::Horizontal2 => (PANEL_HEIGHT, PANEL_WIDTH),
        }
    }
}

/// Orientation presets, an alternative MADCTL table to [`Rotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// 0°.
    Portrait,
    /// 90°.
    Landscape,
    /// 180°.
    PortraitInverted,
    /// 270°.
    LandscapeInverted,
    /// Landscape with row/column exchange only.
    Test,
    /// Portrait with row order flipped.
    PortraitTrue,
}

impl Orientation {
    /// MADCTL value.
    pub const fn madctl(self) -> u8 {
        match self {
            Self::Portrait => 0x08,
            Self::Landscape => 0x68,
            Self::PortraitInverted => 0xC8,
            Self::LandscapeInverted => 0xA8,
            Self::Test => 0x28,
            Self::PortraitTrue => 0x88,
        }
    }

    /// `(width, height)` in this orientation.
    pub const fn dimensions(self) -> (u16, u16) {
        match self {
            Self::Portrait | Self::PortraitInverted | Self::PortraitTrue => {
                (PANEL_WIDTH, PANEL_HEIGHT)
            }
            Self::Landscape | Self::LandscapeInverted | Self::Test => (PANEL_HEIGHT, PANEL_WIDTH),
        }
    }
}

/// Saturating conversion for coordinates already clipped to the screen.
pub(crate) fn to_u16(v: i32) -> u16 {
    u16::try_from(v.max(0)).unwrap_or(u16::MAX)
}

/// ILI9341 driver.
///
/// Generic over a blocking [`SpiBus`], the chip-select, data/command and
/// reset [`OutputPin`]s, and a [`DelayNs`] for the reset timings.
pub struct Ili9341<SPI, CS, DC, RST, D> {
    spi: SPI,
    cs: CS,
    dc: DC,
    rst: RST,
    delay: D,
    width: u16,
    height: u16,
    burst: [u8; BURST_MAX],
}

impl<SPI, CS, DC, RST, D> Ili9341<SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    /// Wrap the bus and pins. No traffic until [`init`](Self::init).
    pub fn new(spi: SPI, cs: CS, dc: DC, rst: RST, delay: D) -> Self {
        let (width, height) = Rotation::Vertical2.dimensions();
        Self {
            spi,
            cs,
            dc,
            rst,
            delay,
            width,
            height,
            burst: [0; BURST_MAX],
        }
    }

    /// Current width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Current height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    // -----------------------------------------------------------------------
    // Bus helpers
    // -----------------------------------------------------------------------

    /// One chip-select frame: optional command byte, then optional data.
    fn transaction(&mut self, command: Option<u8>, data: &[u8]) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(|_| DisplayError::Gpio)?;
        let sent = Self::send(&mut self.spi, &mut self.dc, command, data);
        self.end_transaction(sent)
    }

    fn send(
        spi: &mut SPI,
        dc: &mut DC,
        command: Option<u8>,
        data: &[u8],
    ) -> Result<(), DisplayError> {
        if let Some(cmd) = command {
            dc.set_low().map_err(|_| DisplayError::Gpio)?;
            spi.write(&[cmd]).map_err(|_| DisplayError::Communication)?;
        }
        if !data.is_empty() {
            dc.set_high().map_err(|_| DisplayError::Gpio)?;
            spi.write(data).map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    /// Drain the bus and release chip select, even if the transfer failed.
    fn end_transaction(&mut self, sent: Result<(), DisplayError>) -> Result<(), DisplayError> {
        let flushed = self.spi.flush().map_err(|_| DisplayError::Communication);
        self.cs.set_high().map_err(|_| DisplayError::Gpio)?;
        sent.and(flushed)
    }

    fn command(&mut self, command: Command, data: &[u8]) -> Result<(), DisplayError> {
        self.transaction(Some(command as u8), data)
    }

    // -----------------------------------------------------------------------
    // Bring-up
    // -----------------------------------------------------------------------

    /// Reset pulse, vendor configuration, sleep-out and display-on, then
    /// [`Rotation::Vertical2`].
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.rst.set_high().map_err(|_| DisplayError::Gpio)?;
        self.cs.set_low().map_err(|_| DisplayError::Gpio)?;
        self.rst.set_low().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_ms(200);
        self.cs.set_high().map_err(|_| DisplayError::Gpio)?;
        self.delay.delay_ms(200);
        self.rst.set_high().map_err(|_| DisplayError::Gpio)?;

        // Wake the SPI interface with a throwaway byte.
        self.transaction(None, &[0x55])?;

        self.command(Command::SoftwareReset, &[])?;
        self.delay.delay_ms(150);

        for &(cmd, params) in INIT_SEQUENCE {
            self.transaction(Some(cmd), params)?;
        }

        self.command(Command::SleepOut, &[])?;
        self.delay.delay_ms(120);
        self.display_on()?;
        self.set_rotation(Rotation::Vertical2)?;

        #[cfg(feature = "defmt")]
        defmt::info!("ili9341: ready {}x{}", self.width, self.height);
        Ok(())
    }

    /// Display on (waits 10 ms).
    pub fn display_on(&mut self) -> Result<(), DisplayError> {
        self.command(Command::DisplayOn, &[])?;
        self.delay.delay_ms(10);
        Ok(())
    }

    /// Display off. Frame memory is kept.
    pub fn display_off(&mut self) -> Result<(), DisplayError> {
        self.command(Command::DisplayOff, &[])
    }

    /// Select a rotation preset and update the logical dimensions.
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), DisplayError> {
        self.command(Command::MemoryAccessControl, &[])?;
        self.delay.delay_ms(1);
        self.transaction(None, &[rotation.madctl()])?;
        (self.width, self.height) = rotation.dimensions();
        Ok(())
    }

    /// Raw-index variant of [`set_rotation`](Self::set_rotation); values
    /// above 3 are ignored.
    pub fn set_rotation_raw(&mut self, raw: u8) -> Result<(), DisplayError> {
        match Rotation::from_raw(raw) {
            Some(rotation) => self.set_rotation(rotation),
            None => Ok(()),
        }
    }

    /// Select an orientation preset and update the logical dimensions.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<(), DisplayError> {
        self.command(Command::MemoryAccessControl, &[orientation.madctl()])?;
        (self.width, self.height) = orientation.dimensions();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pixel windows
    // -----------------------------------------------------------------------

    /// Set the inclusive column/row window for the next memory write.
    pub fn set_address(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) -> Result<(), DisplayError> {
        let [x1h, x1l] = x1.to_be_bytes();
        let [x2h, x2l] = x2.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        let [y2h, y2l] = y2.to_be_bytes();
        self.command(Command::ColumnAddressSet, &[x1h, x1l, x2h, x2l])?;
        self.command(Command::PageAddressSet, &[y1h, y1l, y2h, y2l])
    }

    /// Memory-write `pixels` copies of `color` into the current window.
    ///
    /// The data phase is one chip-select frame made of full
    /// `min(2·pixels, BURST_MAX)`-byte blocks followed by the remainder.
    /// With `pixels == 0` only the memory-write command goes out.
    pub fn draw_color_burst(&mut self, color: u16, pixels: u32) -> Result<(), DisplayError> {
        self.command(Command::MemoryWrite, &[])?;

        let total = usize::try_from(pixels)
            .unwrap_or(usize::MAX)
            .saturating_mul(2);
        if total == 0 {
            return Ok(());
        }
        let chunk = total.min(BURST_MAX);
        let [hi, lo] = color.to_be_bytes();
        for pair in self.burst.chunks_exact_mut(2) {
            if let [h, l] = pair {
                *h = hi;
                *l = lo;
            }
        }
        let repeats = total.checked_div(chunk).unwrap_or(0);
        let tail = total.checked_rem(chunk).unwrap_or(0);

        self.cs.set_low().map_err(|_| DisplayError::Gpio)?;
        let sent = Self::stream_burst(
            &mut self.spi,
            &mut self.dc,
            self.burst.get(..chunk).unwrap_or(&[]),
            repeats,
            self.burst.get(..tail).unwrap_or(&[]),
        );
        self.end_transaction(sent)
    }

    fn stream_burst(
        spi: &mut SPI,
        dc: &mut DC,
        block: &[u8],
        repeats: usize,
        tail: &[u8],
    ) -> Result<(), DisplayError> {
        dc.set_high().map_err(|_| DisplayError::Gpio)?;
        for _ in 0..repeats {
            spi.write(block).map_err(|_| DisplayError::Communication)?;
        }
        if !tail.is_empty() {
            spi.write(tail).map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    /// Fill the part of a rectangle that lies on screen.
    pub(crate) fn fill_clipped(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: u16,
    ) -> Result<(), DisplayError> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(i32::from(self.width));
        let y1 = y.saturating_add(h).min(i32::from(self.height));
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }
        let (x0, y0, x1, y1) = (to_u16(x0), to_u16(y0), to_u16(x1), to_u16(y1));
        self.set_address(x0, y0, x1.saturating_sub(1), y1.saturating_sub(1))?;
        let pixels = u32::from(x1.saturating_sub(x0))
            .saturating_mul(u32::from(y1.saturating_sub(y0)));
        self.draw_color_burst(color, pixels)
    }

    /// Plot one pixel if it lies on screen.
    pub(crate) fn pixel_clipped(&mut self, x: i32, y: i32, color: u16) -> Result<(), DisplayError> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return Ok(());
        }
        self.draw_pixel(to_u16(x), to_u16(y), color)
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    /// Fill the whole screen.
    pub fn fill_screen(&mut self, color: u16) -> Result<(), DisplayError> {
        self.set_address(
            0,
            0,
            self.width.saturating_sub(1),
            self.height.saturating_sub(1),
        )?;
        self.draw_color_burst(
            color,
            u32::from(self.width).saturating_mul(u32::from(self.height)),
        )
    }

    /// Filled rectangle, clipped to the screen.
    pub fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        color: u16,
    ) -> Result<(), DisplayError> {
        self.fill_clipped(
            i32::from(x),
            i32::from(y),
            i32::from(w),
            i32::from(h),
            color,
        )
    }

    /// Horizontal line of `w` pixels starting at `(x, y)`.
    pub fn draw_hline(&mut self, x: u16, y: u16, w: u16, color: u16) -> Result<(), DisplayError> {
        self.fill_rect(x, y, w, 1, color)
    }

    /// Vertical line of `h` pixels starting at `(x, y)`.
    pub fn draw_vline(&mut self, x: u16, y: u16, h: u16, color: u16) -> Result<(), DisplayError> {
        self.fill_rect(x, y, 1, h, color)
    }

    /// One-pixel rectangle outline.
    pub fn draw_rect(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        color: u16,
    ) -> Result<(), DisplayError> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        let right = x.saturating_add(w.saturating_sub(1));
        let bottom = y.saturating_add(h.saturating_sub(1));
        self.draw_hline(x, y, w, color)?;
        self.draw_hline(x, bottom, w, color)?;
        self.draw_vline(x, y, h, color)?;
        self.draw_vline(right, y, h, color)
    }

    /// Single RGB565 pixel. Off-screen coordinates are ignored.
    pub fn draw_pixel(&mut self, x: u16, y: u16, color: u16) -> Result<(), DisplayError> {
        if x >= self.width || y >= self.height {
            return Ok(());
        }
        self.set_address(x, y, x, y)?;
        self.command(Command::MemoryWrite, &color.to_be_bytes())
    }

    /// Single pixel from 8-bit RGB components.
    pub fn draw_pixel_rgb(
        &mut self,
        x: u16,
        y: u16,
        r: u8,
        g: u8,
        b: u8,
    ) -> Result<(), DisplayError> {
        self.draw_pixel(x, y, super::rgb565(r, g, b))
    }

    /// Copy raw big-endian RGB565 bytes into the `w`×`h` window at `(x, y)`.
    ///
    /// `image` must hold exactly `w·h·2` bytes.
    pub fn draw_image(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        image: &[u8],
    ) -> Result<(), DisplayError> {
        let expected = usize::from(w)
            .saturating_mul(usize::from(h))
            .saturating_mul(2);
        if image.len() != expected {
            return Err(DisplayError::InvalidBuffer);
        }
        if expected == 0 {
            return Ok(());
        }
        self.set_address(
            x,
            y,
            x.saturating_add(w.saturating_sub(1)),
            y.saturating_add(h.saturating_sub(1)),
        )?;
        self.command(Command::MemoryWrite, image)
    }
}

// ---------------------------------------------------------------------------
// embedded-graphics
// ---------------------------------------------------------------------------

impl<SPI, CS, DC, RST, D> DrawTarget for Ili9341<SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.pixel_clipped(point.x, point.y, color.into_storage())?;
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &embedded_graphics::primitives::Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let w = i32::try_from(area.size.width).unwrap_or(i32::MAX);
        let h = i32::try_from(area.size.height).unwrap_or(i32::MAX);
        self.fill_clipped(area.top_left.x, area.top_left.y, w, h, color.into_storage())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_screen(color.into_storage())
    }
}

impl<SPI, CS, DC, RST, D> OriginDimensions for Ili9341<SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use platform::mocks::{BusLog, MockOutputPin, MockSpiBus};

    type TestTft = Ili9341<MockSpiBus, MockOutputPin, MockOutputPin, MockOutputPin, NoopDelay>;

    fn tft() -> (TestTft, BusLog) {
        let log = BusLog::new();
        let tft = Ili9341::new(
            log.spi(),
            log.pin("cs"),
            log.pin("dc"),
            log.pin("rst"),
            NoopDelay::new(),
        );
        (tft, log)
    }

    #[test]
    fn init_sends_reset_payload_then_wakes() {
        let (mut tft, log) = tft();
        tft.init().unwrap();

        let cmds: Vec<u8> = log.commands("dc").iter().map(|(c, _)| *c).collect();
        assert_eq!(cmds.first(), Some(&0x01), "software reset must lead");
        let sleep_out = cmds.iter().position(|&c| c == 0x11).unwrap();
        assert_eq!(
            cmds.get(sleep_out + 1),
            Some(&0x29),
            "display on follows sleep out"
        );
        assert_eq!(cmds.last(), Some(&0x36), "init ends with the rotation");
        assert_eq!(cmds.len(), 1 + INIT_SEQUENCE.len() + 3);
        assert_eq!(
            log.commands("dc").last().unwrap().1,
            vec![0x88],
            "default rotation is Vertical2"
        );
        assert!(log.flushed_before_release("cs"));
    }

    #[test]
    fn set_address_is_big_endian() {
        let (mut tft, log) = tft();
        tft.set_address(0x0102, 0x0304, 0x0506, 0x0708).unwrap();
        assert_eq!(
            log.commands("dc"),
            vec![
                (0x2A, vec![0x01, 0x02, 0x05, 0x06]),
                (0x2B, vec![0x03, 0x04, 0x07, 0x08]),
            ]
        );
    }

    #[test]
    fn burst_splits_into_blocks_and_remainder() {
        let (mut tft, log) = tft();
        tft.draw_color_burst(0xF800, 300).unwrap();

        let writes: Vec<usize> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                platform::mocks::BusEvent::Write(b) => Some(b.len()),
                _ => None,
            })
            .collect();
        assert_eq!(writes, vec![1, 500, 100], "600 bytes = one 500-byte block + 100");

        let frame = log.cs_frames("cs").pop().unwrap();
        assert_eq!(frame.len(), 600);
        assert!(frame.chunks(2).all(|p| p == [0xF8, 0x00]));
    }

    #[test]
    fn zero_pixel_burst_sends_only_the_command() {
        let (mut tft, log) = tft();
        tft.draw_color_burst(0xFFFF, 0).unwrap();
        assert_eq!(log.written(), vec![0x2C]);
    }

    #[test]
    fn rotation_updates_dimensions() {
        let (mut tft, log) = tft();
        tft.set_rotation(Rotation::Horizontal1).unwrap();
        assert_eq!((tft.width(), tft.height()), (320, 240));
        assert_eq!(log.written(), vec![0x36, 0x28]);

        log.clear();
        tft.set_rotation_raw(7).unwrap();
        assert!(log.written().is_empty(), "invalid rotation is a no-op");
        assert_eq!((tft.width(), tft.height()), (320, 240));

        tft.set_orientation(Orientation::PortraitInverted).unwrap();
        assert_eq!((tft.width(), tft.height()), (240, 320));
        assert_eq!(log.commands("dc"), vec![(0x36, vec![0xC8])]);
    }

    #[test]
    fn pixel_outside_screen_is_ignored() {
        let (mut tft, log) = tft();
        tft.draw_pixel(240, 0, 0xFFFF).unwrap();
        tft.draw_pixel(0, 320, 0xFFFF).unwrap();
        assert!(log.events().is_empty());

        tft.draw_pixel_rgb(1, 2, 0xFF, 0, 0).unwrap();
        assert_eq!(
            log.commands("dc"),
            vec![
                (0x2A, vec![0, 1, 0, 1]),
                (0x2B, vec![0, 2, 0, 2]),
                (0x2C, vec![0xF8, 0x00]),
            ]
        );
    }

    #[test]
    fn fill_rect_is_clipped_to_screen() {
        let (mut tft, log) = tft();
        tft.fill_rect(230, 310, 20, 20, 0x0001).unwrap();
        let cmds = log.commands("dc");
        assert_eq!(cmds.first().unwrap(), &(0x2A, vec![0, 230, 0, 239]));
        assert_eq!(cmds.get(1).unwrap(), &(0x2B, vec![0x01, 0x36, 0x01, 0x3F]));
        assert_eq!(cmds.get(2).unwrap().1.len(), 10 * 10 * 2);
    }

    #[test]
    fn draw_image_checks_buffer_length() {
        let (mut tft, log) = tft();
        assert_eq!(
            tft.draw_image(0, 0, 2, 2, &[0; 7]),
            Err(DisplayError::InvalidBuffer)
        );
        assert!(log.events().is_empty());

        tft.draw_image(10, 20, 2, 1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(
            log.commands("dc").last().unwrap(),
            &(0x2C, vec![1, 2, 3, 4])
        );
    }

    #[test]
    fn embedded_graphics_fill_goes_through_burst() {
        let (mut tft, log) = tft();
        Rectangle::new(Point::new(-5, 0), Size::new(10, 2))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
            .draw(&mut tft)
            .unwrap();
        let cmds = log.commands("dc");
        assert_eq!(cmds.first().unwrap(), &(0x2A, vec![0, 0, 0, 4]));
        assert_eq!(cmds.get(2).unwrap().1, [0x00, 0x1F].repeat(10));
    }

    #[test]
    fn bus_failure_still_releases_chip_select() {
        let (mut tft, log) = tft();
        log.set_failing(true);
        assert_eq!(
            tft.display_off(),
            Err(DisplayError::Communication)
        );
        log.set_failing(false);
        assert_eq!(
            log.events().last(),
            Some(&platform::mocks::BusEvent::Pin {
                name: "cs",
                high: true
            })
        );
    }
}
