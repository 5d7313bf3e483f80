//! SSD1306 128×64 monochrome OLED over I2C
//!
//! Drawing goes into a local page-organised framebuffer; nothing reaches the
//! panel until [`Ssd1306::update_screen`]. Byte `x + (y / 8)·128` holds
//! column `x` of page `y / 8`, bit `y % 8` is the row within the page.

// Framebuffer and Bresenham arithmetic works on coordinates already bounded
// to 0..=255 in i32, so none of it can overflow.
#![allow(clippy::arithmetic_side_effects)]

use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::i2c::I2c;

use super::DisplayError;

/// 7-bit I2C address.
pub const SSD1306_ADDRESS: u8 = 0x3C;
/// Panel width in pixels.
pub const WIDTH: u8 = 128;
/// Panel height in pixels.
pub const HEIGHT: u8 = 64;
/// Framebuffer size: one bit per pixel.
pub const BUFFER_SIZE: usize = WIDTH as usize * HEIGHT as usize / 8;

const PAGES: u8 = HEIGHT / 8;
const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;

const DISPLAY_OFF: u8 = 0xAE;
const DISPLAY_ON: u8 = 0xAF;
const SET_CONTRAST: u8 = 0x81;
const PAGE_START: u8 = 0xB0;
const LOWER_COLUMN: u8 = 0x00;
const UPPER_COLUMN: u8 = 0x10;

/// Configuration bytes sent between display-off and display-on.
const INIT_SEQUENCE: &[u8] = &[
    0x20, 0x00, // horizontal addressing
    0xB0, // page start 0
    0xC8, // COM scan remapped
    0x00, 0x10, // column 0
    0x40, // start line 0
    0x81, 0xFF, // contrast
    0xA1, // segment remap
    0xA6, // normal (non-inverted)
    0x3F, // multiplex 64
    0xA4, // output follows RAM
    0xD3, 0x00, // no display offset
    0xD5, 0xF0, // oscillator
    0xD9, 0x22, // pre-charge
    0xDA, 0x12, // COM pins
    0xDB, 0x20, // VCOMH 0.77·Vcc
    0x8D, 0x14, // charge pump on
];

/// SSD1306 driver owning its framebuffer.
pub struct Ssd1306<I2C> {
    i2c: I2C,
    buffer: [u8; BUFFER_SIZE],
    cursor_x: u8,
    cursor_y: u8,
    display_on: bool,
}

impl<I2C: I2c> Ssd1306<I2C> {
    /// Wrap `i2c`. Call [`init`](Self::init) before use.
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            buffer: [0; BUFFER_SIZE],
            cursor_x: 0,
            cursor_y: 0,
            display_on: false,
        }
    }

    /// Release the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.i2c
            .write(SSD1306_ADDRESS, &[CONTROL_COMMAND, cmd])
            .map_err(|_| DisplayError::Communication)
    }

    /// Configure the panel, clear it and switch it on.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.set_display_on(false)?;
        for &cmd in INIT_SEQUENCE {
            self.command(cmd)?;
        }
        self.set_display_on(true)?;

        self.fill(BinaryColor::Off);
        self.update_screen()?;
        self.set_cursor(0, 0);

        #[cfg(feature = "defmt")]
        defmt::info!("SSD1306 initialised");
        Ok(())
    }

    /// Push the framebuffer to the panel, page by page.
    pub fn update_screen(&mut self) -> Result<(), DisplayError> {
        let mut frame = [CONTROL_DATA; WIDTH as usize + 1];
        for (page, row) in (0..PAGES).zip(self.buffer.chunks_exact(usize::from(WIDTH))) {
            if let Some(payload) = frame.get_mut(1..) {
                payload.copy_from_slice(row);
            }
            for cmd in [PAGE_START + page, LOWER_COLUMN, UPPER_COLUMN] {
                self.i2c
                    .write(SSD1306_ADDRESS, &[CONTROL_COMMAND, cmd])
                    .map_err(|_| DisplayError::Communication)?;
            }
            self.i2c
                .write(SSD1306_ADDRESS, &frame)
                .map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    /// Switch the panel on (`0xAF`) or off (`0xAE`).
    pub fn set_display_on(&mut self, on: bool) -> Result<(), DisplayError> {
        self.command(if on { DISPLAY_ON } else { DISPLAY_OFF })?;
        self.display_on = on;
        Ok(())
    }

    /// Last state set through [`set_display_on`](Self::set_display_on).
    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    /// Set the contrast register.
    pub fn set_contrast(&mut self, value: u8) -> Result<(), DisplayError> {
        self.command(SET_CONTRAST)?;
        self.command(value)
    }

    /// Framebuffer contents.
    pub fn buffer(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    /// Fill the whole framebuffer.
    pub fn fill(&mut self, color: BinaryColor) {
        self.buffer.fill(if color.is_on() { 0xFF } else { 0x00 });
    }

    /// Set or clear one pixel. Off-panel coordinates are ignored.
    pub fn draw_pixel(&mut self, x: u8, y: u8, color: BinaryColor) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let index = usize::from(x) + usize::from(y / 8) * usize::from(WIDTH);
        let mask = 1u8 << (y % 8);
        if let Some(byte) = self.buffer.get_mut(index) {
            if color.is_on() {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    /// Pixel state, `None` off-panel.
    pub fn pixel(&self, x: u8, y: u8) -> Option<bool> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        let index = usize::from(x) + usize::from(y / 8) * usize::from(WIDTH);
        self.buffer.get(index).map(|b| b & (1 << (y % 8)) != 0)
    }

    /// Bresenham line from `(x1, y1)` to `(x2, y2)`, both ends included.
    pub fn line(&mut self, x1: u8, y1: u8, x2: u8, y2: u8, color: BinaryColor) {
        let (mut x, mut y) = (i32::from(x1), i32::from(y1));
        let (x2, y2) = (i32::from(x2), i32::from(y2));
        let dx = (x2 - x).abs();
        let dy = (y2 - y).abs();
        let sx = if x < x2 { 1 } else { -1 };
        let sy = if y < y2 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            self.plot(x, y, color);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = err * 2;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn plot(&mut self, x: i32, y: i32, color: BinaryColor) {
        if let (Ok(x), Ok(y)) = (u8::try_from(x), u8::try_from(y)) {
            self.draw_pixel(x, y, color);
        }
    }

    /// Rectangle outline through the two corners.
    pub fn draw_rectangle(&mut self, x1: u8, y1: u8, x2: u8, y2: u8, color: BinaryColor) {
        self.line(x1, y1, x2, y1, color);
        self.line(x2, y1, x2, y2, color);
        self.line(x2, y2, x1, y2, color);
        self.line(x1, y2, x1, y1, color);
    }

    /// Solid rectangle through the two corners, in either order.
    pub fn fill_rectangle(&mut self, x1: u8, y1: u8, x2: u8, y2: u8, color: BinaryColor) {
        let (x_start, x_end) = (x1.min(x2), x1.max(x2).min(WIDTH - 1));
        let (y_start, y_end) = (y1.min(y2), y1.max(y2).min(HEIGHT - 1));
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                self.draw_pixel(x, y, color);
            }
        }
    }

    /// Move the text cursor.
    pub fn set_cursor(&mut self, x: u8, y: u8) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    /// Current text cursor.
    pub fn cursor(&self) -> (u8, u8) {
        (self.cursor_x, self.cursor_y)
    }

    /// Draw `c` at the cursor and advance it by one glyph width.
    ///
    /// Glyph pixels take `color`, the rest of the cell the inverse. Only
    /// printable ASCII is accepted, and the whole cell must fit on the panel.
    pub fn write_char(
        &mut self,
        c: char,
        font: &MonoFont<'_>,
        color: BinaryColor,
    ) -> Result<(), DisplayError> {
        if !(' '..='~').contains(&c) {
            return Err(DisplayError::UnsupportedCharacter);
        }
        let cell = font.character_size;
        let right = u32::from(self.cursor_x) + cell.width;
        let bottom = u32::from(self.cursor_y) + cell.height;
        if right > u32::from(WIDTH) || bottom > u32::from(HEIGHT) {
            return Err(DisplayError::OutOfBounds);
        }

        let style = MonoTextStyleBuilder::new()
            .font(font)
            .text_color(color)
            .background_color(color.invert())
            .build();
        let mut utf8 = [0u8; 4];
        let origin = Point::new(i32::from(self.cursor_x), i32::from(self.cursor_y));
        Text::with_baseline(c.encode_utf8(&mut utf8), origin, style, Baseline::Top).draw(self)?;

        self.cursor_x = u8::try_from(right).unwrap_or(WIDTH);
        Ok(())
    }

    /// Write `text` from the cursor, stopping at the first character that
    /// cannot be drawn.
    pub fn write_string(
        &mut self,
        text: &str,
        font: &MonoFont<'_>,
        color: BinaryColor,
    ) -> Result<(), DisplayError> {
        text.chars().try_for_each(|c| self.write_char(c, font, color))
    }
}

impl<I2C: I2c> DrawTarget for Ssd1306<I2C> {
    type Color = BinaryColor;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            self.plot(p.x, p.y, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

impl<I2C> OriginDimensions for Ssd1306<I2C> {
    fn size(&self) -> Size {
        Size::new(u32::from(WIDTH), u32::from(HEIGHT))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_6X10;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    fn cmd(c: u8) -> Transaction {
        Transaction::write(SSD1306_ADDRESS, vec![CONTROL_COMMAND, c])
    }

    fn page_writes(fill: u8) -> Vec<Transaction> {
        let mut data = vec![CONTROL_DATA];
        data.extend(std::iter::repeat(fill).take(128));
        (0..8u8)
            .flat_map(|p| {
                [
                    cmd(0xB0 + p),
                    cmd(0x00),
                    cmd(0x10),
                    Transaction::write(SSD1306_ADDRESS, data.clone()),
                ]
            })
            .collect()
    }

    fn detached() -> Ssd1306<I2cMock> {
        Ssd1306::new(I2cMock::new(&[]))
    }

    fn finish(oled: Ssd1306<I2cMock>) {
        oled.release().done();
    }

    #[test]
    fn init_sends_sequence_then_clears_panel() {
        let mut expected = vec![cmd(0xAE)];
        expected.extend(INIT_SEQUENCE.iter().map(|&c| cmd(c)));
        expected.push(cmd(0xAF));
        expected.extend(page_writes(0x00));

        let mut oled = Ssd1306::new(I2cMock::new(&expected));
        oled.init().unwrap();
        assert!(oled.is_display_on());
        assert_eq!(oled.cursor(), (0, 0));
        finish(oled);
    }

    #[test]
    fn pixel_maps_to_page_byte_and_bit() {
        let mut oled = detached();
        oled.draw_pixel(5, 10, BinaryColor::On);
        assert_eq!(oled.buffer()[5 + 128], 0b0000_0100, "row 10 is page 1 bit 2");
        oled.draw_pixel(5, 10, BinaryColor::Off);
        assert_eq!(oled.buffer()[5 + 128], 0);

        oled.draw_pixel(128, 0, BinaryColor::On);
        oled.draw_pixel(0, 64, BinaryColor::On);
        assert!(oled.buffer().iter().all(|&b| b == 0), "off-panel pixels ignored");
        finish(oled);
    }

    #[test]
    fn update_screen_streams_eight_pages() {
        let mut oled = Ssd1306::new(I2cMock::new(&page_writes(0xFF)));
        oled.fill(BinaryColor::On);
        oled.update_screen().unwrap();
        finish(oled);
    }

    #[test]
    fn line_includes_both_endpoints() {
        let mut oled = detached();
        oled.line(0, 0, 7, 3, BinaryColor::On);
        assert_eq!(oled.pixel(0, 0), Some(true));
        assert_eq!(oled.pixel(7, 3), Some(true));
        let lit = (0..8).flat_map(|x| (0..4).map(move |y| (x, y)))
            .filter(|&(x, y)| oled.pixel(x, y) == Some(true))
            .count();
        assert_eq!(lit, 8, "x-major line lights one pixel per column");
        finish(oled);
    }

    #[test]
    fn rectangles_outline_and_fill() {
        let mut oled = detached();
        oled.draw_rectangle(2, 2, 5, 5, BinaryColor::On);
        assert_eq!(oled.pixel(2, 5), Some(true));
        assert_eq!(oled.pixel(3, 3), Some(false), "outline leaves the inside clear");

        oled.fill_rectangle(5, 5, 2, 2, BinaryColor::On);
        assert_eq!(oled.pixel(3, 3), Some(true), "reversed corners still fill");
        oled.fill_rectangle(120, 60, 255, 255, BinaryColor::On);
        assert_eq!(oled.pixel(127, 63), Some(true), "fill clamps to the panel");
        finish(oled);
    }

    #[test]
    fn write_char_paints_cell_and_advances() {
        let mut oled = detached();
        oled.fill(BinaryColor::On);
        oled.set_cursor(10, 0);
        oled.write_char(' ', &FONT_6X10, BinaryColor::On).unwrap();
        assert_eq!(oled.cursor(), (16, 0));
        assert_eq!(oled.pixel(10, 0), Some(false), "background drawn in the inverse colour");
        assert_eq!(oled.pixel(15, 9), Some(false));
        assert_eq!(oled.pixel(16, 0), Some(true), "cell is exactly 6 px wide");
        finish(oled);
    }

    #[test]
    fn write_char_rejects_unprintable_and_overflowing() {
        let mut oled = detached();
        assert_eq!(
            oled.write_char('\n', &FONT_6X10, BinaryColor::On),
            Err(DisplayError::UnsupportedCharacter)
        );
        oled.set_cursor(123, 0);
        assert_eq!(
            oled.write_char('A', &FONT_6X10, BinaryColor::On),
            Err(DisplayError::OutOfBounds)
        );
        assert_eq!(oled.cursor(), (123, 0), "cursor unchanged on failure");
        finish(oled);
    }

    #[test]
    fn write_string_stops_at_first_failure() {
        let mut oled = detached();
        oled.set_cursor(112, 0);
        let res = oled.write_string("ABCD", &FONT_6X10, BinaryColor::On);
        assert_eq!(res, Err(DisplayError::OutOfBounds));
        assert_eq!(oled.cursor(), (124, 0), "two glyphs fit before the edge");
        finish(oled);
    }

    #[test]
    fn embedded_graphics_draws_into_framebuffer() {
        let mut oled = detached();
        Rectangle::new(Point::new(0, 0), Size::new(2, 9))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut oled)
            .unwrap();
        assert_eq!(oled.buffer()[0], 0xFF);
        assert_eq!(oled.buffer()[128], 0x01);
        assert_eq!(oled.buffer()[2], 0x00);
        finish(oled);
    }

    #[test]
    fn contrast_and_power_commands() {
        let mut oled = Ssd1306::new(I2cMock::new(&[cmd(0x81), cmd(0x7F), cmd(0xAE)]));
        oled.set_contrast(0x7F).unwrap();
        oled.set_display_on(false).unwrap();
        assert!(!oled.is_display_on());
        finish(oled);
    }
}
