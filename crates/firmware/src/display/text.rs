//! Scaled bitmap text for [`Ili9341`].
//!
//! Glyphs come from `embedded_graphics::mono_font`. Each lit glyph pixel is
//! drawn as a `scale`×`scale` block; background pixels are left untouched.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::ili9341::Ili9341;
use super::DisplayError;

/// Renders one glyph onto the TFT, scaling each pixel into a block.
struct GlyphCanvas<'a, SPI, CS, DC, RST, D> {
    tft: &'a mut Ili9341<SPI, CS, DC, RST, D>,
    origin: Point,
    scale: i32,
    color: u16,
    cell: Size,
}

impl<SPI, CS, DC, RST, D> DrawTarget for GlyphCanvas<'_, SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    type Color = BinaryColor;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if color.is_off() {
                continue;
            }
            let x = self.origin.x.saturating_add(p.x.saturating_mul(self.scale));
            let y = self.origin.y.saturating_add(p.y.saturating_mul(self.scale));
            self.tft
                .fill_clipped(x, y, self.scale, self.scale, self.color)?;
        }
        Ok(())
    }
}

impl<SPI, CS, DC, RST, D> OriginDimensions for GlyphCanvas<'_, SPI, CS, DC, RST, D> {
    fn size(&self) -> Size {
        self.cell
    }
}

impl<SPI, CS, DC, RST, D> Ili9341<SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    /// Draw `c` with its top-left corner at `(x, y)`.
    ///
    /// Control characters render as a space. A `scale` of 0 draws nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_char(
        &mut self,
        c: char,
        x: u16,
        y: u16,
        color: u16,
        scale: u16,
        font: &MonoFont<'_>,
    ) -> Result<(), DisplayError> {
        if scale == 0 {
            return Ok(());
        }
        let c = if c < ' ' { ' ' } else { c };
        let mut utf8 = [0u8; 4];
        let glyph: &str = c.encode_utf8(&mut utf8);

        let mut canvas = GlyphCanvas {
            tft: self,
            origin: Point::new(i32::from(x), i32::from(y)),
            scale: i32::from(scale),
            color,
            cell: font.character_size,
        };
        Text::with_baseline(
            glyph,
            Point::zero(),
            MonoTextStyle::new(font, BinaryColor::On),
            Baseline::Top,
        )
        .draw(&mut canvas)?;
        Ok(())
    }

    /// Draw `text` left to right from `(x, y)`.
    ///
    /// Stops before the first glyph that would cross the right edge.
    pub fn draw_text(
        &mut self,
        text: &str,
        x: u16,
        y: u16,
        color: u16,
        scale: u16,
        font: &MonoFont<'_>,
    ) -> Result<(), DisplayError> {
        let glyph_w = u16::try_from(font.character_size.width)
            .unwrap_or(u16::MAX)
            .saturating_mul(scale);
        let advance = u16::try_from(
            font.character_size
                .width
                .saturating_add(font.character_spacing),
        )
        .unwrap_or(u16::MAX)
        .saturating_mul(scale);

        let mut cursor = x;
        for c in text.chars() {
            if cursor.saturating_add(glyph_w) > self.width() {
                break;
            }
            self.draw_char(c, cursor, y, color, scale, font)?;
            cursor = cursor.saturating_add(advance);
        }
        Ok(())
    }
}
