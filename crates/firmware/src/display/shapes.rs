//! Circle and rounded-rectangle rasterisation for [`Ili9341`].
//!
//! All shapes decompose into horizontal or vertical spans (or single
//! pixels for outlines), each of which becomes one burst fill. Anything off
//! screen is clipped by the span primitives.

// Coordinates are u16/i16 inputs widened to i32; the midpoint terms stay
// within a few multiples of the radius and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use super::ili9341::Ili9341;
use super::DisplayError;

/// Corner mask for [`Ili9341::fill_circle_helper`]: right-hand quarter.
pub const CORNER_RIGHT: u8 = 0x1;
/// Corner mask for [`Ili9341::fill_circle_helper`]: left-hand quarter.
pub const CORNER_LEFT: u8 = 0x2;

impl<SPI, CS, DC, RST, D> Ili9341<SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    fn hspan(&mut self, x: i32, y: i32, w: i32, color: u16) -> Result<(), DisplayError> {
        self.fill_clipped(x, y, w, 1, color)
    }

    fn vspan(&mut self, x: i32, y: i32, h: i32, color: u16) -> Result<(), DisplayError> {
        self.fill_clipped(x, y, 1, h, color)
    }

    /// One-pixel circle outline (midpoint, eight-way symmetric).
    pub fn draw_circle_outline(
        &mut self,
        cx: u16,
        cy: u16,
        r: u8,
        color: u16,
    ) -> Result<(), DisplayError> {
        let (cx, cy) = (i32::from(cx), i32::from(cy));
        let mut x = i32::from(r);
        let mut y = 0;
        let mut decision = 1 - x;

        while y <= x {
            for (dx, dy) in [
                (x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y),
            ] {
                self.pixel_clipped(cx + dx, cy + dy, color)?;
            }
            y += 1;
            if decision <= 0 {
                decision += 2 * y + 1;
            } else {
                x -= 1;
                decision += 2 * (y - x) + 1;
            }
        }
        Ok(())
    }

    /// Filled circle from midpoint spans of width `2x + 1`.
    pub fn draw_circle(&mut self, cx: u16, cy: u16, r: u8, color: u16) -> Result<(), DisplayError> {
        let (cx, cy) = (i32::from(cx), i32::from(cy));
        let mut x = i32::from(r);
        let mut y = 0;
        let mut decision = 1 - x;

        while y <= x {
            self.hspan(cx - x, cy + y, 2 * x + 1, color)?;
            self.hspan(cx - y, cy + x, 2 * y + 1, color)?;
            self.hspan(cx - x, cy - y, 2 * x + 1, color)?;
            self.hspan(cx - y, cy - x, 2 * y + 1, color)?;
            y += 1;
            if decision <= 0 {
                decision += 2 * y + 1;
            } else {
                x -= 1;
                decision += 2 * (y - x) + 1;
            }
        }
        Ok(())
    }

    /// Filled circle from error-term spans of width `2x`; used for the
    /// corners of [`draw_filled_rounded_rect`](Self::draw_filled_rounded_rect).
    pub fn draw_filled_circle(
        &mut self,
        cx: u16,
        cy: u16,
        radius: u16,
        color: u16,
    ) -> Result<(), DisplayError> {
        let (cx, cy) = (i32::from(cx), i32::from(cy));
        let mut x = i32::from(radius);
        let mut y = 0;
        let mut err = 0;

        while x >= y {
            self.hspan(cx - x, cy + y, 2 * x, color)?;
            self.hspan(cx - x, cy - y, 2 * x, color)?;
            self.hspan(cx - y, cy + x, 2 * y, color)?;
            self.hspan(cx - y, cy - x, 2 * y, color)?;
            if err <= 0 {
                y += 1;
                err += 2 * y + 1;
            }
            if err > 0 {
                x -= 1;
                err -= 2 * x + 1;
            }
        }
        Ok(())
    }

    /// Quarter-circle column fill around `(x0, y0)`.
    ///
    /// `corners` selects [`CORNER_RIGHT`] and/or [`CORNER_LEFT`]; each
    /// vertical span is stretched downwards by `delta` pixels so the two
    /// corners of one side are drawn together.
    pub fn fill_circle_helper(
        &mut self,
        x0: i16,
        y0: i16,
        r: i16,
        corners: u8,
        delta: i16,
        color: u16,
    ) -> Result<(), DisplayError> {
        let (x0, y0, r, delta) = (i32::from(x0), i32::from(y0), i32::from(r), i32::from(delta));
        let mut f = 1 - r;
        let mut ddf_x = 1;
        let mut ddf_y = -2 * r;
        let mut x = 0;
        let mut y = r;

        while x < y {
            if f >= 0 {
                y -= 1;
                ddf_y += 2;
                f += ddf_y;
            }
            x += 1;
            ddf_x += 2;
            f += ddf_x;

            if corners & CORNER_RIGHT != 0 {
                self.vspan(x0 + x, y0 - y, 2 * y + 1 + delta, color)?;
                self.vspan(x0 + y, y0 - x, 2 * x + 1 + delta, color)?;
            }
            if corners & CORNER_LEFT != 0 {
                self.vspan(x0 - x, y0 - y, 2 * y + 1 + delta, color)?;
                self.vspan(x0 - y, y0 - x, 2 * x + 1 + delta, color)?;
            }
        }
        Ok(())
    }

    /// Filled rounded rectangle: centre block plus left and right
    /// quarter-circle columns.
    pub fn fill_round_rect(
        &mut self,
        x: i16,
        y: i16,
        w: i16,
        h: i16,
        r: i16,
        color: u16,
    ) -> Result<(), DisplayError> {
        let (xi, yi, ri) = (i32::from(x), i32::from(y), i32::from(r));
        let (wi, hi) = (i32::from(w), i32::from(h));
        self.fill_clipped(xi + ri, yi, wi - 2 * ri, hi, color)?;

        let delta = i16::try_from(hi - 2 * ri - 1).unwrap_or(0);
        let right = i16::try_from(xi + wi - ri - 1).unwrap_or(i16::MAX);
        let left = i16::try_from(xi + ri).unwrap_or(i16::MAX);
        let top = i16::try_from(yi + ri).unwrap_or(i16::MAX);
        self.fill_circle_helper(right, top, r, CORNER_RIGHT, delta, color)?;
        self.fill_circle_helper(left, top, r, CORNER_LEFT, delta, color)
    }

    /// Filled rounded rectangle built from two overlapping blocks and four
    /// filled circles.
    pub fn draw_filled_rounded_rect(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        radius: u16,
        color: u16,
    ) -> Result<(), DisplayError> {
        let (xi, yi, ri) = (i32::from(x), i32::from(y), i32::from(radius));
        let (wi, hi) = (i32::from(w), i32::from(h));
        self.fill_clipped(xi + ri, yi, wi - 2 * ri, hi, color)?;
        self.fill_clipped(xi, yi + ri, wi, hi - 2 * ri, color)?;

        let left = super::ili9341::to_u16(xi + ri);
        let right = super::ili9341::to_u16(xi + wi - ri - 1);
        let top = super::ili9341::to_u16(yi + ri);
        let bottom = super::ili9341::to_u16(yi + hi - ri - 1);
        self.draw_filled_circle(left, top, radius, color)?;
        self.draw_filled_circle(right, top, radius, color)?;
        self.draw_filled_circle(left, bottom, radius, color)?;
        self.draw_filled_circle(right, bottom, radius, color)
    }

    /// Rounded rectangle in `border` colour with an inset rounded fill.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rounded_rect_with_border(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        radius: u16,
        fill: u16,
        border: u16,
        border_size: u16,
    ) -> Result<(), DisplayError> {
        self.draw_filled_rounded_rect(x, y, w, h, radius, border)?;
        let inset = border_size.saturating_mul(2);
        self.draw_filled_rounded_rect(
            x.saturating_add(border_size),
            y.saturating_add(border_size),
            w.saturating_sub(inset),
            h.saturating_sub(inset),
            radius,
            fill,
        )
    }

    /// Frame of thickness `border_size` drawn outside the `w`×`h` area at
    /// `(x, y)`.
    pub fn draw_border(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        border_size: u16,
        color: u16,
    ) -> Result<(), DisplayError> {
        let (xi, yi, b) = (i32::from(x), i32::from(y), i32::from(border_size));
        let (wi, hi) = (i32::from(w), i32::from(h));
        self.fill_clipped(xi - b, yi - b, wi + 2 * b, b, color)?;
        self.fill_clipped(xi - b, yi + hi, wi + 2 * b, b, color)?;
        self.fill_clipped(xi - b, yi, b, hi, color)?;
        self.fill_clipped(xi + wi, yi, b, hi, color)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use platform::mocks::{BusLog, MockOutputPin, MockSpiBus};
    use std::collections::HashSet;

    /// Pixels covered by every window + memory write in `log`.
    fn coverage(log: &BusLog) -> HashSet<(u16, u16)> {
        let mut covered = HashSet::new();
        let (mut xs, mut ys) = ((0u16, 0u16), (0u16, 0u16));
        for (cmd, data) in log.commands("dc") {
            let word = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
            match cmd {
                0x2A => xs = (word(0), word(2)),
                0x2B => ys = (word(0), word(2)),
                0x2C => {
                    let area = usize::from(xs.1 - xs.0 + 1) * usize::from(ys.1 - ys.0 + 1);
                    assert_eq!(data.len(), area * 2, "memory write must fill its window");
                    for x in xs.0..=xs.1 {
                        for y in ys.0..=ys.1 {
                            covered.insert((x, y));
                        }
                    }
                }
                _ => {}
            }
        }
        covered
    }

    type MockTft = Ili9341<MockSpiBus, MockOutputPin, MockOutputPin, MockOutputPin, NoopDelay>;

    fn tft(log: &BusLog) -> MockTft {
        Ili9341::new(log.spi(), log.pin("cs"), log.pin("dc"), log.pin("rst"), NoopDelay::new())
    }

    #[test]
    fn circle_outline_stays_on_the_ring() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        tft.draw_circle_outline(50, 50, 10, 0xFFFF).unwrap();
        let px = coverage(&log);
        assert!(px.contains(&(60, 50)) && px.contains(&(40, 50)));
        assert!(px.contains(&(50, 60)) && px.contains(&(50, 40)));
        assert!(!px.contains(&(50, 50)), "outline must not fill the centre");
        for &(x, y) in &px {
            let d2 = (i32::from(x) - 50).pow(2) + (i32::from(y) - 50).pow(2);
            assert!((81..=121).contains(&d2), "({x},{y}) is off the ring");
        }
    }

    #[test]
    fn filled_circle_is_solid_and_bounded() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        tft.draw_circle(30, 30, 6, 0x07E0).unwrap();
        let px = coverage(&log);
        for x in 27..=33 {
            assert!(px.contains(&(x, 30)), "centre row gap at x={x}");
        }
        for &(x, y) in &px {
            let d2 = (i32::from(x) - 30).pow(2) + (i32::from(y) - 30).pow(2);
            assert!(d2 <= 49, "({x},{y}) outside radius");
        }
    }

    #[test]
    fn round_rect_skips_the_corners() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        tft.fill_round_rect(0, 0, 20, 10, 3, 0x001F).unwrap();
        let px = coverage(&log);
        assert!(!px.contains(&(0, 0)) && !px.contains(&(19, 0)));
        assert!(!px.contains(&(0, 9)) && !px.contains(&(19, 9)));
        for p in [(0, 5), (19, 5), (3, 0), (10, 5), (17, 9)] {
            assert!(px.contains(&p), "{p:?} should be filled");
        }
        assert!(px.iter().all(|&(x, y)| x < 20 && y < 10));
    }

    #[test]
    fn border_surrounds_the_area() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        tft.draw_border(10, 10, 5, 5, 2, 0xFFFF).unwrap();
        let px = coverage(&log);
        assert_eq!(px.len(), 9 * 9 - 5 * 5);
        assert!(px.contains(&(8, 8)) && px.contains(&(16, 16)));
        assert!(!px.contains(&(12, 12)));
    }

    #[test]
    fn shapes_near_the_origin_are_clipped() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        tft.draw_circle(0, 0, 5, 0xFFFF).unwrap();
        tft.draw_border(0, 0, 4, 4, 3, 0xFFFF).unwrap();
        assert!(coverage(&log).contains(&(0, 0)));
    }
}
