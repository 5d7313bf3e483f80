//! WS2812 single-pixel driver
//!
//! The LED is clocked by a PWM channel whose compare register is reloaded by
//! DMA once per bit. A `1` bit is a 2/3-period pulse, a `0` bit a 1/3-period
//! pulse; 50 empty periods after the 24 data bits latch the colour.
//!
//! # Wire order
//!
//! ```text
//! G7 … G0  R7 … R0  B7 … B0   (MSB first)
//! ```

use platform::{PwmDma, TransferFlag};

/// Colour bits per LED.
pub const DATA_BITS: usize = 24;
/// Zero-duty periods appended as the latch/reset code.
pub const RESET_SLOTS: usize = 50;
/// Duty values streamed per [`Ws2812::send`].
pub const FRAME_LEN: usize = DATA_BITS + RESET_SLOTS;
/// Highest accepted brightness level.
pub const MAX_BRIGHTNESS: u8 = 45;

/// Errors from [`Ws2812::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ws2812Error {
    /// The PWM DMA stream could not be started or stopped.
    Dma,
}

impl core::fmt::Display for Ws2812Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Dma => write!(f, "PWM DMA transfer failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Ws2812Error {}

/// Scale one colour component by a brightness level.
///
/// `level` is clamped to `0..=45` and maps to `raw / tan(90° − level)`, so
/// 45 returns `raw` and 0 returns 0.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects
)] // float→u8 `as` saturates
pub fn scale_component(raw: u8, level: u8) -> u8 {
    let angle = f32::from(90u8.saturating_sub(level.min(MAX_BRIGHTNESS))).to_radians();
    (f32::from(raw) / libm::tanf(angle)) as u8
}

/// Duty values for a `0` and a `1` bit at auto-reload value `period`.
///
/// One period lasts `period + 1` ticks; both values round to the nearest tick.
#[allow(clippy::arithmetic_side_effects)] // division by a non-zero constant
pub fn bit_duties(period: u32) -> (u16, u16) {
    let ticks = u64::from(period).saturating_add(1);
    let third = |n: u64| {
        let rounded = n.saturating_mul(ticks).saturating_add(1) / 3;
        u16::try_from(rounded).unwrap_or(u16::MAX)
    };
    (third(1), third(2))
}

/// Fill `frame` with the duty sequence for `grb` (`G<<16 | R<<8 | B`).
#[allow(clippy::arithmetic_side_effects)] // shift amounts stay below 24
pub fn encode(grb: u32, period: u32, frame: &mut [u16; FRAME_LEN]) {
    let (zero, one) = bit_duties(period);
    let (data, reset) = frame.split_at_mut(DATA_BITS);
    for (bit, duty) in (0..DATA_BITS).rev().zip(data.iter_mut()) {
        *duty = if (grb >> bit) & 1 == 1 { one } else { zero };
    }
    reset.fill(0);
}

/// One WS2812 on a DMA-fed PWM channel.
///
/// `flag` must be signalled by the DMA transfer-complete interrupt.
pub struct Ws2812<'a, P> {
    pwm: P,
    flag: &'a TransferFlag,
    /// Raw G, R, B
    raw: [u8; 3],
    /// Brightness-scaled G, R, B
    scaled: [u8; 3],
    level: u8,
    brightness_enabled: bool,
    frame: [u16; FRAME_LEN],
}

impl<'a, P: PwmDma> Ws2812<'a, P> {
    /// Driver starting dark, at full brightness, with scaling enabled.
    pub fn new(pwm: P, flag: &'a TransferFlag) -> Self {
        Self {
            pwm,
            flag,
            raw: [0; 3],
            scaled: [0; 3],
            level: MAX_BRIGHTNESS,
            brightness_enabled: true,
            frame: [0; FRAME_LEN],
        }
    }

    /// Store a colour. It is scaled by the current brightness level.
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.raw = [g, r, b];
        self.rescale();
    }

    /// Set the brightness level (clamped to `0..=45`) and rescale.
    pub fn set_brightness(&mut self, level: u8) {
        self.level = level.min(MAX_BRIGHTNESS);
        self.rescale();
    }

    /// Send raw components (`false`) or brightness-scaled ones (`true`).
    pub fn use_brightness(&mut self, enabled: bool) {
        self.brightness_enabled = enabled;
    }

    fn rescale(&mut self) {
        let level = self.level;
        self.scaled = self.raw.map(|c| scale_component(c, level));
    }

    /// Colour as it will be sent, packed `G<<16 | R<<8 | B`.
    #[allow(clippy::arithmetic_side_effects)] // byte shifts into a u32
    pub fn grb(&self) -> u32 {
        let [g, r, b] = if self.brightness_enabled {
            self.scaled
        } else {
            self.raw
        };
        (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b)
    }

    /// Duty values of the last encoded frame.
    pub fn frame(&self) -> &[u16; FRAME_LEN] {
        &self.frame
    }

    /// Stream the current colour and wait for the DMA to finish.
    ///
    /// An unconfigured timer (period 0) is logged and skipped.
    pub async fn send(&mut self) -> Result<(), Ws2812Error> {
        let period = self.pwm.period();
        if period == 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("WS2812: timer period not configured, frame skipped");
            return Ok(());
        }

        encode(self.grb(), period, &mut self.frame);
        self.pwm.start(&self.frame).map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::error!("WS2812: DMA start failed");
            Ws2812Error::Dma
        })?;
        self.flag.wait().await;
        self.pwm.stop().map_err(|_| Ws2812Error::Dma)
    }
}
