//! Hardware boot sequence for the MDS peripheral board.
//!
//! Initialization order (order matters for correctness):
//!   1. RCC: PLL1 system clock, PLL1Q for SDMMC1, PLL2R for QUADSPI, HSI48
//!   2. Status LEDs (the red LED reports later init failures)
//!   3. Real-time tick task (heartbeat on the green LED)
//!   4. Input engine installed, then EXTI and debounce timer tasks spawned
//!   5. Buses and peripherals: TFT, OLED, sensor, LED matrix, WS2812, flash
//!   6. Main loop
//!
//! Everything except [`build_embassy_config`] is pure data so the timing
//! arithmetic can be checked on the host.

use platform::qspi::{validate_qspi_prescaler, QSPI_PRESCALER};

/// Ordered list of boot steps, logged at start-up.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. RCC: PLL1 400 MHz sys, PLL1Q 200 MHz SDMMC, PLL2R 200 MHz QUADSPI, HSI48",
    "2. Status LEDs: all off",
    "3. Realtime: 1 ms tick task, heartbeat on green",
    "4. Input: engine installed before EXTI + debounce timer tasks",
    "5. Peripherals: TFT, OLED, AHT20, LED matrix, WS2812, W25Qxx",
    "6. Main loop",
];

/// AHB clock feeding the QUADSPI kernel (PLL2R).
pub const QSPI_KERNEL_HZ: u32 = 200_000_000;

/// Timer clock of TIM1 (APB2 100 MHz, doubled because APB2 is divided).
pub const TIM1_CLOCK_HZ: u32 = 200_000_000;

/// WS2812 bit rate.
pub const WS2812_BIT_HZ: u32 = 800_000;

/// SPI1 clock for the ILI9341.
pub const TFT_SPI_HZ: u32 = 20_000_000;

/// SPI4 clock for the MAX7219 (the chip accepts at most 10 MHz).
pub const MATRIX_SPI_HZ: u32 = 5_000_000;

/// Highest SPI clock the MAX7219 accepts.
pub const MATRIX_SPI_MAX_HZ: u32 = 10_000_000;

/// I2C clock for the OLED and the AHT20.
pub const I2C_HZ: u32 = 400_000;

/// SD card clock after identification.
pub const SDMMC_HZ: u32 = 25_000_000;

/// Auto-reload value giving one WS2812 bit per timer period.
///
/// One period lasts `ARR + 1` ticks.
pub fn ws2812_period(timer_hz: u32, bit_hz: u32) -> u32 {
    timer_hz
        .checked_div(bit_hz)
        .map_or(0, |ticks| ticks.saturating_sub(1))
}

/// QUADSPI clock produced by [`QSPI_PRESCALER`] from [`QSPI_KERNEL_HZ`].
pub fn qspi_clock_hz() -> Result<u32, &'static str> {
    validate_qspi_prescaler(QSPI_KERNEL_HZ, QSPI_PRESCALER)
}

/// Build the `embassy_stm32::Config` with the RCC settings for the board.
///
/// # Clock Sources
///
/// | Peripheral | Required source | Reason |
/// |---|---|---|
/// | SDMMC1 | PLL1Q + HSI48 | embassy-stm32 issue #3049: silent lockup without HSI48 |
/// | QUADSPI | PLL2R | 200 MHz kernel, divided by the QSPI prescaler |
/// | TIM1 | APB2 ×2 | 200 MHz, WS2812 PWM |
///
/// # Clock Tree (HSI → 400 MHz core)
///
/// HSI (64 MHz) → PLL1 (prediv=4, mul=50) → PLL1_P = 400 MHz (sys)
/// AHB prescaler: DIV2 → 200 MHz
/// APB1/2/3/4:    DIV2 → 100 MHz
/// PLL1Q: DIV4 → 200 MHz  (SDMMC kernel clock)
/// PLL2: source=HSI, prediv=8, mul=100 → VCO=800 MHz
///   PLL2R: DIV4 → 200 MHz  (QUADSPI kernel clock)
///
/// Always call `embassy_stm32::init(build_embassy_config())` from `main.rs`.
/// `Default::default()` leaves HSI48 disabled and SDMMC1 hangs in
/// `init_card()` without an error.
#[cfg(feature = "hardware")]
pub fn build_embassy_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();

    config.rcc.hsi = Some(HSIPrescaler::DIV1);
    config.rcc.csi = true;
    // HSI48: required for SDMMC1, see embassy-stm32 issue #3049.
    config.rcc.hsi48 = Some(Hsi48Config {
        sync_from_usb: false,
    });

    // HSI (64 MHz) / 4 = 16 MHz × 50 = 800 MHz VCO
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL50,
        divp: Some(PllDiv::DIV2), // 400 MHz, system clock
        divq: Some(PllDiv::DIV4), // 200 MHz, SDMMC
        divr: None,
    });

    // HSI (64 MHz) / 8 = 8 MHz × 100 = 800 MHz VCO
    config.rcc.pll2 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV8,
        mul: PllMul::MUL100,
        divp: None,
        divq: None,
        divr: Some(PllDiv::DIV4), // 200 MHz, QUADSPI
    });

    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV2;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.apb3_pre = APBPrescaler::DIV2;
    config.rcc.apb4_pre = APBPrescaler::DIV2;
    config.rcc.voltage_scale = VoltageScale::Scale1;

    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::led::ws2812::bit_duties;

    #[test]
    fn clocks_come_before_everything_else() {
        assert!(BOOT_SEQUENCE_STEPS[0].contains("RCC"));
        let input = BOOT_SEQUENCE_STEPS
            .iter()
            .position(|s| s.contains("Input"))
            .unwrap();
        let leds = BOOT_SEQUENCE_STEPS
            .iter()
            .position(|s| s.contains("Status LEDs"))
            .unwrap();
        assert!(leds < input, "status LEDs must be usable before input init");
    }

    #[test]
    fn ws2812_period_matches_800khz() {
        let period = ws2812_period(TIM1_CLOCK_HZ, WS2812_BIT_HZ);
        assert_eq!(period, 249, "200 MHz / 800 kHz = 250 ticks per bit");
        let (zero, one) = bit_duties(period);
        assert_eq!((zero, one), (83, 167), "2/3 of 250 ticks rounds up");
        assert_eq!(ws2812_period(TIM1_CLOCK_HZ, 0), 0, "no bit rate, no period");
    }

    #[test]
    fn bus_clocks_stay_within_device_limits() {
        assert!(MATRIX_SPI_HZ <= MATRIX_SPI_MAX_HZ);
        assert_eq!(qspi_clock_hz(), Ok(100_000_000));
    }
}
