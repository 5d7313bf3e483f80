//! MDS Peripheral Board Firmware - Main Entry Point
//!
//! Hardware-only entry point for the STM32H743ZI demo board.

#![no_std]
#![no_main]

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_executor::Spawner;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::qspi::{Config as QspiConfig, Qspi};
use embassy_stm32::sdmmc::{self, Sdmmc};
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::{Channel, CountingMode};
use embassy_stm32::{bind_interrupts, dma::NoDma, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Delay, Duration, Ticker, Timer};
use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10};
use embedded_graphics::pixelcolor::BinaryColor;

use firmware::app::{self, Interval, HEART, TITLE};
use firmware::board::{ws2812_dma_task, BoardQspi, FixedTime, SdmmcBlocks, Ws2812Pwm};
use firmware::display::color;
use firmware::input::hardware::{board_pins, install, spawn_input_tasks, with_input, SignalTimer};
use firmware::input::InputBuilder;
use firmware::{
    Aht20, Ili9341, Led, Max7219, Orientation, Realtime, Ssd1306, StatusLeds, W25qxx, Ws2812,
};
use platform::config::{DEBOUNCE_MS, SENSOR_REFRESH_MS, TICK_MS};
use platform::storage_sdmmc::SdmmcVolume;
use platform::{InputChannel, TransferFlag};

// Panic handler
use defmt_rtt as _;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    SDMMC1 => sdmmc::InterruptHandler<peripherals::SDMMC1>;
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
    I2C2_EV => i2c::EventInterruptHandler<peripherals::I2C2>;
    I2C2_ER => i2c::ErrorInterruptHandler<peripherals::I2C2>;
});

type BoardLeds = StatusLeds<Output<'static, AnyPin>>;

static LEDS: Mutex<CriticalSectionRawMutex, RefCell<Option<BoardLeds>>> =
    Mutex::new(RefCell::new(None));

/// Milliseconds since the realtime task started.
static UPTIME_MS: AtomicU32 = AtomicU32::new(0);

/// Set by the WS2812 DMA task when a frame has been streamed.
static WS2812_DONE: TransferFlag = TransferFlag::new();

/// Images shown on the TFT at start-up: `(file, x, y, w, h)`.
const IMAGES: [(&str, u16, u16, u16, u16); 2] = [
    ("SIMILOGO.BIN", 30, 120, 100, 79),
    ("TFO_TFT.BIN", 180, 120, 100, 79),
];

fn set_led(led: Led, on: bool) {
    LEDS.lock(|cell| {
        if let Some(leds) = cell.borrow_mut().as_mut() {
            let _ = leds.set(led, on);
        }
    });
}

fn toggle_led(led: Led) {
    LEDS.lock(|cell| {
        if let Some(leds) = cell.borrow_mut().as_mut() {
            let _ = leds.toggle(led);
        }
    });
}

/// Unrecoverable fault: red LED on, interrupts off, stop here.
fn halt(reason: &str) -> ! {
    defmt::error!("halted: {=str}", reason);
    set_led(Led::Red, true);
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::nop();
    }
}

/// 1 ms tick: uptime counter and heartbeat on the green LED.
#[embassy_executor::task]
async fn realtime_task() {
    let mut realtime = Realtime::new();
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(TICK_MS)));
    loop {
        ticker.next().await;
        if realtime.on_tick() {
            toggle_led(Led::Green);
        }
        UPTIME_MS.store(realtime.uptime_ms(), Ordering::Relaxed);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    defmt::info!(
        "{=str} v{=str}",
        platform::config::BOARD_NAME,
        platform::config::FIRMWARE_VERSION
    );
    for step in firmware::boot::BOOT_SEQUENCE_STEPS {
        defmt::debug!("boot: {=str}", step);
    }

    let p = embassy_stm32::init(firmware::boot::build_embassy_config());

    // ── Status LEDs + realtime ──────────────────────────────────────────────
    let mut leds = StatusLeds::new(
        Output::new(p.PD3, Level::Low, Speed::Low).degrade(),
        Output::new(p.PD4, Level::Low, Speed::Low).degrade(),
        Output::new(p.PD5, Level::Low, Speed::Low).degrade(),
    );
    let _ = leds.all_off();
    LEDS.lock(|cell| {
        cell.replace(Some(leds));
    });
    defmt::unwrap!(spawner.spawn(realtime_task()));

    // ── Input ───────────────────────────────────────────────────────────────
    // PE5 shares EXTI line 5 with PB5; it stays a plain input and is polled.
    let _left = Input::new(p.PE5, Pull::Down);
    let engine = InputBuilder::interrupt()
        .debounce_ms(DEBOUNCE_MS)
        .timer(SignalTimer)
        .build(board_pins());
    install(engine);
    let right: ExtiInput<'static, AnyPin> =
        ExtiInput::new(Input::new(p.PB5, Pull::Down).degrade(), p.EXTI5.degrade());
    let up: ExtiInput<'static, AnyPin> =
        ExtiInput::new(Input::new(p.PE15, Pull::Down).degrade(), p.EXTI15.degrade());
    let down: ExtiInput<'static, AnyPin> =
        ExtiInput::new(Input::new(p.PE10, Pull::Down).degrade(), p.EXTI10.degrade());
    let joystick_button: ExtiInput<'static, AnyPin> =
        ExtiInput::new(Input::new(p.PD14, Pull::Down).degrade(), p.EXTI14.degrade());
    // The Nucleo has an external pull-up on the user button.
    let user_button: ExtiInput<'static, AnyPin> =
        ExtiInput::new(Input::new(p.PC13, Pull::None).degrade(), p.EXTI13.degrade());
    let lines = [
        (right, InputChannel::Right),
        (up, InputChannel::Up),
        (down, InputChannel::Down),
        (joystick_button, InputChannel::JoystickButton),
        (user_button, InputChannel::UserButton),
    ];
    defmt::unwrap!(spawn_input_tasks(&spawner, lines, DEBOUNCE_MS));
    defmt::info!("input: interrupt mode, debounce={=u32}ms", DEBOUNCE_MS);

    // ── LED matrix (SPI4) ───────────────────────────────────────────────────
    let mut matrix_spi_config = SpiConfig::default();
    matrix_spi_config.frequency = Hertz(firmware::boot::MATRIX_SPI_HZ);
    let matrix_spi = Spi::new(p.SPI4, p.PE12, p.PE14, p.PE13, NoDma, NoDma, matrix_spi_config);
    let mut matrix = Max7219::new(matrix_spi, Output::new(p.PD6, Level::High, Speed::VeryHigh));
    let matrix_ready = matrix
        .setup()
        .and_then(|()| {
            (0u8..).zip(HEART).try_for_each(|(row, bits)| matrix.draw_row(row, bits))
        })
        .and_then(|()| matrix.set_intensity(2));
    if let Err(e) = matrix_ready {
        defmt::warn!("LED matrix: {}", e);
    }

    // ── OLED (I2C1) ─────────────────────────────────────────────────────────
    let i2c1 = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        NoDma,
        NoDma,
        Hertz(firmware::boot::I2C_HZ),
        Default::default(),
    );
    let mut oled = Ssd1306::new(i2c1);
    match oled.init() {
        Ok(()) => {
            oled.fill(BinaryColor::On);
            oled.set_cursor(25, 0);
            let _ = oled.write_string(TITLE, &FONT_6X10, BinaryColor::Off);
            for (x, y) in app::pattern_pixels(&HEART, 2) {
                oled.draw_pixel(x.saturating_add(80), y.saturating_add(40), BinaryColor::Off);
            }
            if let Err(e) = oled.update_screen() {
                defmt::warn!("OLED: {}", e);
            }
        }
        Err(e) => defmt::warn!("OLED init failed: {}", e),
    }

    // ── TFT (SPI1) ──────────────────────────────────────────────────────────
    let mut tft_spi_config = SpiConfig::default();
    tft_spi_config.frequency = Hertz(firmware::boot::TFT_SPI_HZ);
    let tft_spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, NoDma, NoDma, tft_spi_config);
    let mut tft = Ili9341::new(
        tft_spi,
        Output::new(p.PD8, Level::High, Speed::VeryHigh),
        Output::new(p.PD10, Level::High, Speed::VeryHigh),
        Output::new(p.PD9, Level::High, Speed::VeryHigh),
        Delay,
    );
    let tft_ready = tft
        .init()
        .and_then(|()| tft.display_on())
        .and_then(|()| tft.set_orientation(Orientation::Test))
        .and_then(|()| tft.fill_screen(color::WHITE))
        .and_then(|()| tft.draw_text("DEMO PROGRAMM", 50, 50, color::BLACK, 3, &FONT_5X8));
    if let Err(e) = tft_ready {
        defmt::error!("TFT: {}", e);
        set_led(Led::Red, true);
    }

    // ── SD card images ──────────────────────────────────────────────────────
    let mut sdmmc = Sdmmc::new_4bit(
        p.SDMMC1,
        Irqs,
        p.PC12,
        p.PD2,
        p.PC8,
        p.PC9,
        p.PC10,
        p.PC11,
        Default::default(),
    );
    match sdmmc.init_card(Hertz(firmware::boot::SDMMC_HZ)).await {
        Ok(()) => {
            let mut volume = SdmmcVolume::new(SdmmcBlocks::new(sdmmc), FixedTime);
            for (file, x, y, w, h) in IMAGES {
                if let Err(e) = tft.draw_binary_file(&mut volume, file, x, y, w, h).await {
                    defmt::warn!("image {=str}: {}", file, e);
                }
            }
        }
        Err(e) => defmt::warn!("SD card not ready: {}", defmt::Debug2Format(&e)),
    }

    // ── Climate sensor (I2C2) ───────────────────────────────────────────────
    let i2c2 = I2c::new(
        p.I2C2,
        p.PF1,
        p.PF0,
        Irqs,
        NoDma,
        NoDma,
        Hertz(firmware::boot::I2C_HZ),
        Default::default(),
    );
    let mut sensor = Aht20::new(i2c2, Delay);

    // ── QSPI flash ──────────────────────────────────────────────────────────
    let mut qspi_config = QspiConfig::default();
    qspi_config.prescaler = platform::qspi::QSPI_PRESCALER;
    let qspi = Qspi::new_bk1(
        p.QUADSPI, p.PD11, p.PD12, p.PE2, p.PD13, p.PB2, p.PB6, NoDma, qspi_config,
    );
    let mut flash = W25qxx::new(BoardQspi::new(qspi));
    if let Err(e) = flash.begin() {
        defmt::error!("flash: {}", e);
        set_led(Led::Red, true);
    }

    // ── WS2812 (TIM1 CH1 + DMA) ─────────────────────────────────────────────
    let mut pwm = SimplePwm::new(
        p.TIM1,
        Some(PwmPin::new_ch1(p.PE9, OutputType::PushPull)),
        None,
        None,
        None,
        Hertz(firmware::boot::WS2812_BIT_HZ),
        CountingMode::EdgeAlignedUp,
    );
    pwm.set_duty(Channel::Ch1, 0);
    pwm.enable(Channel::Ch1);
    defmt::unwrap!(spawner.spawn(ws2812_dma_task(p.DMA1_CH2, &WS2812_DONE)));
    let mut rgb = Ws2812::new(Ws2812Pwm::new(), &WS2812_DONE);

    // ── Main loop ───────────────────────────────────────────────────────────
    defmt::info!("Entering main loop");
    let mut sensor_refresh = Interval::new(SENSOR_REFRESH_MS, UPTIME_MS.load(Ordering::Relaxed));

    loop {
        let event = with_input(|engine| {
            engine.poll_left_channel();
            engine.promote_pending_events();
            app::first_event(engine.confirmed_channels())
        })
        .flatten();

        if let Some(channel) = event {
            defmt::info!("input: {=str}", channel.name());
            toggle_led(Led::Yellow);
            let header = tft.fill_rect(0, 0, 320, 40, color::WHITE).and_then(|()| {
                app::event_label(channel).map_or(Ok(()), |label| {
                    tft.draw_text(label, 130, 0, color::BLACK, 3, &FONT_5X8)
                })
            });
            if let Err(e) = header {
                defmt::warn!("TFT: {}", e);
            }
            let pattern = app::matrix_pattern(channel);
            let mut rows = (0u8..).zip(pattern);
            if let Err(e) = rows.try_for_each(|(row, bits)| matrix.draw_row(row, bits)) {
                defmt::warn!("LED matrix: {}", e);
            }
        }

        let now = UPTIME_MS.load(Ordering::Relaxed);
        let [hue, ..] = now.checked_div(20).unwrap_or(0).to_le_bytes();
        let (r, g, b) = app::color_wheel(hue);
        rgb.set_color(r, g, b);
        if let Err(e) = rgb.send().await {
            defmt::error!("WS2812: {}", e);
            halt("WS2812 DMA");
        }

        if sensor_refresh.is_due(now) {
            match sensor.read() {
                Ok(m) => {
                    let (temperature, humidity) = app::format_climate(&m);
                    oled.fill(BinaryColor::On);
                    let lines = [
                        (25, 0, TITLE),
                        (10, 20, temperature.as_str()),
                        (10, 30, humidity.as_str()),
                    ];
                    let drawn = lines.into_iter().try_for_each(|(x, y, text)| {
                        oled.set_cursor(x, y);
                        oled.write_string(text, &FONT_6X10, BinaryColor::Off)
                    });
                    if let Err(e) = drawn.and_then(|()| oled.update_screen()) {
                        defmt::warn!("OLED: {}", e);
                    }
                }
                Err(e) => defmt::warn!("AHT20: {}", e),
            }
        }

        with_input(|engine| engine.reset_confirmed_events());
        Timer::after_millis(1).await;
    }
}
