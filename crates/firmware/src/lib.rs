//! MDS Peripheral Board Firmware
//!
//! Drivers and input handling for the STM32H7 demo board: joystick and user
//! button, ILI9341 TFT, SSD1306 OLED, AHT20 climate sensor, MAX7219 LED
//! matrix, WS2812 RGB LED, W25Qxx QSPI flash and FAT images on the SD card.
//!
//! # Architecture
//!
//! ```text
//! Application (main.rs, app)
//!         ↓
//! Drivers (display, led, sensor, flash, input)
//!         ↓
//! embedded-hal 1.0 + platform traits (QspiBus, PwmDma, OneShotTimer, Volume)
//!         ↓
//! Board adapters (board, input::hardware) over Embassy STM32
//! ```
//!
//! Every driver is generic over the bus traits, so all of them run on the
//! host against `embedded-hal-mock` and `platform::mocks`.
//!
//! # Features
//!
//! - `hardware` - Build for the STM32H7 target (Embassy, defmt, board adapters)
//! - `std` - `std::error::Error` impls for the error types
//! - `defmt-logging` - defmt logs without the rest of the hardware stack
//!
//! # Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for driver code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::unused_self)]
#![allow(clippy::unused_async)]

pub mod app;
pub mod boot;
pub mod display;
pub mod dma;
pub mod flash;
pub mod input;
pub mod led;
pub mod realtime;
pub mod sensor;

/// Embassy adapters for the QSPI flash, the WS2812 DMA stream and the SD card.
#[cfg(feature = "hardware")]
pub mod board;

// Re-export key types
pub use display::{DisplayError, Ili9341, ImageError, Orientation, Rotation, Ssd1306};
pub use flash::{FlashError, W25qxx};
pub use input::{InputBuilder, InputEngine};
pub use led::{Led, Max7219, MatrixError, StatusLeds, Ws2812, Ws2812Error};
pub use realtime::Realtime;
pub use sensor::{Aht20, Measurement, SensorError};
