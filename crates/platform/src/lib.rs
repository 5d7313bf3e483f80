//! Hardware Abstraction Layer for the MDS peripheral board
//!
//! Board-level types and the trait seams the drivers in the `firmware` crate
//! are written against. Standard buses come from `embedded-hal` 1.0
//! (`SpiBus`, `I2c`, `InputPin`, `OutputPin`, `DelayNs`); this crate adds
//! what embedded-hal does not cover:
//!
//! - [`qspi::QspiBus`]: indirect-mode QUADSPI command descriptors
//! - [`dma::PwmDma`] + [`dma::TransferFlag`]: PWM duty streaming by DMA
//! - [`timer::OneShotTimer`]: debounce confirmation timer
//! - [`storage::Volume`]: mountable FAT volume with file handles
//!
//! plus the board description ([`gpio::Pin`], [`input::InputChannel`],
//! [`config`]).
//!
//! # Features
//!
//! - `std`: host-side mocks in [`mocks`] for downstream test suites
//! - `defmt`: `defmt::Format` derives on all platform types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod config;
pub mod dma;
pub mod gpio;
pub mod input;
pub mod qspi;
pub mod storage;
pub mod storage_sdmmc;
pub mod timer;

pub mod mocks;

pub use dma::{PwmDma, TransferFlag};
pub use gpio::{InterruptMode, Pin, PinState, Polarity, Port};
pub use input::{InputChannel, CHANNEL_COUNT};
pub use qspi::{QspiBus, QspiCommand, QspiLines};
pub use storage::{OpenMode, Volume};
pub use timer::OneShotTimer;
