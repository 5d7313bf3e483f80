//! Embassy adapters that give the drivers their `platform` traits on the
//! STM32H743.
//!
//! | Adapter          | Trait                      | Peripheral            |
//! |------------------|----------------------------|-----------------------|
//! | [`BoardQspi`]    | [`platform::QspiBus`]      | QUADSPI bank 1        |
//! | [`Ws2812Pwm`]    | [`platform::PwmDma`]       | TIM1 CH1 + DMA1 CH2   |
//! | [`SdmmcBlocks`]  | `embedded_sdmmc::BlockDevice` | SDMMC1, 4-bit      |
//!
//! `input::hardware` covers the GPIO side (EXTI tasks, debounce timer).

pub mod qspi;
pub mod sdcard;
pub mod ws2812;

pub use qspi::BoardQspi;
pub use sdcard::{FixedTime, SdmmcBlocks};
pub use ws2812::{ws2812_dma_task, Ws2812DmaError, Ws2812Pwm};
