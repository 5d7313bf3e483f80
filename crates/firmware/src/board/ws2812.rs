//! [`PwmDma`] for the WS2812 on TIM1 channel 1 (PE9).
//!
//! TIM1 runs as a plain PWM timer; every update event requests one DMA
//! transfer into CCR1, so each period carries one duty value. The transfer
//! itself runs in [`ws2812_dma_task`]: [`Ws2812Pwm::start`] hands it a copy
//! of the frame, the task moves it into a DMA-reachable buffer in AXI SRAM
//! and signals the driver's [`TransferFlag`] when the DMA completes.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_stm32::dma::{Transfer, TransferOptions};
use embassy_stm32::pac;
use embassy_stm32::peripherals::DMA1_CH2;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use platform::{PwmDma, TransferFlag};

use crate::dma::Align32;
use crate::led::ws2812::FRAME_LEN;

/// DMAMUX1 request line of the TIM1 update event.
const TIM1_UP_REQUEST: u8 = 15;

static FRAME: Signal<CriticalSectionRawMutex, [u16; FRAME_LEN]> = Signal::new();
static BUSY: AtomicBool = AtomicBool::new(false);

/// Source of the running transfer. Only [`ws2812_dma_task`] touches it.
#[link_section = ".axisram"]
static mut DUTY_BUFFER: Align32<[u16; FRAME_LEN]> = Align32([0; FRAME_LEN]);

/// Errors from [`Ws2812Pwm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Ws2812DmaError {
    /// The previous frame is still being streamed.
    Busy,
    /// The frame is longer than the DMA buffer.
    FrameTooLong,
}

/// TIM1 CH1 fed by [`ws2812_dma_task`].
///
/// Configure TIM1 for PWM on channel 1 (e.g. with `SimplePwm`) before
/// creating this.
#[derive(Debug, Default)]
pub struct Ws2812Pwm;

impl Ws2812Pwm {
    /// Adapter over the already configured TIM1.
    pub const fn new() -> Self {
        Self
    }
}

impl PwmDma for Ws2812Pwm {
    type Error = Ws2812DmaError;

    fn period(&self) -> u32 {
        u32::from(pac::TIM1.arr().read().arr())
    }

    fn start(&mut self, duties: &[u16]) -> Result<(), Self::Error> {
        let mut frame = [0u16; FRAME_LEN];
        frame
            .get_mut(..duties.len())
            .ok_or(Ws2812DmaError::FrameTooLong)?
            .copy_from_slice(duties);
        if BUSY.swap(true, Ordering::AcqRel) {
            return Err(Ws2812DmaError::Busy);
        }
        pac::TIM1.dier().modify(|w| w.set_ude(true));
        FRAME.signal(frame);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        pac::TIM1.dier().modify(|w| w.set_ude(false));
        pac::TIM1.ccr(0).write(|w| w.set_ccr(0));
        Ok(())
    }
}

/// Stream each frame handed over by [`Ws2812Pwm::start`] into TIM1 CCR1,
/// then signal `done`.
#[embassy_executor::task]
pub async fn ws2812_dma_task(mut channel: DMA1_CH2, done: &'static TransferFlag) {
    loop {
        let frame = FRAME.wait().await;
        // SAFETY: this task is the only user of DUTY_BUFFER and the previous
        // transfer from it has completed.
        let buffer = unsafe { &mut (*core::ptr::addr_of_mut!(DUTY_BUFFER)).0 };
        *buffer = frame;
        let ccr1 = pac::TIM1.ccr(0).as_ptr().cast::<u16>();
        // SAFETY: `buffer` is not touched again until the transfer has been
        // awaited, and CCR1 accepts half-word writes.
        let transfer = unsafe {
            Transfer::new_write(
                &mut channel,
                TIM1_UP_REQUEST,
                buffer.as_slice(),
                ccr1,
                TransferOptions::default(),
            )
        };
        transfer.await;
        BUSY.store(false, Ordering::Release);
        done.signal();
    }
}
