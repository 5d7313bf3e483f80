//! PWM-over-DMA abstraction
//!
//! The WS2812 path is the only DMA-driven transfer on the board: a timer
//! channel runs in PWM mode and DMA reloads the compare register from a duty
//! buffer once per period. Completion is reported by the transfer-finished
//! interrupt through a [`TransferFlag`].

use core::sync::atomic::{AtomicBool, Ordering};

/// Timer channel whose compare register is fed by DMA.
pub trait PwmDma {
    /// Error type
    type Error: core::fmt::Debug;

    /// Configured auto-reload value (ARR) of the timer.
    ///
    /// One PWM period lasts `period + 1` timer ticks. `0` means the timer
    /// was never configured.
    fn period(&self) -> u32;

    /// Start streaming `duties` into the compare register, one value per
    /// PWM period. Returns once the transfer is running.
    fn start(&mut self, duties: &[u16]) -> Result<(), Self::Error>;

    /// Stop the DMA stream and the PWM output.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Completion flag shared between a DMA-complete interrupt and the task that
/// started the transfer.
///
/// The interrupt calls [`signal`](Self::signal); the task waits with
/// [`wait`](Self::wait), which also clears the flag for the next transfer.
pub struct TransferFlag {
    done: AtomicBool,
}

impl TransferFlag {
    /// New, cleared flag. `const` so it can live in a `static`.
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Mark the transfer finished. Interrupt-safe.
    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// `true` if the transfer has finished and the flag was not yet cleared.
    pub fn is_set(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Clear the flag.
    pub fn clear(&self) {
        self.done.store(false, Ordering::Release);
    }

    /// Wait for completion, yielding to the Embassy executor on each poll so
    /// that other tasks can run while the transfer is in flight. Clears the
    /// flag before returning.
    pub async fn wait(&self) {
        while !self.is_set() {
            embassy_futures::yield_now().await;
        }
        self.clear();
    }
}

impl Default for TransferFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_clear_and_latches_signal() {
        let flag = TransferFlag::new();
        assert!(!flag.is_set());
        flag.signal();
        assert!(flag.is_set());
        flag.signal();
        assert!(flag.is_set(), "a second signal must not toggle the flag");
        flag.clear();
        assert!(!flag.is_set());
    }

    #[tokio::test]
    async fn wait_returns_and_clears_once_signalled() {
        let flag = TransferFlag::new();
        flag.signal();
        flag.wait().await;
        assert!(!flag.is_set(), "wait() must leave the flag cleared");
    }
}
