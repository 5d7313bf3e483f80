//! DMA buffer placement.
//!
//! DMA1/DMA2 on the STM32H743 reach AXI SRAM and SRAM1-4 but not the DTCM,
//! where the linker puts `.bss`, `.data` and every Embassy task future. A
//! buffer handed to a DMA stream must therefore be a `static` placed in
//! `.axisram` (see `memory.x`).
//!
//! The Cortex-M7 D-cache is never enabled by this firmware, so the AXI SRAM
//! copy is always the one the DMA sees. Buffers are still cache-line
//! aligned so that enabling the cache later only needs clean/invalidate
//! calls around each transfer.

/// Cortex-M7 cache line.
pub const CACHE_LINE: usize = 32;

/// `#[repr(align(32))]` wrapper for DMA buffers.
///
/// ```ignore
/// #[link_section = ".axisram"]
/// static mut DUTY_BUFFER: Align32<[u16; FRAME_LEN]> = Align32([0; FRAME_LEN]);
/// ```
#[derive(Clone, Copy)]
#[repr(align(32))]
pub struct Align32<T>(
    /// The buffer.
    pub T,
);

impl<T> Align32<T> {
    /// Wrap `inner`.
    pub const fn new(inner: T) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::led::ws2812::FRAME_LEN;

    #[test]
    fn duty_buffer_starts_on_a_cache_line() {
        let buffer = Align32::new([0u16; FRAME_LEN]);
        assert_eq!(core::mem::align_of_val(&buffer), CACHE_LINE);
        assert_eq!(core::ptr::addr_of!(buffer.0) as usize % CACHE_LINE, 0);
    }
}
