//! Hardware timer abstraction

/// One-shot timer used to confirm a debounce.
///
/// `start` arms the timer for its configured interval; the board calls the
/// debounce engine's expiry handler from the timer's elapsed interrupt.
/// `stop` disarms it. Both must be callable from interrupt context.
pub trait OneShotTimer {
    /// Error type
    type Error: core::fmt::Debug;

    /// Arm the timer. Restarts the interval if already running.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Disarm the timer.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

impl<T: OneShotTimer + ?Sized> OneShotTimer for &mut T {
    type Error = T::Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        T::start(self)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        T::stop(self)
    }
}
