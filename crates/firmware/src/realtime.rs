//! 1 ms real-time tick and heartbeat

use platform::config::{HEARTBEAT_MS, TICK_MS};

/// Ticks between two heartbeat toggles.
pub const HEARTBEAT_TICKS: u32 = HEARTBEAT_MS / TICK_MS;

/// Tick counter driven from a periodic 1 ms source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Realtime {
    ticks: u32,
}

impl Realtime {
    /// Counter at zero.
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }

    /// Advance by one tick. Returns `true` when the heartbeat LED should
    /// toggle (every [`HEARTBEAT_TICKS`] ticks).
    pub fn on_tick(&mut self) -> bool {
        self.ticks = self.ticks.wrapping_add(1);
        self.ticks.checked_rem(HEARTBEAT_TICKS) == Some(0)
    }

    /// Milliseconds since start, wrapping after ~49 days.
    pub fn uptime_ms(&self) -> u32 {
        self.ticks.wrapping_mul(TICK_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_fires_once_per_second() {
        let mut rt = Realtime::new();
        let fired: Vec<u32> = (0..3000)
            .filter_map(|_| rt.on_tick().then(|| rt.uptime_ms()))
            .collect();
        assert_eq!(fired, vec![1000, 2000, 3000]);
        assert_eq!(rt.uptime_ms(), 3000);
    }
}
