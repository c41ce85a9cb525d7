//! Master clock configuration.

/// Master clock of an emulated drive.
///
/// The real-time loop always ticks at 1MHz wall time. A drive whose CPU
/// runs faster (the 1581 runs at 2MHz) executes several CPU steps per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// CPU clock frequency in Hz.
    pub frequency_hz: u64,
}

impl MasterClock {
    /// 1541: 6502 at 1MHz.
    pub const DRIVE_1541: Self = Self::new(1_000_000);
    /// 1581: 6502 at 2MHz.
    pub const DRIVE_1581: Self = Self::new(2_000_000);

    /// Wall-clock rate of one real-time tick.
    pub const TICK_HZ: u64 = 1_000_000;

    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// CPU steps to run per 1MHz real-time tick (at least one).
    #[must_use]
    pub const fn steps_per_tick(&self) -> u32 {
        let steps = self.frequency_hz / Self::TICK_HZ;
        if steps == 0 { 1 } else { steps as u32 }
    }

    /// Length of one tick in microseconds.
    #[must_use]
    pub const fn tick_period_us(&self) -> u64 {
        1_000_000 / Self::TICK_HZ
    }
}
