//! Simulation tick clock

/// Largest delta a single tick may advance by, in seconds
pub const MAX_TICK_DELTA: f32 = 0.1;

/// Counts ticks and clamps frame deltas
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickClock {
    tick: u64,
    delta: f32,
    elapsed: f64,
}

impl TickClock {
    /// Create a clock at tick zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick by a raw frame delta; returns the clamped delta
    pub fn advance(&mut self, raw_delta: f32) -> f32 {
        let delta = if raw_delta.is_finite() {
            raw_delta.clamp(0.0, MAX_TICK_DELTA)
        } else {
            0.0
        };
        self.tick += 1;
        self.delta = delta;
        self.elapsed += f64::from(delta);
        delta
    }

    /// Ticks advanced so far
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Clamped delta of the last tick
    #[must_use]
    pub const fn delta(&self) -> f32 {
        self.delta
    }

    /// Simulated seconds so far
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
