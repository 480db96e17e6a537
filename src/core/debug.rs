//! Debug and statistics module

use std::collections::VecDeque;

/// Tick and AI statistics tracker
#[derive(Debug, Clone)]
pub struct SimStats {
    /// Tick delta history for averaging
    tick_deltas: VecDeque<f32>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Average tick delta in milliseconds
    avg_tick_ms: f32,
    /// Minimum tick delta in milliseconds
    min_tick_ms: f32,
    /// Maximum tick delta in milliseconds
    max_tick_ms: f32,
    /// Total ticks simulated
    total_ticks: u64,
    /// Pathfinder lookups
    pub path_queries: u64,
    /// Lookups answered from the path cache
    pub path_cache_hits: u64,
    /// Nodes expanded by A*
    pub path_expansions: u64,
    /// Agents alerted by sound
    pub sound_alerts: u64,
    /// Shots and bites resolved by agents
    pub enemy_attacks: u64,
}

impl SimStats {
    /// Create a new stats tracker
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_deltas: VecDeque::with_capacity(120),
            max_samples: 120,
            avg_tick_ms: 0.0,
            min_tick_ms: 0.0,
            max_tick_ms: 0.0,
            total_ticks: 0,
            path_queries: 0,
            path_cache_hits: 0,
            path_expansions: 0,
            sound_alerts: 0,
            enemy_attacks: 0,
        }
    }

    /// Record a tick with the given clamped delta in seconds
    pub fn record_tick(&mut self, delta: f32) {
        self.total_ticks += 1;

        if self.tick_deltas.len() >= self.max_samples {
            self.tick_deltas.pop_front();
        }
        self.tick_deltas.push_back(delta);

        self.update_stats();
    }

    fn update_stats(&mut self) {
        if self.tick_deltas.is_empty() {
            return;
        }

        let mut total = 0.0;
        let mut min = f32::MAX;
        let mut max = 0.0_f32;

        for &dt in &self.tick_deltas {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        self.avg_tick_ms = total / self.tick_deltas.len() as f32 * 1000.0;
        self.min_tick_ms = min * 1000.0;
        self.max_tick_ms = max * 1000.0;
    }

    /// Get average tick delta in milliseconds
    #[must_use]
    pub fn avg_tick_ms(&self) -> f32 {
        self.avg_tick_ms
    }

    /// Get minimum tick delta in milliseconds
    #[must_use]
    pub fn min_tick_ms(&self) -> f32 {
        self.min_tick_ms
    }

    /// Get maximum tick delta in milliseconds
    #[must_use]
    pub fn max_tick_ms(&self) -> f32 {
        self.max_tick_ms
    }

    /// Get total ticks simulated
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Fraction of path lookups served from the cache
    #[must_use]
    pub fn cache_hit_rate(&self) -> f32 {
        if self.path_queries == 0 {
            0.0
        } else {
            self.path_cache_hits as f32 / self.path_queries as f32
        }
    }

    /// Get a formatted stats string
    #[must_use]
    pub fn format_stats(&self) -> String {
        format!(
            "Ticks: {} | Tick: {:.2}ms (min: {:.2}, max: {:.2}) | Paths: {} ({:.0}% cached, {} expanded) | Alerts: {} | Attacks: {}",
            self.total_ticks,
            self.avg_tick_ms,
            self.min_tick_ms,
            self.max_tick_ms,
            self.path_queries,
            self.cache_hit_rate() * 100.0,
            self.path_expansions,
            self.sound_alerts,
            self.enemy_attacks
        )
    }
}

impl Default for SimStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut stats = SimStats::new();
        for _ in 0..200 {
            stats.record_tick(0.016);
        }
        stats.record_tick(0.1);

        assert_eq!(stats.total_ticks(), 201);
        approx::assert_relative_eq!(stats.min_tick_ms(), 16.0, epsilon = 1e-3);
        approx::assert_relative_eq!(stats.max_tick_ms(), 100.0, epsilon = 1e-3);
        assert!(stats.avg_tick_ms() > 16.0 && stats.avg_tick_ms() < 17.0);
    }

    #[test]
    fn test_format_stats() {
        let mut stats = SimStats::new();
        stats.path_queries = 4;
        stats.path_cache_hits = 3;
        let line = stats.format_stats();
        assert!(line.contains("75% cached"));
    }
}
