//! Tick performance monitoring
//!
//! Tracks tick durations against the fixed tick budget and provides the
//! admission signals the session layer uses: whether to accept new joins
//! and whether the bot fill may grow.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Performance status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    /// Well inside the tick budget
    Good,
    /// Approaching the budget; stop adding entities
    Warning,
    /// Over budget; shed load where possible
    Critical,
}

impl PerformanceStatus {
    pub fn can_accept_players(&self) -> bool {
        matches!(self, PerformanceStatus::Good)
    }

    pub fn can_add_bots(&self) -> bool {
        matches!(self, PerformanceStatus::Good)
    }
}

/// Rolling window over recent tick durations
pub struct PerformanceMonitor {
    tick_durations: VecDeque<Duration>,
    max_samples: usize,
    target_tick_duration: Duration,
    warning_threshold: f32,
    critical_threshold: f32,
    status: PerformanceStatus,
    tick_start: Option<Instant>,
}

impl PerformanceMonitor {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_durations: VecDeque::with_capacity(64),
            max_samples: 64,
            target_tick_duration: Duration::from_millis(1000 / tick_rate as u64),
            warning_threshold: 0.6,
            critical_threshold: 1.0,
            status: PerformanceStatus::Good,
            tick_start: None,
        }
    }

    pub fn tick_start(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    pub fn tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if self.tick_durations.len() >= self.max_samples {
            self.tick_durations.pop_front();
        }
        self.tick_durations.push_back(elapsed);

        let avg = self.average_tick_duration();
        let budget_used = avg.as_secs_f32() / self.target_tick_duration.as_secs_f32();
        let new_status = if budget_used >= self.critical_threshold {
            PerformanceStatus::Critical
        } else if budget_used >= self.warning_threshold {
            PerformanceStatus::Warning
        } else {
            PerformanceStatus::Good
        };
        if new_status != self.status {
            tracing::warn!(
                ?new_status,
                avg_ms = avg.as_millis() as u64,
                budget_pct = (budget_used * 100.0) as u32,
                "tick performance status changed"
            );
            self.status = new_status;
        }
    }

    pub fn average_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.tick_durations.iter().sum();
        total / self.tick_durations.len() as u32
    }

    pub fn status(&self) -> PerformanceStatus {
        self.status
    }

    /// Fraction of the tick budget the average tick consumes, as a percent
    pub fn budget_used_pct(&self) -> f32 {
        self.average_tick_duration().as_secs_f32()
            / self.target_tick_duration.as_secs_f32()
            * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_good() {
        let monitor = PerformanceMonitor::new(10);
        assert_eq!(monitor.status(), PerformanceStatus::Good);
        assert!(monitor.status().can_accept_players());
        assert_eq!(monitor.average_tick_duration(), Duration::ZERO);
    }

    #[test]
    fn test_fast_ticks_stay_good() {
        let mut monitor = PerformanceMonitor::new(10);
        for _ in 0..10 {
            monitor.tick_start();
            monitor.tick_end();
        }
        assert_eq!(monitor.status(), PerformanceStatus::Good);
    }

    #[test]
    fn test_synthetic_slow_ticks_escalate() {
        let mut monitor = PerformanceMonitor::new(10);
        // Inject durations directly rather than sleeping in tests
        for _ in 0..monitor.max_samples {
            monitor.tick_durations.push_back(Duration::from_millis(120));
        }
        monitor.tick_start();
        monitor.tick_end();
        assert_eq!(monitor.status(), PerformanceStatus::Critical);
        assert!(!monitor.status().can_add_bots());
    }

    #[test]
    fn test_window_is_bounded() {
        let mut monitor = PerformanceMonitor::new(10);
        for _ in 0..200 {
            monitor.tick_start();
            monitor.tick_end();
        }
        assert!(monitor.tick_durations.len() <= monitor.max_samples);
    }
}
