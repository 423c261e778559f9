//! @acp:module "Scroll Tracker"
//! @acp:summary "Scroll velocity from timestamped position samples, split into sequences"
//! @acp:domain personalization
//! @acp:layer logic

use crate::signals::Intent;

/// Mean velocity (px/ms) at or above which a sequence counts as skimming
pub const FAST_SCROLL_VELOCITY: f64 = 2.0;

/// Mean velocity (px/ms) at or below which a sequence counts as reading
pub const SLOW_SCROLL_VELOCITY: f64 = 0.3;

/// Velocity samples needed before a sequence is classified
pub const MIN_VELOCITY_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPattern {
    /// Fast skimming, typical when scanning options side by side
    Skim,
    /// Slow reading of long-form content
    Read,
}

impl ScrollPattern {
    pub fn intent(&self) -> Intent {
        match self {
            ScrollPattern::Skim => Intent::Compare,
            ScrollPattern::Read => Intent::UseCase,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollPattern::Skim => "skim",
            ScrollPattern::Read => "read",
        }
    }
}

/// Tracks one scroll sequence at a time.
///
/// A gap longer than `gap_ms` between two samples (or a sample going back in
/// time) starts a new sequence instead of producing an outlier velocity. Each
/// sequence is classified at most once; samples after that are not kept.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    gap_ms: u64,
    last: Option<(f64, u64)>,
    velocity_sum: f64,
    samples: usize,
    classified: bool,
}

impl ScrollTracker {
    pub fn new(gap_ms: u64) -> Self {
        Self {
            gap_ms,
            last: None,
            velocity_sum: 0.0,
            samples: 0,
            classified: false,
        }
    }

    /// Feed one position sample
    pub fn push(&mut self, position: f64, at_ms: u64) -> Option<ScrollPattern> {
        if !position.is_finite() {
            return None;
        }

        let Some((last_position, last_at)) = self.last.replace((position, at_ms)) else {
            return None;
        };

        if at_ms < last_at || at_ms - last_at > self.gap_ms {
            self.start_sequence();
            return None;
        }
        let dt = at_ms - last_at;
        if dt == 0 || self.classified {
            return None;
        }

        self.velocity_sum += (position - last_position).abs() / dt as f64;
        self.samples += 1;
        self.classify()
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn mean_velocity(&self) -> Option<f64> {
        if self.samples == 0 {
            None
        } else {
            Some(self.velocity_sum / self.samples as f64)
        }
    }

    fn start_sequence(&mut self) {
        self.velocity_sum = 0.0;
        self.samples = 0;
        self.classified = false;
    }

    fn classify(&mut self) -> Option<ScrollPattern> {
        if self.classified || self.samples < MIN_VELOCITY_SAMPLES {
            return None;
        }
        let mean = self.mean_velocity()?;
        let pattern = if mean >= FAST_SCROLL_VELOCITY {
            ScrollPattern::Skim
        } else if mean <= SLOW_SCROLL_VELOCITY {
            ScrollPattern::Read
        } else {
            return None;
        };
        self.classified = true;
        Some(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_sequence_is_skim() {
        let mut tracker = ScrollTracker::new(500);
        assert_eq!(tracker.push(0.0, 0), None);
        assert_eq!(tracker.push(300.0, 100), None);
        assert_eq!(tracker.push(600.0, 200), None);
        assert_eq!(tracker.push(900.0, 300), Some(ScrollPattern::Skim));
        // Classified once per sequence
        assert_eq!(tracker.push(1200.0, 400), None);
    }

    #[test]
    fn test_slow_sequence_is_read() {
        let mut tracker = ScrollTracker::new(500);
        tracker.push(0.0, 0);
        tracker.push(20.0, 100);
        tracker.push(40.0, 200);
        assert_eq!(tracker.push(60.0, 300), Some(ScrollPattern::Read));
        assert_eq!(ScrollPattern::Read.intent(), Intent::UseCase);
    }

    #[test]
    fn test_gap_starts_new_sequence() {
        let mut tracker = ScrollTracker::new(500);
        tracker.push(0.0, 0);
        tracker.push(300.0, 100);
        tracker.push(600.0, 200);
        // 5s pause: not a velocity sample
        assert_eq!(tracker.push(600.0, 5200), None);
        assert_eq!(tracker.sample_count(), 0);
        tracker.push(900.0, 5300);
        tracker.push(1200.0, 5400);
        assert_eq!(tracker.push(1500.0, 5500), Some(ScrollPattern::Skim));
    }

    #[test]
    fn test_medium_speed_unclassified() {
        let mut tracker = ScrollTracker::new(500);
        tracker.push(0.0, 0);
        for i in 1..6u64 {
            assert_eq!(tracker.push(i as f64 * 100.0, i * 100), None);
        }
        assert_eq!(tracker.mean_velocity(), Some(1.0));
    }

    #[test]
    fn test_classified_sequence_stops_sampling() {
        let mut tracker = ScrollTracker::new(500);
        tracker.push(0.0, 0);
        for i in 1..=3u64 {
            tracker.push(i as f64 * 300.0, i * 100);
        }
        assert_eq!(tracker.sample_count(), MIN_VELOCITY_SAMPLES);

        // A long continuous scroll adds nothing once classified
        for i in 4..1_000u64 {
            assert_eq!(tracker.push(i as f64 * 300.0, i * 100), None);
        }
        assert_eq!(tracker.sample_count(), MIN_VELOCITY_SAMPLES);
        assert_eq!(tracker.mean_velocity(), Some(3.0));
    }
}
