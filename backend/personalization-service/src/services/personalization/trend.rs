// ============================================
// Trend Calculator (改善趨勢)
// ============================================
//
// Compares the mean mood score of the most recent window against the
// window immediately before it:
//
//   history:  ... | older (w) | recent (w) |
//   improvement = (mean(recent) - mean(older)) * 100
//
// No trend point is emitted until two full windows exist.

use super::mood_score::mean_score;
use crate::models::{MoodObservation, TrendPoint, UserPattern};
use chrono::{DateTime, Utc};
use tracing::debug;

pub struct TrendCalculator {
    window: usize,
}

impl Default for TrendCalculator {
    fn default() -> Self {
        Self { window: 7 }
    }
}

impl TrendCalculator {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn min_history(&self) -> usize {
        self.window * 2
    }

    /// Improvement value for a history, `None` below the minimum length
    pub fn compute(&self, history: &[MoodObservation]) -> Option<f64> {
        let n = history.len();
        if n < self.min_history() {
            return None;
        }

        let recent = &history[n - self.window..];
        let older = &history[n - self.min_history()..n - self.window];

        let recent_score = mean_score(recent)?;
        let older_score = mean_score(older)?;

        Some((recent_score - older_score) * 100.0)
    }

    /// Appends a trend point to the pattern when enough history exists.
    ///
    /// Every successful call appends a new point, even without new
    /// observations; call once per new observation.
    pub fn apply(&self, pattern: &mut UserPattern, now: DateTime<Utc>) -> Option<TrendPoint> {
        let value = self.compute(pattern.mood_history())?;
        let point = TrendPoint {
            value,
            timestamp: now,
        };
        pattern.push_trend(point.clone());

        debug!(
            improvement = value,
            observations = pattern.mood_history().len(),
            "Trend point recorded"
        );
        Some(point)
    }
}
