// ============================================
// Personalization Engine (個性化引擎)
// ============================================
//
// Accumulates per-user behavioral signals and answers "what should this
// user do next".
//
// ┌──────────────────────────────────────────────────────────┐
// │                 PersonalizationEngine                     │
// ├──────────────────────────────────────────────────────────┤
// │  record(user, event)                                      │
// │     │                                                     │
// │     ↓                                                     │
// │  PatternStore ── append mood / topic / rating             │
// │     │                                                     │
// │     ↓                                                     │
// │  TrendCalculator ── 7 vs 7 window (mood score table)      │
// │     │                                                     │
// │     ↓                                                     │
// │  ProgressEstimator ── bounded [0, 100] score              │
// │                                                           │
// │  recommend(user)                                          │
// │     │                                                     │
// │     ↓                                                     │
// │  RecommendationEngine ── ordered rule set                 │
// └──────────────────────────────────────────────────────────┘
//
// Every call runs to completion synchronously under the user's lock.

pub mod mood_score;
pub mod pattern_store;
pub mod progress;
pub mod recommender;
pub mod trend;

#[cfg(test)]
mod tests;

pub use mood_score::{mood_score, NEUTRAL_MOOD, NEUTRAL_SCORE};
pub use pattern_store::PatternStore;
pub use progress::ProgressEstimator;
pub use recommender::{dominant_mood, RecommendationEngine};
pub use trend::TrendCalculator;

use crate::config::EngineConfig;
use crate::models::{
    EngagementSample, InteractionEvent, MoodObservation, RecommendationReport, RecordOutcome,
    UserPattern,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

pub struct PersonalizationEngine {
    store: Arc<PatternStore>,
    trend: TrendCalculator,
    progress: ProgressEstimator,
    recommender: RecommendationEngine,
}

impl PersonalizationEngine {
    pub fn new(store: Arc<PatternStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            trend: TrendCalculator::new(config.trend_window),
            progress: ProgressEstimator::new(),
            recommender: RecommendationEngine::new(
                config.celebration_threshold,
                config.deep_reflection_min_topics,
            ),
        }
    }

    pub fn store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Whether a pattern exists for the user
    pub fn knows(&self, user_id: &str) -> bool {
        self.store.contains(user_id)
    }

    pub fn record(&self, user_id: &str, event: InteractionEvent) -> RecordOutcome {
        self.record_at(user_id, event, Utc::now())
    }

    /// Records one interaction observed at `now`.
    ///
    /// Creates the pattern if absent and appends the fields present on the
    /// event. A trend point is computed only when the event carried a new
    /// mood observation; progress is recomputed on every call.
    pub fn record_at(
        &self,
        user_id: &str,
        event: InteractionEvent,
        now: DateTime<Utc>,
    ) -> RecordOutcome {
        let outcome = self
            .store
            .with_pattern_mut(user_id, |pattern| self.apply_event(pattern, event, now));
        self.log_recorded(user_id, &outcome);
        outcome
    }

    /// Like [`record`](Self::record), also returning a copy of the pattern
    /// taken under the same lock.
    pub fn record_and_snapshot(
        &self,
        user_id: &str,
        event: InteractionEvent,
    ) -> (RecordOutcome, UserPattern) {
        let now = Utc::now();
        let (outcome, pattern) = self.store.with_pattern_mut(user_id, |pattern| {
            let outcome = self.apply_event(pattern, event, now);
            (outcome, pattern.clone())
        });
        self.log_recorded(user_id, &outcome);
        (outcome, pattern)
    }

    fn apply_event(
        &self,
        pattern: &mut UserPattern,
        event: InteractionEvent,
        now: DateTime<Utc>,
    ) -> RecordOutcome {
        let signals = event.signal_count();
        let rating_topic = event.rating_topic().to_string();
        let mut observed_mood = false;

        if let Some(mood) = event.mood {
            pattern.push_mood(MoodObservation {
                mood,
                timestamp: now,
                context: event.context.unwrap_or_default(),
            });
            observed_mood = true;
        }

        if let Some(topic) = event.conversation_topic {
            pattern.push_topic(topic);
        }

        if let Some(rating) = event.response_rating {
            pattern.push_rating(&rating_topic, rating);
        }

        if signals > 0 {
            pattern.push_engagement(EngagementSample {
                signals,
                timestamp: now,
            });
        }

        let trend_point = if observed_mood {
            self.trend.apply(pattern, now)
        } else {
            None
        };
        let learning_progress = self.progress.apply(pattern);

        RecordOutcome {
            learning_progress,
            trend_point,
        }
    }

    fn log_recorded(&self, user_id: &str, outcome: &RecordOutcome) {
        debug!(
            user_id = %user_id,
            learning_progress = outcome.learning_progress,
            trend = ?outcome.trend_point.as_ref().map(|p| p.value),
            "Interaction recorded"
        );
    }

    /// Recommendations for the user, or the welcome payload if unknown
    pub fn recommend(&self, user_id: &str) -> RecommendationReport {
        self.store
            .with_pattern(user_id, |pattern| self.recommender.recommend(pattern))
            .unwrap_or_else(|| {
                debug!(user_id = %user_id, "Unknown user, returning welcome payload");
                self.recommender.welcome()
            })
    }
}
