// ============================================
// Progress Estimator (學習進度)
// ============================================
//
// progress = min(100, topics * 5 + distinct_moods * 3 + max(0, trend * 2))

use crate::models::UserPattern;

const TOPIC_WEIGHT: f64 = 5.0;
const MOOD_DIVERSITY_WEIGHT: f64 = 3.0;
const TREND_WEIGHT: f64 = 2.0;

#[derive(Default)]
pub struct ProgressEstimator;

impl ProgressEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, pattern: &UserPattern) -> f64 {
        let conversation_count = pattern.conversation_topics().len() as f64;
        let mood_diversity = pattern.mood_tally().distinct() as f64;
        let last_trend = pattern.latest_trend().unwrap_or(0.0);

        let progress = conversation_count * TOPIC_WEIGHT
            + mood_diversity * MOOD_DIVERSITY_WEIGHT
            + (last_trend * TREND_WEIGHT).max(0.0);

        progress.min(UserPattern::MAX_PROGRESS)
    }

    /// Overwrites the pattern's learning progress and returns it
    pub fn apply(&self, pattern: &mut UserPattern) -> f64 {
        let progress = self.estimate(pattern);
        pattern.set_learning_progress(progress);
        pattern.learning_progress()
    }
}
