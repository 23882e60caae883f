use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Interaction events (輸入事件)
// ============================================

/// One interaction reported by the request layer. Only present fields
/// update their sequence on the user's pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub mood: Option<String>,
    pub context: Option<String>,
    pub conversation_topic: Option<String>,
    pub response_rating: Option<f64>,
    pub topic: Option<String>,
}

impl InteractionEvent {
    pub const DEFAULT_RATING_TOPIC: &'static str = "general";

    pub fn with_mood(mood: impl Into<String>) -> Self {
        Self {
            mood: Some(mood.into()),
            ..Default::default()
        }
    }

    pub fn with_topic(topic: impl Into<String>) -> Self {
        Self {
            conversation_topic: Some(topic.into()),
            ..Default::default()
        }
    }

    /// Topic a rating is filed under: explicit `topic`, then the
    /// conversation topic, then "general". An explicit `topic` wins even when
    /// the event also names a conversation topic.
    pub fn rating_topic(&self) -> &str {
        self.topic
            .as_deref()
            .or(self.conversation_topic.as_deref())
            .unwrap_or(Self::DEFAULT_RATING_TOPIC)
    }

    /// Number of signal-bearing fields present
    pub fn signal_count(&self) -> u8 {
        [
            self.mood.is_some(),
            self.conversation_topic.is_some(),
            self.response_rating.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count() as u8
    }
}

// ============================================
// User pattern (用戶行為模式)
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodObservation {
    pub mood: String,
    pub timestamp: DateTime<Utc>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSample {
    pub signals: u8,
    pub timestamp: DateTime<Utc>,
}

/// Running mood counts in first-seen order.
///
/// Ties on the maximum count resolve to the label that was observed first,
/// independent of any hash ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoodTally {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl MoodTally {
    pub fn observe(&mut self, mood: &str) {
        match self.index.get(mood) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(mood.to_string(), self.counts.len());
                self.counts.push((mood.to_string(), 1));
            }
        }
    }

    pub fn dominant(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            // strict comparison keeps the earliest label on ties
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(mood, _)| mood.as_str())
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}

/// Accumulated behavioral record for one user.
///
/// Every sequence is append-only; the only overwritten field is
/// `learning_progress`, which is kept in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserPatternRecord", into = "UserPatternRecord")]
pub struct UserPattern {
    mood_history: Vec<MoodObservation>,
    conversation_topics: Vec<String>,
    response_preferences: HashMap<String, Vec<f64>>,
    improvement_trends: Vec<TrendPoint>,
    learning_progress: f64,
    engagement_levels: Vec<EngagementSample>,
    mood_tally: MoodTally,
}

impl UserPattern {
    pub const MAX_PROGRESS: f64 = 100.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_mood(&mut self, observation: MoodObservation) {
        self.mood_tally.observe(&observation.mood);
        self.mood_history.push(observation);
    }

    pub fn push_topic(&mut self, topic: impl Into<String>) {
        self.conversation_topics.push(topic.into());
    }

    pub fn push_rating(&mut self, topic: &str, rating: f64) {
        self.response_preferences
            .entry(topic.to_string())
            .or_default()
            .push(rating);
    }

    pub fn push_trend(&mut self, point: TrendPoint) {
        self.improvement_trends.push(point);
    }

    pub fn push_engagement(&mut self, sample: EngagementSample) {
        self.engagement_levels.push(sample);
    }

    pub fn set_learning_progress(&mut self, progress: f64) {
        self.learning_progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, Self::MAX_PROGRESS)
        };
    }

    pub fn mood_history(&self) -> &[MoodObservation] {
        &self.mood_history
    }

    pub fn conversation_topics(&self) -> &[String] {
        &self.conversation_topics
    }

    pub fn response_preferences(&self) -> &HashMap<String, Vec<f64>> {
        &self.response_preferences
    }

    pub fn improvement_trends(&self) -> &[TrendPoint] {
        &self.improvement_trends
    }

    pub fn engagement_levels(&self) -> &[EngagementSample] {
        &self.engagement_levels
    }

    pub fn learning_progress(&self) -> f64 {
        self.learning_progress
    }

    pub fn mood_tally(&self) -> &MoodTally {
        &self.mood_tally
    }

    /// Value of the most recent trend point
    pub fn latest_trend(&self) -> Option<f64> {
        self.improvement_trends.last().map(|p| p.value)
    }
}

/// Persisted shape of a [`UserPattern`]. The mood tally is derived state
/// and is rebuilt from the history on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatternRecord {
    #[serde(default)]
    pub mood_history: Vec<MoodObservation>,
    #[serde(default)]
    pub conversation_topics: Vec<String>,
    #[serde(default)]
    pub response_preferences: HashMap<String, Vec<f64>>,
    #[serde(default)]
    pub improvement_trends: Vec<TrendPoint>,
    #[serde(default)]
    pub learning_progress: f64,
    #[serde(default)]
    pub engagement_levels: Vec<EngagementSample>,
}

impl From<UserPatternRecord> for UserPattern {
    fn from(record: UserPatternRecord) -> Self {
        let mut mood_tally = MoodTally::default();
        for observation in &record.mood_history {
            mood_tally.observe(&observation.mood);
        }

        let mut pattern = UserPattern {
            mood_history: record.mood_history,
            conversation_topics: record.conversation_topics,
            response_preferences: record.response_preferences,
            improvement_trends: record.improvement_trends,
            learning_progress: 0.0,
            engagement_levels: record.engagement_levels,
            mood_tally,
        };
        pattern.set_learning_progress(record.learning_progress);
        pattern
    }
}

impl From<UserPattern> for UserPatternRecord {
    fn from(pattern: UserPattern) -> Self {
        UserPatternRecord {
            mood_history: pattern.mood_history,
            conversation_topics: pattern.conversation_topics,
            response_preferences: pattern.response_preferences,
            improvement_trends: pattern.improvement_trends,
            learning_progress: pattern.learning_progress,
            engagement_levels: pattern.engagement_levels,
        }
    }
}

// ============================================
// Recommendations (推薦輸出)
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    General,
    Activity,
    Reflection,
    Breathing,
    Celebration,
    DeepReflection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub reason: String,
    pub estimated_time: String,
}

/// Answer to "what should this user do next", plus the signals it was
/// derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub learning_progress: f64,
    pub improvement_trend: f64,
    pub dominant_mood: String,
    pub conversation_depth: usize,
}

/// Result of recording one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub learning_progress: f64,
    /// Trend point emitted by this record, if any
    pub trend_point: Option<TrendPoint>,
}

// ============================================
// Conversation context (對話上下文)
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub input: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}
