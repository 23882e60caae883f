// ============================================
// Recommendation Engine (推薦引擎)
// ============================================
//
// Rule-based suggestions derived from a user pattern. Rules fire
// independently and are emitted in a fixed order:
//
// 1. dominant mood sad / depressed  → movement (high) + gratitude journaling (medium)
//    dominant mood stressed         → mindful breathing (high)
// 2. latest trend > threshold       → progress celebration (medium)
// 3. topics > threshold             → deep reflection (medium)
//
// Users without a pattern get a single welcome suggestion.

use super::mood_score::NEUTRAL_MOOD;
use crate::models::{
    Priority, Recommendation, RecommendationKind, RecommendationReport, UserPattern,
};
use tracing::debug;

pub struct RecommendationEngine {
    celebration_threshold: f64,
    deep_reflection_min_topics: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            celebration_threshold: 20.0,
            deep_reflection_min_topics: 10,
        }
    }
}

impl RecommendationEngine {
    pub fn new(celebration_threshold: f64, deep_reflection_min_topics: usize) -> Self {
        Self {
            celebration_threshold,
            deep_reflection_min_topics,
        }
    }

    /// Recommendations for a known user. Reads the pattern only.
    pub fn recommend(&self, pattern: &UserPattern) -> RecommendationReport {
        let dominant_mood = dominant_mood(pattern);
        let improvement_trend = pattern.latest_trend().unwrap_or(0.0);
        let conversation_depth = pattern.conversation_topics().len();

        let mut recommendations = Vec::new();

        match dominant_mood.as_str() {
            "sad" | "depressed" => {
                recommendations.push(gentle_movement());
                recommendations.push(gratitude_journaling());
            }
            "stressed" => recommendations.push(mindful_breathing()),
            _ => {}
        }

        if improvement_trend > self.celebration_threshold {
            recommendations.push(progress_celebration());
        }

        if conversation_depth > self.deep_reflection_min_topics {
            recommendations.push(deep_reflection());
        }

        debug!(
            dominant_mood = %dominant_mood,
            improvement_trend,
            conversation_depth,
            count = recommendations.len(),
            "Recommendations generated"
        );

        RecommendationReport {
            recommendations,
            learning_progress: pattern.learning_progress(),
            improvement_trend,
            dominant_mood,
            conversation_depth,
        }
    }

    /// Fixed payload for users the engine has never seen
    pub fn welcome(&self) -> RecommendationReport {
        RecommendationReport {
            recommendations: vec![welcome_journey()],
            learning_progress: 0.0,
            improvement_trend: 0.0,
            dominant_mood: NEUTRAL_MOOD.to_string(),
            conversation_depth: 0,
        }
    }
}

/// Most frequent mood, first-seen label on ties, "neutral" without history
pub fn dominant_mood(pattern: &UserPattern) -> String {
    pattern
        .mood_tally()
        .dominant()
        .unwrap_or(NEUTRAL_MOOD)
        .to_string()
}

fn suggestion(
    kind: RecommendationKind,
    title: &str,
    description: &str,
    priority: Priority,
    reason: &str,
    estimated_time: &str,
) -> Recommendation {
    Recommendation {
        kind,
        title: title.to_string(),
        description: description.to_string(),
        priority,
        reason: reason.to_string(),
        estimated_time: estimated_time.to_string(),
    }
}

fn welcome_journey() -> Recommendation {
    suggestion(
        RecommendationKind::General,
        "Welcome to Your Journey",
        "Start by sharing how you're feeling today. Every conversation is a step forward in your personal growth.",
        Priority::High,
        "Begin your wellness journey with self-reflection",
        "5 minutes",
    )
}

fn gentle_movement() -> Recommendation {
    suggestion(
        RecommendationKind::Activity,
        "Gentle Movement Practice",
        "Start with 5 minutes of gentle stretching or walking. Like Hanuman's devotion, small consistent actions build great strength.",
        Priority::High,
        "Physical movement releases endorphins and helps regulate mood",
        "5-10 minutes",
    )
}

fn gratitude_journaling() -> Recommendation {
    suggestion(
        RecommendationKind::Reflection,
        "Gratitude Journaling",
        "Write down 3 things you're grateful for each day. Like Draupadi's resilience, gratitude helps you find strength in difficult times.",
        Priority::Medium,
        "Gratitude practice has been shown to improve mood and mental health",
        "5 minutes",
    )
}

fn mindful_breathing() -> Recommendation {
    suggestion(
        RecommendationKind::Breathing,
        "Mindful Breathing",
        "Practice box breathing: 4 counts in, 4 hold, 4 out, 4 hold. Like Rama's calm in adversity, this centers your mind.",
        Priority::High,
        "Controlled breathing activates your parasympathetic nervous system",
        "3-5 minutes",
    )
}

fn progress_celebration() -> Recommendation {
    suggestion(
        RecommendationKind::Celebration,
        "Progress Celebration",
        "Your improvement trend shows you're on the right path! Like the Pandavas' journey through exile, every step forward builds your inner strength.",
        Priority::Medium,
        "Acknowledging progress reinforces positive patterns",
        "2 minutes",
    )
}

fn deep_reflection() -> Recommendation {
    suggestion(
        RecommendationKind::DeepReflection,
        "Deep Reflection Practice",
        "Your consistent conversations show deep self-awareness. Like Krishna guiding Arjuna, you're developing the wisdom to navigate life's challenges.",
        Priority::Medium,
        "Deep reflection practices will enhance your natural strength",
        "10-15 minutes",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MoodObservation, TrendPoint};
    use chrono::Utc;

    fn pattern_with(moods: &[&str], topics: usize, trend: Option<f64>) -> UserPattern {
        let mut pattern = UserPattern::new();
        for mood in moods {
            pattern.push_mood(MoodObservation {
                mood: mood.to_string(),
                timestamp: Utc::now(),
                context: String::new(),
            });
        }
        for i in 0..topics {
            pattern.push_topic(format!("topic-{}", i));
        }
        if let Some(value) = trend {
            pattern.push_trend(TrendPoint {
                value,
                timestamp: Utc::now(),
            });
        }
        pattern
    }

    fn kinds(report: &RecommendationReport) -> Vec<RecommendationKind> {
        report.recommendations.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_sad_and_depressed_get_movement_and_journaling() {
        let engine = RecommendationEngine::default();
        for mood in ["sad", "depressed"] {
            let report = engine.recommend(&pattern_with(&[mood], 0, None));
            assert_eq!(
                kinds(&report),
                vec![RecommendationKind::Activity, RecommendationKind::Reflection]
            );
            assert_eq!(report.recommendations[0].priority, Priority::High);
            assert_eq!(report.recommendations[1].priority, Priority::Medium);
        }
    }

    #[test]
    fn test_stressed_gets_breathing() {
        let report = RecommendationEngine::default().recommend(&pattern_with(&["stressed"], 0, None));
        assert_eq!(kinds(&report), vec![RecommendationKind::Breathing]);
        assert_eq!(report.recommendations[0].priority, Priority::High);
        assert_eq!(report.recommendations[0].title, "Mindful Breathing");
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let report =
            RecommendationEngine::default().recommend(&pattern_with(&["sad"], 11, Some(21.0)));
        assert_eq!(
            kinds(&report),
            vec![
                RecommendationKind::Activity,
                RecommendationKind::Reflection,
                RecommendationKind::Celebration,
                RecommendationKind::DeepReflection,
            ]
        );
        assert_eq!(report.conversation_depth, 11);
        assert_eq!(report.improvement_trend, 21.0);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let report =
            RecommendationEngine::default().recommend(&pattern_with(&["calm"], 10, Some(20.0)));
        assert!(report.recommendations.is_empty());
        assert_eq!(report.dominant_mood, "calm");
    }

    #[test]
    fn test_known_user_without_signals_is_empty() {
        let report = RecommendationEngine::default().recommend(&UserPattern::new());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.dominant_mood, "neutral");
        assert_eq!(report.improvement_trend, 0.0);
    }

    #[test]
    fn test_dominant_mood_tie_break() {
        let pattern = pattern_with(&["happy", "sad", "happy", "sad"], 0, None);
        assert_eq!(dominant_mood(&pattern), "happy");
    }

    #[test]
    fn test_welcome_payload() {
        let report = RecommendationEngine::default().welcome();
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].title, "Welcome to Your Journey");
        assert_eq!(report.recommendations[0].kind, RecommendationKind::General);
        assert_eq!(report.learning_progress, 0.0);
        assert_eq!(report.dominant_mood, "neutral");
        assert_eq!(report.conversation_depth, 0);
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = RecommendationEngine::new(500.0, 2);
        let report = engine.recommend(&pattern_with(&["happy"], 3, Some(100.0)));
        assert_eq!(kinds(&report), vec![RecommendationKind::DeepReflection]);
    }
}
