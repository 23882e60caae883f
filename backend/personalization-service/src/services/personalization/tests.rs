// ============================================
// Personalization Engine Scenario Tests
// ============================================
//
// 運行方式:
// cargo test --lib personalization::tests

use super::*;
use crate::models::{Priority, RecommendationKind, UserPattern};
use chrono::Duration;

fn engine() -> PersonalizationEngine {
    PersonalizationEngine::new(Arc::new(PatternStore::new()), &EngineConfig::default())
}

fn record_moods(engine: &PersonalizationEngine, user_id: &str, mood: &str, times: usize) {
    for _ in 0..times {
        engine.record(user_id, InteractionEvent::with_mood(mood));
    }
}

#[test]
fn test_thirteen_happy_events_have_no_trend() {
    let engine = engine();
    record_moods(&engine, "u", "happy", 13);

    let report = engine.recommend("u");
    assert_eq!(report.improvement_trend, 0.0);
    assert_eq!(report.dominant_mood, "happy");
    assert!(report.recommendations.is_empty());
    assert_eq!(
        engine
            .store()
            .with_pattern("u", |p| p.improvement_trends().len()),
        Some(0)
    );
}

#[test]
fn test_sad_to_happy_celebrates_progress() {
    let engine = engine();
    record_moods(&engine, "u", "sad", 7);
    record_moods(&engine, "u", "happy", 7);

    let report = engine.recommend("u");
    assert!((report.improvement_trend - 700.0).abs() < 1e-9);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.kind == RecommendationKind::Celebration));
    // sad 先出現，並列時取 sad
    assert_eq!(report.dominant_mood, "sad");
    assert_eq!(report.learning_progress, 100.0);
}

#[test]
fn test_single_stressed_event() {
    let engine = engine();
    engine.record("u", InteractionEvent::with_mood("stressed"));

    let report = engine.recommend("u");
    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(report.recommendations[0].kind, RecommendationKind::Breathing);
    assert_eq!(report.recommendations[0].priority, Priority::High);
    assert_eq!(report.learning_progress, 3.0);
}

#[test]
fn test_unknown_user_gets_welcome_payload() {
    let engine = engine();
    let report = engine.recommend("ghost");

    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(report.recommendations[0].title, "Welcome to Your Journey");
    assert_eq!(report.learning_progress, 0.0);
    assert_eq!(report.dominant_mood, "neutral");
    assert_eq!(report.conversation_depth, 0);
    assert!(!engine.knows("ghost"));
}

#[test]
fn test_conversation_depth_counts_topic_events_only() {
    let engine = engine();
    engine.record("u", InteractionEvent::with_topic("exams"));
    engine.record("u", InteractionEvent::with_mood("calm"));
    engine.record(
        "u",
        InteractionEvent {
            response_rating: Some(4.0),
            ..Default::default()
        },
    );
    engine.record(
        "u",
        InteractionEvent {
            mood: Some("sad".to_string()),
            conversation_topic: Some("family".to_string()),
            ..Default::default()
        },
    );

    assert_eq!(engine.recommend("u").conversation_depth, 2);
}

#[test]
fn test_progress_stays_bounded() {
    let engine = engine();
    let moods = ["sad", "happy", "anxious", "calm", "depressed", "tired"];
    for i in 0..60 {
        let outcome = engine.record(
            "u",
            InteractionEvent {
                mood: Some(moods[i % moods.len()].to_string()),
                conversation_topic: Some(format!("topic-{}", i)),
                response_rating: Some((i % 5) as f64),
                ..Default::default()
            },
        );
        assert!((0.0..=100.0).contains(&outcome.learning_progress));
    }
    let report = engine.recommend("u");
    assert!((0.0..=100.0).contains(&report.learning_progress));
}

#[test]
fn test_recommend_is_idempotent() {
    let engine = engine();
    record_moods(&engine, "u", "depressed", 9);
    record_moods(&engine, "u", "calm", 7);
    for i in 0..12 {
        engine.record("u", InteractionEvent::with_topic(format!("t{}", i)));
    }

    let first = engine.recommend("u");
    let second = engine.recommend("u");
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_dominant_mood_tie_break_through_engine() {
    let engine = engine();
    for mood in ["happy", "sad", "happy", "sad"] {
        engine.record("u", InteractionEvent::with_mood(mood));
    }
    assert_eq!(engine.recommend("u").dominant_mood, "happy");
}

#[test]
fn test_empty_event_creates_pattern_only() {
    let engine = engine();
    let outcome = engine.record("u", InteractionEvent::default());

    assert!(engine.knows("u"));
    assert_eq!(outcome.learning_progress, 0.0);
    assert!(outcome.trend_point.is_none());

    let snapshot = engine.store().with_pattern("u", |p| p.clone()).unwrap();
    assert_eq!(snapshot, UserPattern::new());

    // 已知用戶不再拿到歡迎建議
    let report = engine.recommend("u");
    assert!(report.recommendations.is_empty());
    assert_eq!(report.dominant_mood, "neutral");
}

#[test]
fn test_rating_is_filed_under_resolved_topic() {
    let engine = engine();
    engine.record(
        "u",
        InteractionEvent {
            response_rating: Some(5.0),
            conversation_topic: Some("exams".to_string()),
            ..Default::default()
        },
    );
    engine.record(
        "u",
        InteractionEvent {
            response_rating: Some(3.0),
            ..Default::default()
        },
    );

    let pattern = engine.store().with_pattern("u", |p| p.clone()).unwrap();
    assert_eq!(pattern.response_preferences()["exams"], vec![5.0]);
    assert_eq!(pattern.response_preferences()["general"], vec![3.0]);
}

#[test]
fn test_trend_only_on_new_observations() {
    let engine = engine();
    record_moods(&engine, "u", "sad", 7);
    record_moods(&engine, "u", "neutral", 7);
    engine.record("u", InteractionEvent::with_topic("work"));
    engine.record("u", InteractionEvent::default());

    let pattern = engine.store().with_pattern("u", |p| p.clone()).unwrap();
    assert_eq!(pattern.improvement_trends().len(), 1);
    assert_eq!(pattern.latest_trend(), Some(300.0));

    engine.record("u", InteractionEvent::with_mood("neutral"));
    let pattern = engine.store().with_pattern("u", |p| p.clone()).unwrap();
    assert_eq!(pattern.improvement_trends().len(), 2);
}

#[test]
fn test_arrival_order_is_preserved() {
    let engine = engine();
    let now = Utc::now();
    engine.record_at("u", InteractionEvent::with_mood("calm"), now);
    engine.record_at(
        "u",
        InteractionEvent::with_mood("sad"),
        now - Duration::hours(1),
    );

    let pattern = engine.store().with_pattern("u", |p| p.clone()).unwrap();
    let moods: Vec<_> = pattern.mood_history().iter().map(|o| o.mood.as_str()).collect();
    assert_eq!(moods, vec!["calm", "sad"]);
}

#[test]
fn test_context_is_kept_with_mood() {
    let engine = engine();
    engine.record(
        "u",
        InteractionEvent {
            mood: Some("anxious".to_string()),
            context: Some("exam tomorrow".to_string()),
            ..Default::default()
        },
    );

    let pattern = engine.store().with_pattern("u", |p| p.clone()).unwrap();
    assert_eq!(pattern.mood_history()[0].context, "exam tomorrow");
    assert_eq!(pattern.engagement_levels().len(), 1);
}

#[test]
fn test_users_are_independent() {
    let engine = engine();
    record_moods(&engine, "a", "stressed", 3);
    record_moods(&engine, "b", "sad", 1);

    assert_eq!(engine.recommend("a").dominant_mood, "stressed");
    assert_eq!(engine.recommend("b").dominant_mood, "sad");
}

#[test]
fn test_record_and_snapshot_matches_stored_pattern() {
    let engine = engine();
    record_moods(&engine, "u", "sad", 2);

    let (outcome, pattern) = engine.record_and_snapshot(
        "u",
        InteractionEvent {
            mood: Some("calm".to_string()),
            conversation_topic: Some("sleep".to_string()),
            ..Default::default()
        },
    );

    assert_eq!(pattern.mood_history().len(), 3);
    assert_eq!(pattern.conversation_topics(), ["sleep".to_string()]);
    assert_eq!(pattern.learning_progress(), outcome.learning_progress);
    assert_eq!(Some(pattern), engine.store().with_pattern("u", |p| p.clone()));
}

#[test]
fn test_snapshots_follow_record_order_under_contention() {
    let engine = Arc::new(engine());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                (0..25)
                    .map(|_| {
                        let (_, pattern) =
                            engine.record_and_snapshot("shared", InteractionEvent::with_topic("t"));
                        pattern.conversation_topics().len()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut depths: Vec<usize> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    depths.sort_unstable();

    // each snapshot reflects exactly the records applied before it
    assert_eq!(depths, (1..=200).collect::<Vec<_>>());
}
