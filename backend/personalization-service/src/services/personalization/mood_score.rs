// ============================================
// Mood Score Table (情緒分數表)
// ============================================
//
// Hand-tuned wellbeing scalar per mood label. The vocabulary is open:
// any label outside the table scores as neutral.
//
//   depressed 1 | sad 2 | stressed 3 | neutral 5 | calm 7 | happy 9

use crate::models::MoodObservation;

pub const NEUTRAL_MOOD: &str = "neutral";
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Wellbeing score for a mood label. Labels are matched exactly.
pub fn mood_score(mood: &str) -> f64 {
    match mood {
        "depressed" => 1.0,
        "sad" => 2.0,
        "stressed" => 3.0,
        "neutral" => NEUTRAL_SCORE,
        "calm" => 7.0,
        "happy" => 9.0,
        _ => NEUTRAL_SCORE,
    }
}

/// Arithmetic mean of the scores of a window, `None` for an empty window
pub fn mean_score(window: &[MoodObservation]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let total: f64 = window.iter().map(|o| mood_score(&o.mood)).sum();
    Some(total / window.len() as f64)
}
