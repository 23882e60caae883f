// ============================================
// Conversation Context (對話上下文窗口)
// ============================================
//
// Short-lived per-user window of recent exchanges, used only to build the
// history block of prompts sent to the external text generator. Bounded
// FIFO: once the window is full the oldest turn is evicted.
//
// Not part of the user pattern and never read by the recommendation rules.

use crate::models::ConversationTurn;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::debug;

const COMPANION_LABEL: &str = "Companion";

pub struct ConversationContextStore {
    windows: DashMap<String, VecDeque<ConversationTurn>>,
    capacity: usize,
    prompt_turns: usize,
}

impl Default for ConversationContextStore {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl ConversationContextStore {
    pub fn new(capacity: usize, prompt_turns: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            windows: DashMap::new(),
            capacity,
            prompt_turns: prompt_turns.min(capacity),
        }
    }

    /// Appends a turn, evicting the oldest ones beyond capacity
    pub fn push_turn(&self, user_id: &str, input: impl Into<String>, response: impl Into<String>) {
        let turn = ConversationTurn {
            input: input.into(),
            response: response.into(),
            timestamp: Utc::now(),
        };

        let mut window = self.windows.entry(user_id.to_string()).or_default();
        window.push_back(turn);

        let mut evicted = 0;
        while window.len() > self.capacity {
            window.pop_front();
            evicted += 1;
        }

        debug!(
            user_id = %user_id,
            size = window.len(),
            evicted,
            "Conversation turn recorded"
        );
    }

    /// Current window, oldest first
    pub fn turns(&self, user_id: &str) -> Vec<ConversationTurn> {
        self.windows
            .get(user_id)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The last `n` turns, oldest first
    pub fn recent(&self, user_id: &str, n: usize) -> Vec<ConversationTurn> {
        self.windows
            .get(user_id)
            .map(|w| {
                let skip = w.len().saturating_sub(n);
                w.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// History block for the generator prompt
    pub fn render_history(&self, user_id: &str) -> String {
        self.recent(user_id, self.prompt_turns)
            .iter()
            .map(|turn| {
                format!(
                    "User: {}\n{}: {}\n\n",
                    turn.input, COMPANION_LABEL, turn.response
                )
            })
            .collect()
    }
}
