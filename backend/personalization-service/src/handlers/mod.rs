/// HTTP endpoints - thin adapter between JSON requests and the engine
///
/// Request validation happens here; the engine assumes well-typed input.
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{ConversationTurn, InteractionEvent, RecordOutcome};
use crate::services::{
    ConversationContextStore, PatternSnapshotStore, PersonalizationEngine, SnapshotWriter,
};

/// Shared state handed to every worker
pub struct AppState {
    pub engine: Arc<PersonalizationEngine>,
    pub conversations: Arc<ConversationContextStore>,
    /// Snapshot persistence, disabled when `None`
    pub snapshots: Option<SnapshotWriter>,
}

impl AppState {
    pub fn new(
        engine: Arc<PersonalizationEngine>,
        conversations: Arc<ConversationContextStore>,
    ) -> Self {
        Self {
            engine,
            conversations,
            snapshots: None,
        }
    }

    pub fn with_snapshots(mut self, snapshots: Arc<dyn PatternSnapshotStore>) -> Self {
        self.snapshots = Some(SnapshotWriter::new(snapshots));
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordInteractionRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub event: InteractionEvent,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub rating: Option<f64>,
    pub topic: Option<String>,
    pub mood: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationTurnRequest {
    pub input: String,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationContextResponse {
    pub user_id: String,
    pub turns: Vec<ConversationTurn>,
    pub prompt_history: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health))
            .route("/interactions", web::post().to(record_interaction))
            .route("/feedback", web::post().to(submit_feedback))
            .route("/recommendations/{user_id}", web::get().to(get_recommendations))
            .service(
                web::scope("/conversations")
                    .route("/{user_id}", web::get().to(get_conversation))
                    .route("/{user_id}/turns", web::post().to(add_conversation_turn)),
            ),
    );
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Record one interaction event
pub async fn record_interaction(
    state: web::Data<AppState>,
    payload: web::Json<RecordInteractionRequest>,
) -> Result<HttpResponse> {
    let RecordInteractionRequest { user_id, event } = payload.into_inner();
    let user_id = validate_user_id(&user_id)?;
    validate_event(&event)?;

    let outcome = record_and_persist(&state, &user_id, event).await?;
    Ok(HttpResponse::Ok().json(RecordInteractionResponse::from(outcome)))
}

/// Submit feedback on a companion response.
///
/// Feedback without a topic is filed under "general", which also counts as
/// a conversation topic.
pub async fn submit_feedback(
    state: web::Data<AppState>,
    payload: web::Json<FeedbackRequest>,
) -> Result<HttpResponse> {
    let feedback = payload.into_inner();
    let user_id = validate_user_id(&feedback.user_id)?;

    let event = InteractionEvent {
        mood: feedback.mood,
        context: feedback.context,
        conversation_topic: Some(
            feedback
                .topic
                .unwrap_or_else(|| InteractionEvent::DEFAULT_RATING_TOPIC.to_string()),
        ),
        response_rating: feedback.rating,
        topic: None,
    };
    validate_event(&event)?;

    record_and_persist(&state, &user_id, event).await?;
    info!(user_id = %user_id, "Feedback recorded");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Feedback recorded successfully"
    })))
}

/// Personalized recommendations for a user
pub async fn get_recommendations(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = validate_user_id(&user_id)?;

    if let Some(snapshots) = &state.snapshots {
        snapshots.ensure_loaded(&state.engine, &user_id).await;
    }

    Ok(HttpResponse::Ok().json(state.engine.recommend(&user_id)))
}

/// Append a turn to the user's conversation context window
pub async fn add_conversation_turn(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    payload: web::Json<ConversationTurnRequest>,
) -> Result<HttpResponse> {
    let user_id = validate_user_id(&user_id)?;
    let turn = payload.into_inner();

    if turn.input.trim().is_empty() {
        return Err(AppError::Validation("input must not be empty".to_string()));
    }

    state
        .conversations
        .push_turn(&user_id, turn.input, turn.response);

    Ok(HttpResponse::Created().json(context_response(&state, user_id)))
}

/// Current conversation context window for a user
pub async fn get_conversation(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = validate_user_id(&user_id)?;
    Ok(HttpResponse::Ok().json(context_response(&state, user_id)))
}

#[derive(Debug, Serialize)]
struct RecordInteractionResponse {
    learning_progress: f64,
    improvement_trend: Option<f64>,
}

impl From<RecordOutcome> for RecordInteractionResponse {
    fn from(outcome: RecordOutcome) -> Self {
        Self {
            learning_progress: outcome.learning_progress,
            improvement_trend: outcome.trend_point.map(|p| p.value),
        }
    }
}

async fn record_and_persist(
    state: &AppState,
    user_id: &str,
    event: InteractionEvent,
) -> Result<RecordOutcome> {
    match &state.snapshots {
        Some(snapshots) => snapshots.record(&state.engine, user_id, event).await,
        None => Ok(state.engine.record(user_id, event)),
    }
}

fn context_response(state: &AppState, user_id: String) -> ConversationContextResponse {
    ConversationContextResponse {
        turns: state.conversations.turns(&user_id),
        prompt_history: state.conversations.render_history(&user_id),
        user_id,
    }
}

fn validate_user_id(user_id: &str) -> Result<String> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_event(event: &InteractionEvent) -> Result<()> {
    if let Some(mood) = &event.mood {
        if mood.trim().is_empty() {
            return Err(AppError::Validation("mood must not be empty".to_string()));
        }
    }

    if let Some(rating) = event.response_rating {
        if !rating.is_finite() {
            return Err(AppError::Validation(
                "response_rating must be a finite number".to_string(),
            ));
        }
    }

    Ok(())
}
