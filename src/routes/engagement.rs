use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::EngagementError;
use crate::models::{
    ConversationId, ErrorResponse, FeatureStatusQuery, MessageEvent, MessageRecordedResponse,
    MessageSentRequest,
};
use crate::routes::AppState;
use crate::services::{EngagementStore, ProfileStore};

/// Configure conversation engagement routes
pub fn configure<S>(cfg: &mut web::ServiceConfig)
where
    S: ProfileStore + EngagementStore + 'static,
{
    cfg.route(
        "/conversations/{id}/messages",
        web::post().to(message_sent::<S>),
    )
    .route(
        "/conversations/{id}/feature-status",
        web::get().to(feature_status::<S>),
    );
}

/// Message-send hook from the messaging subsystem
///
/// POST /api/v1/conversations/{id}/messages
///
/// Always answers 202 once the payload is valid: counting failures are
/// logged and never block delivery.
async fn message_sent<S: EngagementStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<ConversationId>,
    req: web::Json<MessageSentRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors, 400));
    }

    let req = req.into_inner();
    let event = MessageEvent {
        conversation_id: path.into_inner(),
        sender_id: req.sender_id,
        text: req.text,
    };

    let outcome = state.engagement.record_message(&event).await;

    HttpResponse::Accepted().json(MessageRecordedResponse {
        counted: outcome.is_counted(),
        count: outcome.count(),
    })
}

/// Feature-unlock state for one participant
///
/// GET /api/v1/conversations/{id}/feature-status?userId={userId}
async fn feature_status<S: EngagementStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<ConversationId>,
    query: web::Query<FeatureStatusQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors, 400));
    }

    let conversation_id = path.into_inner();
    match state
        .engagement
        .feature_status(conversation_id, query.user_id)
        .await
    {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e @ EngagementError::ConversationNotFound(_)) => {
            HttpResponse::NotFound().json(ErrorResponse::new("Conversation not found", e, 404))
        }
        Err(e @ EngagementError::NotParticipant { .. }) => {
            HttpResponse::Forbidden().json(ErrorResponse::new("Not a participant", e, 403))
        }
        Err(e) => {
            tracing::error!(
                "Failed to load feature status for conversation {}: {}",
                conversation_id,
                e
            );
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to load feature status", e, 500))
        }
    }
}
