use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use model::entities::webhook_event::{self, ProcessingStatus, WebhookProvider};
use sea_orm::{sea_query::OnConflict, DbErr, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::schemas::{api_error, ApiError, ApiResponse, AppState};

/// Acknowledgement returned for a webhook delivery
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    /// Provider-assigned event id
    pub event_id: String,
    /// "processed" for a first delivery, "duplicate" for a redelivery
    pub processing_status: String,
}

/// Receive a webhook event from an external provider
///
/// The (provider, event_id) pair is unique, so a redelivered event is
/// acknowledged without being stored twice.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/{provider}",
    tag = "webhooks",
    params(
        ("provider" = String, Path, description = "Webhook provider (payment or email)"),
    ),
    responses(
        (status = 200, description = "Event acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Payload is missing an event_id", body = crate::schemas::ErrorResponse),
        (status = 404, description = "Unknown provider", body = crate::schemas::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn receive_webhook(
    Path(provider): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<WebhookAck>>, ApiError> {
    trace!("Entering receive_webhook for provider: {}", provider);

    let provider = match provider.as_str() {
        "payment" => WebhookProvider::Payment,
        "email" => WebhookProvider::Email,
        other => {
            warn!("Rejected webhook for unknown provider: {}", other);
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "UNKNOWN_PROVIDER",
                format!("Unknown webhook provider '{}'", other),
            ));
        }
    };

    let event_id = match payload.get("event_id").and_then(|value| value.as_str()) {
        Some(event_id) if !event_id.is_empty() => event_id.to_string(),
        _ => {
            warn!("Rejected webhook payload without event_id");
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "MISSING_EVENT_ID",
                "Webhook payload must carry a string event_id",
            ));
        }
    };
    debug!("Processing webhook event {} from {:?}", event_id, provider);

    let new_event = webhook_event::ActiveModel {
        provider: Set(provider),
        event_id: Set(event_id.clone()),
        payload: Set(payload),
        received_at: Set(Utc::now()),
        processing_status: Set(ProcessingStatus::Processed),
        ..Default::default()
    };

    let insert = webhook_event::Entity::insert(new_event)
        .on_conflict(
            OnConflict::columns([
                webhook_event::Column::Provider,
                webhook_event::Column::EventId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(&state.db)
        .await;

    let (processing_status, message) = match insert {
        Ok(_) => {
            info!("Webhook event {} stored and processed", event_id);
            ("processed", "Webhook event processed")
        }
        Err(DbErr::RecordNotInserted) => {
            info!("Webhook event {} already processed, acknowledging duplicate", event_id);
            ("duplicate", "Webhook event already processed")
        }
        Err(db_error) => {
            error!("Failed to store webhook event {}: {}", event_id, db_error);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Failed to store webhook event",
            ));
        }
    };

    let response = ApiResponse {
        data: WebhookAck {
            event_id,
            processing_status: processing_status.to_string(),
        },
        message: message.to_string(),
        success: true,
    };
    Ok(Json(response))
}
