use crate::ports::PushSender;
use crate::state;
use crate::types::push::{PushMessage, PushResult, PushSubscription};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

const DEFAULT_TEST_MESSAGE: &str = "Test notification";

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: &'static str) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

fn not_configured() -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Push notifications are not configured.",
    )
}

pub(crate) async fn push_public_key(
    State(state): State<state::AppState>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let sender = state.push.as_ref().ok_or_else(not_configured)?;
    Ok(Json(PublicKeyResponse {
        public_key: sender.public_key().to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestPushRequest {
    pub(crate) endpoint: String,
    pub(crate) p256dh: String,
    pub(crate) auth: String,
    pub(crate) message: Option<String>,
}

pub(crate) async fn push_test(
    State(state): State<state::AppState>,
    Json(request): Json<TestPushRequest>,
) -> Result<Json<PushResult>, ApiError> {
    let sender = state.push.as_ref().ok_or_else(not_configured)?;

    if request.endpoint.trim().is_empty()
        || request.p256dh.trim().is_empty()
        || request.auth.trim().is_empty()
    {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "endpoint, p256dh, and auth are required.",
        ));
    }

    let body = request
        .message
        .as_deref()
        .unwrap_or(DEFAULT_TEST_MESSAGE)
        .trim();
    if body.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "message must not be empty.",
        ));
    }

    let subscription = PushSubscription::new(
        request.endpoint.trim(),
        request.p256dh.trim(),
        request.auth.trim(),
    );
    let message = PushMessage {
        title: state.config.app_name.clone(),
        body: body.to_string(),
        data: None,
    };
    let result = sender.send(&subscription, &message).await;
    if !result.success {
        tracing::warn!(
            endpoint = %result.endpoint,
            status = result.status_code,
            error = result.error.as_deref().unwrap_or_default(),
            "test push failed"
        );
    }
    Ok(Json(result))
}
