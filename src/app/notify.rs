use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::push::{ApiError, api_error};
use crate::state;
use crate::templates::NotificationType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotifyRequest {
    pub(crate) user_id: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) params: BTreeMap<String, String>,
}

#[derive(Serialize)]
pub(crate) struct NotifyResponse {
    pub(crate) status: &'static str,
}

/// Accepts the notification and delivers it in the background.
pub(crate) async fn notify(
    State(state): State<state::AppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<(StatusCode, Json<NotifyResponse>), ApiError> {
    let user_id = request.user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "userId is required."));
    }
    let kind: NotificationType = request
        .kind
        .parse()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "unknown notification type."))?;

    let notifier = state.notifier.clone();
    let params = request.params;
    tokio::spawn(async move {
        notifier.notify_user(&user_id, kind, &params).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(NotifyResponse { status: "accepted" }),
    ))
}
