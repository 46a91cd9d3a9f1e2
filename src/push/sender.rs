use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};

use crate::config::DEFAULT_PUSH_TTL;
use crate::error::WebPushError;
use crate::push::encrypt::encrypt_payload;
use crate::push::vapid::{VapidHeaders, vapid_headers};
use crate::types::push::{PushMessage, PushResult, PushSubscription, VapidKeys};

pub const EXPIRED_SUBSCRIPTION_ERROR: &str = "Subscription expired or invalid";

struct PreparedPush {
    body: Vec<u8>,
    vapid: VapidHeaders,
}

/// Encrypts `message` for one subscription, POSTs it, and classifies the
/// outcome. Never retries.
pub async fn send_push_notification(
    http: &reqwest::Client,
    subscription: &PushSubscription,
    message: &PushMessage,
    vapid_keys: &VapidKeys,
    subject: Option<&str>,
) -> PushResult {
    send_push_notification_with_ttl(http, subscription, message, vapid_keys, subject, DEFAULT_PUSH_TTL)
        .await
}

pub(crate) async fn send_push_notification_with_ttl(
    http: &reqwest::Client,
    subscription: &PushSubscription,
    message: &PushMessage,
    vapid_keys: &VapidKeys,
    subject: Option<&str>,
    ttl: u32,
) -> PushResult {
    let endpoint = subscription.endpoint.as_str();
    let prepared = match prepare(subscription, message, vapid_keys, subject) {
        Ok(prepared) => prepared,
        Err(err) => {
            tracing::error!(endpoint, error = %err, "failed to prepare push message");
            return PushResult::transport_failure(endpoint, err.to_string());
        }
    };

    let response = http
        .post(endpoint)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(CONTENT_ENCODING, "aes128gcm")
        .header(CONTENT_LENGTH, prepared.body.len())
        .header("TTL", ttl)
        .header(AUTHORIZATION, prepared.vapid.authorization)
        .header("Crypto-Key", prepared.vapid.crypto_key)
        .body(prepared.body)
        .send()
        .await;

    match response {
        Ok(response) => classify_response(endpoint, response).await,
        Err(err) => {
            tracing::warn!(endpoint, error = %err, "push request failed before a response");
            PushResult::transport_failure(endpoint, err.to_string())
        }
    }
}

fn prepare(
    subscription: &PushSubscription,
    message: &PushMessage,
    vapid_keys: &VapidKeys,
    subject: Option<&str>,
) -> Result<PreparedPush, WebPushError> {
    let plaintext = serde_json::to_vec(message)?;
    let encrypted = encrypt_payload(
        &plaintext,
        &subscription.keys.p256dh,
        &subscription.keys.auth,
    )?;
    let vapid = vapid_headers(&subscription.endpoint, vapid_keys, subject)?;
    Ok(PreparedPush {
        body: encrypted.body,
        vapid,
    })
}

async fn classify_response(endpoint: &str, response: reqwest::Response) -> PushResult {
    let status = response.status().as_u16();
    match status {
        200 | 201 => {
            tracing::debug!(endpoint, status, "push delivered");
            PushResult::delivered(status, endpoint)
        }
        404 | 410 => {
            tracing::info!(endpoint, status, "push subscription expired");
            PushResult::failed(status, endpoint, EXPIRED_SUBSCRIPTION_ERROR)
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status, body = %body, "push service rejected message");
            PushResult::failed(
                status,
                endpoint,
                format!("Push service returned {status}: {body}"),
            )
        }
    }
}
