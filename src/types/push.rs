use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// VAPID identity used to sign push requests. Both halves are base64url and
/// always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeys {
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub keys: VapidKeys,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

impl PushSubscription {
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

/// Outcome of a single push attempt. `status_code` is `0` when no HTTP
/// response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResult {
    pub success: bool,
    pub status_code: u16,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushResult {
    pub fn delivered(status_code: u16, endpoint: impl Into<String>) -> Self {
        Self {
            success: true,
            status_code,
            endpoint: endpoint.into(),
            error: None,
        }
    }

    pub fn failed(status_code: u16, endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            endpoint: endpoint.into(),
            error: Some(error.into()),
        }
    }

    pub fn transport_failure(endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        Self::failed(0, endpoint, error)
    }
}
