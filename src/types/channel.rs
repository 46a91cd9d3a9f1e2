use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Result of one provider call (alimtalk or SMS).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelResult {
    pub fn failed(error: ChannelError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Alimtalk,
    Sms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartNotificationResult {
    pub success: bool,
    pub method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SmartNotificationResult {
    pub(crate) fn from_channel(method: DeliveryMethod, result: ChannelResult) -> Self {
        Self {
            success: result.success,
            method,
            id: result.id,
            result_code: result.result_code,
            message: result.message,
            error: result.error,
        }
    }
}

/// Link button attached to an alimtalk template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlimtalkButton {
    pub name: String,
    pub link_type: String,
    pub link_type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlimtalkOptions {
    /// Ask the provider to fall back to SMS on its side.
    pub fallback_sms: bool,
    pub buttons: Vec<AlimtalkButton>,
    pub em_title: Option<String>,
}
