//! Aligo SMS and KakaoTalk alimtalk client.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AligoConfig;
use crate::error::ChannelError;
use crate::types::channel::{AlimtalkOptions, ChannelResult};

/// `result_code` the provider uses for an accepted message.
const ACCEPTED: &str = "-1";
const MIN_PHONE_DIGITS: usize = 10;

#[derive(Clone)]
pub struct AligoClient {
    config: Arc<AligoConfig>,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SmsRequest<'a> {
    api_key: &'a str,
    user_id: &'a str,
    sender: &'a str,
    receiver: &'a str,
    msg: &'a str,
    testmode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct AlimtalkRequest<'a> {
    api_key: &'a str,
    user_id: &'a str,
    sender: &'a str,
    receiver: &'a str,
    msg: &'a str,
    template_code: &'a str,
    fall_back_yn: &'static str,
    testmode: &'static str,
    /// JSON-encoded button list.
    #[serde(skip_serializing_if = "Option::is_none")]
    button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emtitle: Option<&'a str>,
}

/// The provider is inconsistent about quoting numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Text(String),
    Number(i64),
}

impl From<Lenient> for String {
    fn from(value: Lenient) -> Self {
        match value {
            Lenient::Text(text) => text,
            Lenient::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    result_code: Lenient,
    #[serde(default)]
    message: String,
    #[serde(default)]
    msg_id: Option<Lenient>,
    #[serde(default)]
    mid: Option<Lenient>,
}

impl AligoClient {
    pub fn new(config: AligoConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: AligoConfig, http: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            http,
        }
    }

    pub async fn send_sms(&self, to: &str, message: &str, title: Option<&str>) -> ChannelResult {
        let config = &*self.config;
        let (Some(api_key), Some(user_id), Some(sender)) = (
            config.api_key.as_deref(),
            config.user_id.as_deref(),
            config.sender.as_deref(),
        ) else {
            tracing::warn!("aligo SMS credentials not configured");
            return ChannelResult::failed(ChannelError::SmsNotConfigured);
        };
        let receiver = match normalize_phone(to) {
            Ok(receiver) => receiver,
            Err(err) => return ChannelResult::failed(err),
        };

        let request = SmsRequest {
            api_key,
            user_id,
            sender,
            receiver: &receiver,
            msg: message,
            testmode: self.testmode(),
            title: title.filter(|title| !title.is_empty()),
        };
        self.post("/send", &request, "sms").await
    }

    pub async fn send_alimtalk(
        &self,
        to: &str,
        template_code: &str,
        message: &str,
        options: &AlimtalkOptions,
    ) -> ChannelResult {
        let config = &*self.config;
        let (Some(api_key), Some(user_id), Some(sender_key)) = (
            config.api_key.as_deref(),
            config.user_id.as_deref(),
            config.kakao_sender_key.as_deref(),
        ) else {
            tracing::warn!("aligo alimtalk credentials not configured");
            return ChannelResult::failed(ChannelError::AlimtalkNotConfigured);
        };
        let receiver = match normalize_phone(to) {
            Ok(receiver) => receiver,
            Err(err) => return ChannelResult::failed(err),
        };

        let button = if options.buttons.is_empty() {
            None
        } else {
            match serde_json::to_string(&options.buttons) {
                Ok(button) => Some(button),
                Err(err) => return ChannelResult::failed(ChannelError::Transport(err.to_string())),
            }
        };

        let request = AlimtalkRequest {
            api_key,
            user_id,
            sender: sender_key,
            receiver: &receiver,
            msg: message,
            template_code,
            fall_back_yn: yes_no(options.fallback_sms),
            testmode: self.testmode(),
            button,
            emtitle: options.em_title.as_deref().filter(|title| !title.is_empty()),
        };
        self.post("/alimtalk/send", &request, "alimtalk").await
    }

    fn testmode(&self) -> &'static str {
        yes_no(self.config.test_mode)
    }

    async fn post<T: Serialize>(&self, path: &str, request: &T, channel: &'static str) -> ChannelResult {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let response = match self.http.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(channel, error = %err, "aligo request failed");
                return ChannelResult::failed(ChannelError::Transport(err.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(channel, status = status.as_u16(), body = %body, "aligo API error");
            return ChannelResult::failed(ChannelError::Api(status.as_u16()));
        }

        let parsed: ProviderResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!(channel, error = %err, "aligo response was not understood");
                return ChannelResult::failed(ChannelError::Transport(err.to_string()));
            }
        };

        let result_code = String::from(parsed.result_code);
        if result_code == ACCEPTED {
            tracing::debug!(channel, "aligo accepted message");
            return ChannelResult {
                success: true,
                id: parsed.mid.or(parsed.msg_id).map(String::from),
                result_code: Some(result_code),
                message: Some(parsed.message),
                error: None,
            };
        }

        tracing::warn!(channel, result_code = %result_code, message = %parsed.message, "aligo rejected message");
        ChannelResult {
            success: false,
            id: None,
            result_code: Some(result_code),
            error: Some(ChannelError::Provider(parsed.message.clone()).to_string()),
            message: Some(parsed.message),
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Y" } else { "N" }
}

/// Keeps the digits of `to`; fewer than ten is not a valid Korean number.
pub fn normalize_phone(to: &str) -> Result<String, ChannelError> {
    let digits: String = to.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(ChannelError::InvalidPhone);
    }
    Ok(digits)
}
