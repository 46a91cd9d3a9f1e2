use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ALIGO_API_URL: &str = "https://smartsms.aligo.in/api";
pub const DEFAULT_PUSH_TTL: u32 = 86_400;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppConfig {
    /// Shown as the `[name]` prefix of fallback SMS text.
    pub app_name: String,
    pub registry: Option<PathBuf>,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    pub push_ttl: u32,
    pub request_timeout: Duration,
    pub aligo: AligoConfig,
}

#[derive(Clone)]
pub struct AligoConfig {
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    pub sender: Option<String>,
    pub kakao_sender_key: Option<String>,
    pub base_url: String,
    /// Sends `testmode: "Y"` so the provider accepts but does not deliver.
    pub test_mode: bool,
}

impl Default for AligoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_id: None,
            sender: None,
            kakao_sender_key: None,
            base_url: DEFAULT_ALIGO_API_URL.to_string(),
            test_mode: false,
        }
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "SafetyWallet".to_string(),
            registry: None,
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
            push_ttl: DEFAULT_PUSH_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            aligo: AligoConfig::default(),
        }
    }
}
