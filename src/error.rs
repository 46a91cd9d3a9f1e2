use std::path::PathBuf;

/// Failures while preparing a push message: decoding key material, deriving
/// keys, encrypting, or signing the VAPID token.
#[derive(Debug, thiserror::Error)]
pub enum WebPushError {
    #[error("invalid base64url in {field}: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{field} must decode to {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} is not a valid P-256 public key")]
    InvalidPublicKey(&'static str),

    #[error("VAPID private key is not a valid P-256 scalar")]
    InvalidPrivateKey,

    #[error("VAPID public key does not match the private key")]
    KeyMismatch,

    #[error("payload of {actual} bytes exceeds the single-record limit of {max} bytes")]
    PayloadTooLarge { max: usize, actual: usize },

    #[error("AES-GCM encryption failed")]
    Encryption,

    #[error("malformed DER signature: {0}")]
    MalformedSignature(&'static str),

    #[error("invalid push endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by the template/SMS provider. The `Display` text is the
/// error code surfaced in channel results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("SMS_NOT_CONFIGURED")]
    SmsNotConfigured,

    #[error("ALIMTALK_NOT_CONFIGURED")]
    AlimtalkNotConfigured,

    #[error("INVALID_PHONE")]
    InvalidPhone,

    #[error("API_ERROR: {0}")]
    Api(u16),

    #[error("ALIGO_ERROR: {0}")]
    Provider(String),

    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize registry {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("unknown user '{0}'")]
    UnknownUser(String),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("subscription lookup failed: {0}")]
    Subscriptions(String),

    #[error("user lookup failed: {0}")]
    User(String),

    #[error("fallback delivery failed: {0}")]
    Fallback(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
