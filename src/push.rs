use crate::adapters::WebPushSender;
use crate::config;

mod bulk;
mod classify;
pub mod encrypt;
pub mod keys;
pub mod registry;
pub mod sender;
pub mod vapid;

pub use bulk::send_push_bulk;
pub use classify::{PushFailure, is_retryable_error, should_remove_subscription};
pub use encrypt::{EncryptedPayload, encrypt_payload};
pub use keys::{ContentKeys, derive_content_keys};
pub use registry::Registry;
pub use sender::send_push_notification;
pub use vapid::{create_vapid_jwt, generate_vapid_keys, normalize_signature};
pub(crate) use vapid::{VapidConfigStatus, load_vapid_config};

/// Builds the push sender when VAPID is fully configured. Anything else
/// disables push and is logged.
pub fn push_sender_from_config(config: &config::AppConfig) -> Option<WebPushSender> {
    let vapid = match load_vapid_config(config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            tracing::warn!("push notifications disabled: incomplete VAPID configuration");
            return None;
        }
        VapidConfigStatus::Invalid(err) => {
            tracing::error!(error = %err, "push notifications disabled: invalid VAPID keys");
            return None;
        }
        VapidConfigStatus::Missing => {
            return None;
        }
    };

    match WebPushSender::new(vapid, config.request_timeout, config.push_ttl) {
        Ok(sender) => Some(sender),
        Err(err) => {
            tracing::error!(error = %err, "push notifications disabled: failed to build HTTP client");
            None
        }
    }
}
