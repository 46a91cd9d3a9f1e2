use crate::types::push::PushResult;

/// 404 and 410 mean the subscription is gone for good.
pub fn should_remove_subscription(result: &PushResult) -> bool {
    matches!(result.status_code, 404 | 410)
}

/// Rate limiting and server errors are worth another attempt. Status `0`
/// (no response at all) is not.
pub fn is_retryable_error(result: &PushResult) -> bool {
    result.status_code == 429 || (500..=599).contains(&result.status_code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushFailure {
    SubscriptionExpired,
    RateLimited,
    ServerError,
    ClientError,
    /// No response was received.
    Transport,
}

impl PushFailure {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError)
    }
}

impl PushResult {
    /// `None` for delivered messages.
    pub fn failure(&self) -> Option<PushFailure> {
        if self.success {
            return None;
        }
        let failure = match self.status_code {
            0 => PushFailure::Transport,
            404 | 410 => PushFailure::SubscriptionExpired,
            429 => PushFailure::RateLimited,
            500..=599 => PushFailure::ServerError,
            _ => PushFailure::ClientError,
        };
        Some(failure)
    }
}
