use crate::types::push::{PushMessage, PushResult, PushSubscription};

/// Delivers one message to one subscription. Failures are reported inside
/// the returned [`PushResult`], never as an error.
pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = PushResult> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a PushSubscription, message: &'a PushMessage)
    -> Self::Fut<'a>;
}
