use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::NotifyError;
use crate::ports::{PushSender, SubscriptionStore, TemplateChannel, UserDirectory};
use crate::push::{send_push_bulk, should_remove_subscription};
use crate::templates::{NotificationType, build_notification_message, sms_text};
use crate::types::push::{PushMessage, PushResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Pushed { delivered: usize },
    Sms,
    /// Nothing was delivered and the user has no phone number.
    NoContact,
}

/// Delivers business notifications: push first, plain SMS when no push
/// subscription accepted the message.
pub struct Notifier<P, C, S, U> {
    push: Option<P>,
    channel: Arc<C>,
    store: Arc<S>,
    users: Arc<U>,
    app_name: Arc<str>,
}

impl<P: Clone, C, S, U> Clone for Notifier<P, C, S, U> {
    fn clone(&self) -> Self {
        Self {
            push: self.push.clone(),
            channel: Arc::clone(&self.channel),
            store: Arc::clone(&self.store),
            users: Arc::clone(&self.users),
            app_name: Arc::clone(&self.app_name),
        }
    }
}

impl<P, C, S, U> Notifier<P, C, S, U>
where
    P: PushSender,
    C: TemplateChannel,
    S: SubscriptionStore,
    U: UserDirectory,
{
    /// `push` is `None` when VAPID is not configured; every notification then
    /// goes straight to the SMS fallback.
    pub fn new(push: Option<P>, channel: C, store: S, users: U, app_name: &str) -> Self {
        Self {
            push,
            channel: Arc::new(channel),
            store: Arc::new(store),
            users: Arc::new(users),
            app_name: Arc::from(app_name),
        }
    }

    /// Never fails and never panics; problems are logged and dropped so the
    /// caller's own work is not interrupted.
    pub async fn notify_user(
        &self,
        user_id: &str,
        kind: NotificationType,
        params: &BTreeMap<String, String>,
    ) {
        let attempt = AssertUnwindSafe(self.try_notify_user(user_id, kind, params))
            .catch_unwind()
            .await;
        match attempt {
            Ok(Ok(outcome)) => {
                tracing::debug!(user_id, kind = %kind, ?outcome, "notification handled");
            }
            Ok(Err(err)) => {
                tracing::warn!(user_id, kind = %kind, error = %err, "notification dropped");
            }
            Err(_) => {
                tracing::error!(user_id, kind = %kind, "notification panicked");
            }
        }
    }

    pub async fn try_notify_user(
        &self,
        user_id: &str,
        kind: NotificationType,
        params: &BTreeMap<String, String>,
    ) -> Result<NotifyOutcome, NotifyError> {
        let payload = build_notification_message(kind, params);
        let subscriptions = self
            .store
            .subscriptions(user_id)
            .await
            .map_err(|err| NotifyError::Subscriptions(err.to_string()))?;

        let results = match &self.push {
            Some(push) if !subscriptions.is_empty() => {
                let mut data = params.clone();
                data.insert("type".to_string(), kind.to_string());
                let message = PushMessage {
                    title: payload.title.clone(),
                    body: payload.body.clone(),
                    data: Some(data),
                };
                send_push_bulk(push, &subscriptions, &message).await
            }
            _ => Vec::new(),
        };
        self.prune_expired(user_id, &results).await;

        let delivered = results.iter().filter(|result| result.success).count();
        if delivered > 0 {
            return Ok(NotifyOutcome::Pushed { delivered });
        }

        let phone = self
            .users
            .phone_number(user_id)
            .await
            .map_err(|err| NotifyError::User(err.to_string()))?;
        let Some(phone) = phone.filter(|phone| !phone.trim().is_empty()) else {
            tracing::info!(user_id, "no push delivery and no phone number on file");
            return Ok(NotifyOutcome::NoContact);
        };

        tracing::info!(
            user_id,
            subscriptions = subscriptions.len(),
            "push not delivered, falling back to SMS"
        );
        let text = sms_text(&self.app_name, &payload);
        let result = self.channel.send_plain_message(&phone, &text, None).await;
        if result.success {
            Ok(NotifyOutcome::Sms)
        } else {
            Err(NotifyError::Fallback(result.error.unwrap_or_default()))
        }
    }

    async fn prune_expired(&self, user_id: &str, results: &[PushResult]) {
        for result in results.iter().filter(|result| should_remove_subscription(result)) {
            if let Err(err) = self.store.remove(user_id, &result.endpoint).await {
                tracing::warn!(
                    user_id,
                    endpoint = %result.endpoint,
                    error = %err,
                    "failed to remove expired subscription"
                );
            }
        }
    }
}
