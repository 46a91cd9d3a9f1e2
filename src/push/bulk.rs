use std::any::Any;
use std::sync::Arc;

use futures::future::join_all;

use crate::ports::PushSender;
use crate::types::push::{PushMessage, PushResult, PushSubscription};

const UNKNOWN_FAULT: &str = "push task failed";

/// Sends `message` to every subscription concurrently. The returned results
/// line up with `subscriptions`; a task that faults yields a status `0`
/// result instead of aborting the batch.
pub async fn send_push_bulk<S: PushSender>(
    sender: &S,
    subscriptions: &[PushSubscription],
    message: &PushMessage,
) -> Vec<PushResult> {
    if subscriptions.is_empty() {
        return Vec::new();
    }

    let message = Arc::new(message.clone());
    let (endpoints, tasks): (Vec<_>, Vec<_>) = subscriptions
        .iter()
        .cloned()
        .map(|subscription| {
            let endpoint = subscription.endpoint.clone();
            let sender = sender.clone();
            let message = Arc::clone(&message);
            let task = tokio::spawn(async move { sender.send(&subscription, &message).await });
            (endpoint, task)
        })
        .unzip();

    let outcomes = join_all(tasks).await;
    let results: Vec<PushResult> = endpoints
        .into_iter()
        .zip(outcomes)
        .map(|(endpoint, outcome)| match outcome {
            Ok(result) => result,
            Err(err) => {
                let reason = if err.is_panic() {
                    panic_message(err.into_panic())
                } else {
                    err.to_string()
                };
                tracing::error!(endpoint = %endpoint, error = %reason, "push task faulted");
                PushResult::transport_failure(endpoint, reason)
            }
        })
        .collect();

    let delivered = results.iter().filter(|result| result.success).count();
    tracing::debug!(
        total = results.len(),
        delivered,
        "bulk push finished"
    );
    results
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        UNKNOWN_FAULT.to_string()
    }
}
