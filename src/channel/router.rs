use crate::ports::TemplateChannel;
use crate::types::channel::{
    AlimtalkButton, AlimtalkOptions, DeliveryMethod, SmartNotificationResult,
};

/// Tries the templated channel first and falls back to exactly one plain SMS
/// attempt. `method` reports the channel of the last attempt.
pub async fn send_smart_notification<C: TemplateChannel>(
    channel: &C,
    to: &str,
    template_code: &str,
    message: &str,
    fallback_title: Option<&str>,
    buttons: &[AlimtalkButton],
) -> SmartNotificationResult {
    let options = AlimtalkOptions {
        fallback_sms: false,
        buttons: buttons.to_vec(),
        em_title: None,
    };
    let templated = channel
        .send_templated_message(to, template_code, message, &options)
        .await;
    if templated.success {
        return SmartNotificationResult::from_channel(DeliveryMethod::Alimtalk, templated);
    }

    tracing::warn!(
        template_code,
        error = templated.error.as_deref().unwrap_or_default(),
        "alimtalk failed, falling back to SMS"
    );
    let plain = channel.send_plain_message(to, message, fallback_title).await;
    SmartNotificationResult::from_channel(DeliveryMethod::Sms, plain)
}
