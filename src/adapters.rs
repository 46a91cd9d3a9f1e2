use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::AligoClient;
use crate::ports;
use crate::push::sender::send_push_notification_with_ttl;
use crate::types::channel::{AlimtalkOptions, ChannelResult};
use crate::types::push::{PushMessage, PushResult, PushSubscription, VapidConfig};

#[derive(Clone)]
pub struct WebPushSender {
    vapid: Arc<VapidConfig>,
    client: reqwest::Client,
    ttl: u32,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig, timeout: Duration, ttl: u32) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            vapid: Arc::new(vapid),
            client,
            ttl,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.vapid.keys.public_key
    }
}

impl ports::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = PushResult> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        message: &'a PushMessage,
    ) -> Self::Fut<'a> {
        Box::pin(send_push_notification_with_ttl(
            &self.client,
            subscription,
            message,
            &self.vapid.keys,
            Some(self.vapid.subject.as_str()),
            self.ttl,
        ))
    }
}

impl ports::TemplateChannel for AligoClient {
    type TemplatedFut<'a>
        = Pin<Box<dyn Future<Output = ChannelResult> + Send + 'a>>
    where
        Self: 'a;
    type PlainFut<'a>
        = Pin<Box<dyn Future<Output = ChannelResult> + Send + 'a>>
    where
        Self: 'a;

    fn send_templated_message<'a>(
        &'a self,
        to: &'a str,
        template_code: &'a str,
        message: &'a str,
        options: &'a AlimtalkOptions,
    ) -> Self::TemplatedFut<'a> {
        Box::pin(self.send_alimtalk(to, template_code, message, options))
    }

    fn send_plain_message<'a>(
        &'a self,
        to: &'a str,
        message: &'a str,
        title: Option<&'a str>,
    ) -> Self::PlainFut<'a> {
        Box::pin(self.send_sms(to, message, title))
    }
}
