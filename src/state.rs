use crate::adapters::WebPushSender;
use crate::channel::AligoClient;
use crate::config::AppConfig;
use crate::error::StartupError;
use crate::notify::Notifier;
use crate::push::{self, Registry};

pub type AppNotifier = Notifier<WebPushSender, AligoClient, Registry, Registry>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub push: Option<WebPushSender>,
    pub notifier: AppNotifier,
}

impl AppState {
    pub fn new(config: AppConfig, registry: Registry) -> Result<Self, StartupError> {
        let push = push::push_sender_from_config(&config);
        let channel = AligoClient::new(config.aligo.clone(), config.request_timeout)?;
        let notifier = Notifier::new(
            push.clone(),
            channel,
            registry.clone(),
            registry,
            &config.app_name,
        );
        Ok(Self {
            config,
            push,
            notifier,
        })
    }

    /// Loads the registry named in `config`, or starts with no users.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let registry = match config.registry.as_deref() {
            Some(path) => Registry::load(path)?,
            None => {
                tracing::warn!("no registry configured; notifications have no recipients");
                Registry::default()
            }
        };
        Self::new(config, registry)
    }
}
