pub mod adapters;
pub mod app;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod notify;
pub mod ports;
pub mod push;
pub mod state;
pub mod templates;
pub mod types;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

pub use app::app;
pub use channel::{AligoClient, send_smart_notification};
pub use error::StartupError;
pub use notify::{Notifier, NotifyOutcome};
pub use push::{
    generate_vapid_keys, is_retryable_error, send_push_bulk, send_push_notification,
    should_remove_subscription,
};
pub use templates::{NotificationType, build_notification_message};

pub async fn serve(config: config::AppConfig, addr: SocketAddr) -> Result<(), StartupError> {
    let state = state::AppState::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!(%addr, push_enabled = state.push.is_some(), "listening");
    axum::serve(listener, app(state))
        .await
        .map_err(StartupError::Serve)
}
