//! File-backed users and push subscriptions.
//!
//! ```toml
//! [users.worker-17]
//! phone = "010-1234-5678"
//!
//! [[users.worker-17.subscriptions]]
//! endpoint = "https://fcm.googleapis.com/fcm/send/..."
//! keys = { p256dh = "...", auth = "..." }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::ports::{SubscriptionStore, UserDirectory};
use crate::types::push::PushSubscription;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub subscriptions: Vec<PushSubscription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    users: BTreeMap<String, UserRecord>,
}

/// Shared handle; clones see the same users. Removals are written back to
/// the file the registry was loaded from.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    path: Option<PathBuf>,
    users: Arc<Mutex<BTreeMap<String, UserRecord>>>,
    /// Serializes file writes so snapshots land in the order they were taken.
    writes: Arc<tokio::sync::Mutex<()>>,
}

impl Registry {
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RegistryFile =
            toml::from_str(&contents).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), users = file.users.len(), "loaded registry");
        Ok(Self {
            path: Some(path.to_path_buf()),
            users: Arc::new(Mutex::new(file.users)),
            writes: Arc::default(),
        })
    }

    pub fn in_memory(users: impl IntoIterator<Item = (String, UserRecord)>) -> Self {
        Self {
            path: None,
            users: Arc::new(Mutex::new(users.into_iter().collect())),
            writes: Arc::default(),
        }
    }

    pub fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.lock().get(user_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, UserRecord>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn remove_subscription(&self, user_id: &str, endpoint: &str) -> Result<(), RegistryError> {
        let _write = self.writes.lock().await;
        let snapshot = {
            let mut users = self.lock();
            let record = users
                .get_mut(user_id)
                .ok_or_else(|| RegistryError::UnknownUser(user_id.to_string()))?;
            let before = record.subscriptions.len();
            record
                .subscriptions
                .retain(|subscription| subscription.endpoint != endpoint);
            if record.subscriptions.len() == before {
                return Ok(());
            }
            tracing::info!(user_id, endpoint, "removed push subscription");
            users.clone()
        };
        match &self.path {
            Some(path) => persist(path, snapshot).await,
            None => Ok(()),
        }
    }
}

async fn persist(path: &Path, users: BTreeMap<String, UserRecord>) -> Result<(), RegistryError> {
    let contents = toml::to_string(&RegistryFile { users }).map_err(|source| {
        RegistryError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })
}

impl SubscriptionStore for Registry {
    type Error = RegistryError;
    type ListFut<'a>
        = Pin<Box<dyn Future<Output = Result<Vec<PushSubscription>, Self::Error>> + Send + 'a>>
    where
        Self: 'a;
    type RemoveFut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn subscriptions<'a>(&'a self, user_id: &'a str) -> Self::ListFut<'a> {
        Box::pin(async move {
            Ok(self
                .user(user_id)
                .map(|record| record.subscriptions)
                .unwrap_or_default())
        })
    }

    fn remove<'a>(&'a self, user_id: &'a str, endpoint: &'a str) -> Self::RemoveFut<'a> {
        Box::pin(self.remove_subscription(user_id, endpoint))
    }
}

impl UserDirectory for Registry {
    type Error = RegistryError;
    type PhoneFut<'a>
        = Pin<Box<dyn Future<Output = Result<Option<String>, Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn phone_number<'a>(&'a self, user_id: &'a str) -> Self::PhoneFut<'a> {
        Box::pin(async move { Ok(self.user(user_id).and_then(|record| record.phone)) })
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
[users.worker-17]
phone = "010-1234-5678"

[[users.worker-17.subscriptions]]
endpoint = "https://push.example/a"
keys = { p256dh = "BPk", auth = "YXV0aA" }

[[users.worker-17.subscriptions]]
endpoint = "https://push.example/b"
keys = { p256dh = "BPl", auth = "YXV0aB" }

[users.visitor]
"#;

    fn temp_registry(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pushgate-registry-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("registry.toml");
        std::fs::write(&path, REGISTRY).expect("write registry");
        path
    }

    #[tokio::test]
    async fn load__should_read_users_and_subscriptions() {
        // Given
        let path = temp_registry("load");

        // When
        let registry = Registry::load(&path).expect("load");

        // Then
        let subscriptions = registry.subscriptions("worker-17").await.expect("list");
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions[0].keys.p256dh, "BPk");
        assert_eq!(
            registry.phone_number("worker-17").await.expect("phone"),
            Some("010-1234-5678".to_string())
        );
        assert_eq!(registry.phone_number("visitor").await.expect("phone"), None);
        assert!(registry.subscriptions("nobody").await.expect("list").is_empty());
    }

    #[test]
    fn load__should_report_parse_errors_with_path() {
        // Given
        let path = temp_registry("parse");
        std::fs::write(&path, "users = 3").expect("write");

        // When
        let result = Registry::load(&path);

        // Then
        assert!(matches!(result, Err(RegistryError::Parse { path: p, .. }) if p == path));
    }

    #[test]
    fn load__should_report_missing_files() {
        let result = Registry::load(Path::new("/nonexistent/pushgate/registry.toml"));
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }

    #[tokio::test]
    async fn remove__should_drop_endpoint_and_persist() {
        // Given
        let path = temp_registry("remove");
        let registry = Registry::load(&path).expect("load");

        // When
        registry
            .remove("worker-17", "https://push.example/a")
            .await
            .expect("remove");

        // Then
        let remaining = registry.subscriptions("worker-17").await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].endpoint, "https://push.example/b");
        let reloaded = Registry::load(&path).expect("reload");
        assert_eq!(reloaded.user("worker-17"), registry.user("worker-17"));
    }

    #[tokio::test]
    async fn remove__should_fail_for_unknown_user() {
        // Given
        let registry = Registry::in_memory([]);

        // When
        let result = registry.remove("ghost", "https://push.example/a").await;

        // Then
        assert!(matches!(result, Err(RegistryError::UnknownUser(user)) if user == "ghost"));
    }

    #[tokio::test]
    async fn remove__should_persist_concurrent_removals() {
        // Given
        let path = temp_registry("concurrent");
        let registry = Registry::load(&path).expect("load");

        // When
        let (first, second) = tokio::join!(
            registry.remove("worker-17", "https://push.example/a"),
            registry.remove("worker-17", "https://push.example/b"),
        );

        // Then
        first.expect("first removal");
        second.expect("second removal");
        let reloaded = Registry::load(&path).expect("reload");
        assert_eq!(reloaded.user("worker-17").expect("user").subscriptions, Vec::new());
    }
}
