//! Client contexts controlled by the interception layer.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Open client contexts and the controller currently serving each of them.
///
/// Uses a HashMap behind a tokio RwLock; cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, Option<String>>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened client. It starts uncontrolled.
    pub async fn register(&self, client_id: impl Into<String>) {
        self.clients.write().await.entry(client_id.into()).or_insert(None);
    }

    /// Forget a closed client. Returns whether it was known.
    pub async fn unregister(&self, client_id: &str) -> bool {
        self.clients.write().await.remove(client_id).is_some()
    }

    /// Controller serving `client_id`, if any.
    pub async fn controller_of(&self, client_id: &str) -> Option<String> {
        self.clients.read().await.get(client_id).cloned().flatten()
    }

    /// Make `controller` the controller of every open client, without a reload.
    ///
    /// Returns the number of clients whose controller changed.
    pub async fn claim(&self, controller: &str) -> usize {
        let mut clients = self.clients.write().await;
        let mut changed = 0;
        for current in clients.values_mut() {
            if current.as_deref() != Some(controller) {
                *current = Some(controller.to_string());
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_takes_every_client() {
        let registry = ClientRegistry::new();
        registry.register("tab-1").await;
        registry.register("tab-2").await;

        assert_eq!(registry.claim("app-shell-v4").await, 2);
        assert_eq!(registry.controller_of("tab-1").await.as_deref(), Some("app-shell-v4"));
        assert_eq!(registry.controller_of("tab-2").await.as_deref(), Some("app-shell-v4"));
        assert_eq!(registry.claim("app-shell-v4").await, 0);
    }

    #[tokio::test]
    async fn test_claim_replaces_previous_controller() {
        let registry = ClientRegistry::new();
        registry.register("tab-1").await;
        registry.claim("app-shell-v3").await;

        assert_eq!(registry.claim("app-shell-v4").await, 1);
        assert_eq!(registry.controller_of("tab-1").await.as_deref(), Some("app-shell-v4"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let registry = ClientRegistry::new();
        registry.register("tab-1").await;
        registry.claim("app-shell-v4").await;
        // registering again keeps the controller
        registry.register("tab-1").await;
        assert_eq!(registry.controller_of("tab-1").await.as_deref(), Some("app-shell-v4"));

        assert!(registry.unregister("tab-1").await);
        assert!(!registry.unregister("tab-1").await);
        assert!(registry.controller_of("tab-1").await.is_none());
        assert_eq!(registry.claim("app-shell-v4").await, 0);
    }
}
