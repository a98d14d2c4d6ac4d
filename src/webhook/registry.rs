//! Registration and lookup of webhook subscriptions.

use std::sync::Arc;

use crate::error::TickerResult;
use crate::storage::{StorageError, SubscriptionStore};
use crate::time::Timestamp;

use super::subscription::{Subscription, SubscriptionId};

/// Thin CRUD layer over a [`SubscriptionStore`].
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn SubscriptionStore>,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry").finish_non_exhaustive()
    }
}

impl SubscriptionRegistry {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SubscriptionStore> {
        &self.store
    }

    /// Register a webhook that fires after every `threshold` new tracks.
    /// Tracks ingested before registration are never reported.
    ///
    /// # Errors
    ///
    /// Validation errors for a blank URL or zero threshold; store failures.
    pub fn register(&self, target_url: &str, threshold: u32) -> TickerResult<Subscription> {
        self.register_after(target_url, threshold, Timestamp::now())
    }

    /// Register a webhook that only reports tracks ingested after `baseline`.
    ///
    /// # Errors
    ///
    /// Validation errors for a blank URL or zero threshold; store failures.
    pub fn register_after(
        &self,
        target_url: &str,
        threshold: u32,
        baseline: Timestamp,
    ) -> TickerResult<Subscription> {
        let mut subscription = Subscription::new(target_url, threshold, Timestamp::now())?;
        subscription.last_seen = baseline;
        self.store.insert(subscription.clone())?;
        tracing::info!(
            subscription = %subscription.id,
            target = %subscription.target_url,
            threshold,
            "webhook registered"
        );
        Ok(subscription)
    }

    /// Look up a webhook.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn get(&self, id: SubscriptionId) -> Result<Option<Subscription>, StorageError> {
        self.store.get(id)
    }

    /// All registered webhooks.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn list(&self) -> Result<Vec<Subscription>, StorageError> {
        self.store.list()
    }

    /// Remove a webhook, returning the removed record.
    ///
    /// # Errors
    ///
    /// `StorageError::SubscriptionNotFound` for an unknown id.
    pub fn unregister(&self, id: SubscriptionId) -> Result<Subscription, StorageError> {
        let removed = self.store.delete(id)?;
        tracing::info!(subscription = %id, "webhook unregistered");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TickerError, ValidationError};
    use crate::storage::InMemorySubscriptionStore;

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(Arc::new(InMemorySubscriptionStore::new()))
    }

    #[test]
    fn register_get_unregister() {
        let registry = registry();
        let before = Timestamp::now();
        let sub = registry.register("http://hook", 3).unwrap();

        assert!(sub.last_seen >= before);
        assert_eq!(sub.countdown, 3);
        assert_eq!(registry.get(sub.id).unwrap().unwrap(), sub);
        assert_eq!(registry.list().unwrap().len(), 1);

        assert_eq!(registry.unregister(sub.id).unwrap(), sub);
        assert!(registry.get(sub.id).unwrap().is_none());
        assert_eq!(
            registry.unregister(sub.id),
            Err(StorageError::SubscriptionNotFound(sub.id))
        );
    }

    #[test]
    fn register_after_sets_baseline() {
        let registry = registry();
        let sub = registry
            .register_after("http://hook", 1, Timestamp::from_millis(77))
            .unwrap();
        assert_eq!(sub.last_seen, Timestamp::from_millis(77));
        assert_eq!(registry.get(sub.id).unwrap().unwrap().last_seen, Timestamp::from_millis(77));
    }

    #[test]
    fn invalid_registration_is_not_stored() {
        let registry = registry();
        let err = registry.register("", 3).unwrap_err();
        assert!(matches!(err, TickerError::Validation(ValidationError::EmptyTargetUrl)));
        assert!(registry.list().unwrap().is_empty());
    }
}
