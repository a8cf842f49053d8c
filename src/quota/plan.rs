//! Subscription plan resolution with local caching
//!
//! Resolves a user's tier from the preference store and keeps it in a
//! TTL-based cache to avoid a lookup before every prompt. Absence of data,
//! unknown plan strings, and lookup errors all resolve to the metered
//! default; nothing short of an explicit unlimited plan lifts the caps.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use super::prefs::PreferenceStore;
use super::types::PlanTier;

/// Helper to acquire read lock with poison recovery
fn acquire_read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read()
        .unwrap_or_else(|poisoned: PoisonError<RwLockReadGuard<'_, T>>| {
            warn!("RwLock was poisoned on read, recovering inner value");
            poisoned.into_inner()
        })
}

/// Helper to acquire write lock with poison recovery
fn acquire_write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write()
        .unwrap_or_else(|poisoned: PoisonError<RwLockWriteGuard<'_, T>>| {
            warn!("RwLock was poisoned on write, recovering inner value");
            poisoned.into_inner()
        })
}

/// Cache TTL in milliseconds (5 minutes)
const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

struct CachedTier {
    tier: PlanTier,
    cached_at: i64,
}

/// Plan resolver with a session-level cache
pub struct PlanResolver {
    store: Arc<PreferenceStore>,
    cache: RwLock<HashMap<String, CachedTier>>,
}

impl PlanResolver {
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a user's tier, consulting the cache first.
    ///
    /// A store error resolves to the metered tier rather than propagating:
    /// a transient lookup failure must never grant unlimited usage, and the
    /// caller is not expected to block a study session on it either.
    pub fn resolve(&self, user_id: &str) -> PlanTier {
        if let Some(tier) = self.get_cached(user_id) {
            return tier;
        }

        let tier = match self.store.subscription_plan(user_id) {
            Ok(plan) => PlanTier::from_plan_str(plan.as_deref()),
            Err(e) => {
                warn!(user = user_id, "Plan lookup failed, assuming metered: {}", e);
                PlanTier::Personal
            }
        };

        self.update_cache(user_id, tier);
        tier
    }

    /// Drop a user's cached tier (e.g. right after checkout completes)
    pub fn invalidate(&self, user_id: &str) {
        let mut cache = acquire_write_lock(&self.cache);
        cache.remove(user_id);
        tracing::debug!(user = user_id, "Invalidated cached plan");
    }

    fn get_cached(&self, user_id: &str) -> Option<PlanTier> {
        let cache = acquire_read_lock(&self.cache);
        cache.get(user_id).and_then(|entry| {
            let age = Utc::now().timestamp_millis() - entry.cached_at;
            (age < CACHE_TTL_MS).then_some(entry.tier)
        })
    }

    fn update_cache(&self, user_id: &str, tier: PlanTier) {
        let mut cache = acquire_write_lock(&self.cache);
        cache.insert(
            user_id.to_string(),
            CachedTier {
                tier,
                cached_at: Utc::now().timestamp_millis(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(dir: &TempDir) -> (Arc<PreferenceStore>, PlanResolver) {
        let store = Arc::new(PreferenceStore::open(dir.path().join("prefs.db")).unwrap());
        let resolver = PlanResolver::new(Arc::clone(&store));
        (store, resolver)
    }

    #[test]
    fn test_missing_plan_defaults_to_metered() {
        let dir = TempDir::new().unwrap();
        let (_, resolver) = resolver(&dir);
        assert_eq!(resolver.resolve("user_1"), PlanTier::Personal);
    }

    #[test]
    fn test_personal_plus_is_unlimited() {
        let dir = TempDir::new().unwrap();
        let (store, resolver) = resolver(&dir);

        store.set_plan("user_1", Some("personal-plus")).unwrap();
        assert_eq!(resolver.resolve("user_1"), PlanTier::PersonalPlus);
        assert!(resolver.resolve("user_1").is_unlimited());
    }

    #[test]
    fn test_unknown_plan_string_is_metered() {
        let dir = TempDir::new().unwrap();
        let (store, resolver) = resolver(&dir);

        store.set_plan("user_1", Some("enterprise")).unwrap();
        assert_eq!(resolver.resolve("user_1"), PlanTier::Personal);
    }

    #[test]
    fn test_cache_serves_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let (store, resolver) = resolver(&dir);

        assert_eq!(resolver.resolve("user_1"), PlanTier::Personal);

        // The upgrade lands in the store but the cached tier still answers
        store.set_plan("user_1", Some("personal-plus")).unwrap();
        assert_eq!(resolver.resolve("user_1"), PlanTier::Personal);

        resolver.invalidate("user_1");
        assert_eq!(resolver.resolve("user_1"), PlanTier::PersonalPlus);
    }
}
