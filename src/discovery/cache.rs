//! Two-tier venue cache
//!
//! Transient entries come from probing and expire after the TTL. Permanent entries are
//! written after an observed successful trade and never expire. Resolved AMM pool
//! addresses share the transient TTL.
//!
//! Expired entries are swept once the cache grows past `max_entries`, and periodically
//! by [`VenueCache::spawn_pruner`].

use crate::types::Venue;
use dashmap::DashMap;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 4_096;

#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub token_id: Pubkey,
    pub venue: Venue,
    pub inserted_at: Instant,
    pub permanent: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub permanent: usize,
    pub pools: usize,
}

#[derive(Debug)]
pub struct VenueCache {
    entries: DashMap<Pubkey, CacheEntry>,
    /// AMM pool address per token
    pools: DashMap<Pubkey, (Pubkey, Instant)>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for VenueCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl VenueCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            pools: DashMap::new(),
            ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    fn is_live(&self, entry: &CacheEntry) -> bool {
        entry.permanent || entry.inserted_at.elapsed() < self.ttl
    }

    /// Live entry for `token`; an expired transient entry is evicted and counts as a miss
    pub fn get(&self, token: &Pubkey) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.get(token) {
            if self.is_live(&entry) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(*entry);
            }
        }

        if self
            .entries
            .remove_if(token, |_, entry| !self.is_live(entry))
            .is_some()
        {
            debug!(token = %token, "Evicted expired venue entry");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Records a probed venue. Never downgrades a permanent entry.
    pub fn insert_transient(&self, token: Pubkey, venue: Venue) {
        self.entries
            .entry(token)
            .and_modify(|entry| {
                if !entry.permanent {
                    entry.venue = venue;
                    entry.inserted_at = Instant::now();
                }
            })
            .or_insert_with(|| CacheEntry {
                token_id: token,
                venue,
                inserted_at: Instant::now(),
                permanent: false,
            });
        self.prune_if_full();
    }

    /// Pins `venue` for `token` after a confirmed trade
    pub fn mark_confirmed(&self, token: Pubkey, venue: Venue) {
        self.entries.insert(
            token,
            CacheEntry {
                token_id: token,
                venue,
                inserted_at: Instant::now(),
                permanent: true,
            },
        );
    }

    /// Pool address resolved for `token` within the TTL
    pub fn pool(&self, token: &Pubkey) -> Option<Pubkey> {
        let (pool, resolved_at) = *self.pools.get(token)?;
        if resolved_at.elapsed() < self.ttl {
            return Some(pool);
        }
        self.pools
            .remove_if(token, |_, (_, at)| at.elapsed() >= self.ttl);
        None
    }

    pub fn insert_pool(&self, token: Pubkey, pool: Pubkey) {
        self.pools.insert(token, (pool, Instant::now()));
        self.prune_if_full();
    }

    /// Drops a transient entry and the token's pool address. Returns whether a venue
    /// entry was removed.
    pub fn invalidate(&self, token: &Pubkey) -> bool {
        self.pools.remove(token);
        self.entries
            .remove_if(token, |_, entry| !entry.permanent)
            .is_some()
    }

    /// Removes expired transient entries and pool addresses; returns how many went
    pub fn prune(&self) -> usize {
        let before = self.entries.len() + self.pools.len();
        self.entries.retain(|_, entry| self.is_live(entry));
        self.pools.retain(|_, (_, at)| at.elapsed() < self.ttl);
        let removed = before.saturating_sub(self.entries.len() + self.pools.len());
        if removed > 0 {
            debug!(removed, "Pruned expired venue cache entries");
        }
        removed
    }

    fn prune_if_full(&self) {
        if self.entries.len() + self.pools.len() > self.max_entries {
            self.prune();
        }
    }

    /// Sweeps expired entries every `every` until the cache is dropped elsewhere and
    /// only this task holds it
    pub fn spawn_pruner(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if Arc::strong_count(&cache) == 1 {
                    break;
                }
                cache.prune();
            }
        })
    }

    pub fn stats(&self) -> CacheStats {
        let permanent = self.entries.iter().filter(|e| e.permanent).count();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
            permanent,
            pools: self.pools.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_transient_entry_expires() {
        let cache = VenueCache::new(Duration::from_secs(300));
        let token = Pubkey::new_unique();

        cache.insert_transient(token, Venue::PumpCurve);
        assert_eq!(cache.get(&token).map(|e| e.venue), Some(Venue::PumpCurve));

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.get(&token).is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_entry_never_expires() {
        let cache = VenueCache::default();
        let token = Pubkey::new_unique();

        cache.mark_confirmed(token, Venue::PumpAmm);
        tokio::time::advance(Duration::from_secs(86_400)).await;

        let entry = cache.get(&token).unwrap();
        assert!(entry.permanent);
        assert_eq!(entry.venue, Venue::PumpAmm);
    }

    #[test]
    fn test_transient_insert_does_not_downgrade() {
        let cache = VenueCache::default();
        let token = Pubkey::new_unique();

        cache.mark_confirmed(token, Venue::LaunchpadCurve);
        cache.insert_transient(token, Venue::Aggregator);

        let entry = cache.get(&token).unwrap();
        assert_eq!(entry.venue, Venue::LaunchpadCurve);
        assert!(entry.permanent);
    }

    #[test]
    fn test_invalidate_only_drops_transient() {
        let cache = VenueCache::default();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        cache.insert_transient(a, Venue::PumpCurve);
        cache.mark_confirmed(b, Venue::PumpCurve);

        assert!(cache.invalidate(&a));
        assert!(!cache.invalidate(&b));
        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
        assert_eq!(cache.stats().permanent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_keeps_permanent() {
        let cache = VenueCache::new(Duration::from_secs(1));
        cache.insert_transient(Pubkey::new_unique(), Venue::PumpCurve);
        cache.mark_confirmed(Pubkey::new_unique(), Venue::PumpAmm);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.stats().entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_growth_past_limit_sweeps_expired_mints() {
        let cache = VenueCache::new(Duration::from_secs(60)).with_max_entries(16);
        for _ in 0..16 {
            cache.insert_transient(Pubkey::new_unique(), Venue::PumpCurve);
        }
        cache.mark_confirmed(Pubkey::new_unique(), Venue::PumpAmm);
        assert_eq!(cache.stats().entries, 17);

        tokio::time::advance(Duration::from_secs(61)).await;
        let fresh = Pubkey::new_unique();
        cache.insert_transient(fresh, Venue::LaunchpadCurve);

        let stats = cache.stats();
        assert_eq!((stats.entries, stats.permanent), (2, 1));
        assert!(cache.get(&fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_address_expires_with_ttl() {
        let cache = VenueCache::new(Duration::from_secs(60));
        let token = Pubkey::new_unique();
        let pool = Pubkey::new_unique();

        cache.insert_pool(token, pool);
        assert_eq!(cache.pool(&token), Some(pool));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.pool(&token), None);
        assert_eq!(cache.stats().pools, 0);
    }

    #[test]
    fn test_invalidate_drops_pool_address() {
        let cache = VenueCache::default();
        let token = Pubkey::new_unique();
        cache.mark_confirmed(token, Venue::PumpAmm);
        cache.insert_pool(token, Pubkey::new_unique());

        assert!(!cache.invalidate(&token));
        assert_eq!(cache.pool(&token), None);
        assert_eq!(cache.stats().permanent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_pruner_shrinks_cache() {
        let cache = Arc::new(VenueCache::new(Duration::from_secs(60)));
        for _ in 0..32 {
            let token = Pubkey::new_unique();
            cache.insert_transient(token, Venue::PumpCurve);
            cache.insert_pool(token, Pubkey::new_unique());
        }
        let pruner = cache.spawn_pruner(Duration::from_secs(30));
        assert_eq!(cache.stats().entries, 32);

        tokio::time::sleep(Duration::from_secs(95)).await;
        let stats = cache.stats();
        assert_eq!((stats.entries, stats.pools), (0, 0));

        drop(cache);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(pruner.is_finished());
    }
}
