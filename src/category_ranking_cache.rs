use crate::error::{MarketplaceError, Result};
use crate::types::{normalize_key, CountChange, ListingEvent};
use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

/// An external cache service that keeps per-category listing counts and the
/// current "top category".
///
/// This structure is decoupled from the `ListingStore` and operates on the
/// events the store publishes. It answers `top_category` in O(1) by maintaining
/// the leader incrementally instead of scanning the counts on every read.
///
/// ## Leader rules
///
/// - A category becomes leader only when its count is **strictly greater** than
///   the leader's count. Ties never dislodge the incumbent.
/// - When the leader's own count drops, the counts are rescanned once. The
///   incumbent keeps its place unless another category is strictly ahead; among
///   several challengers tied for the lead, the one first seen by the cache wins.
/// - Any other update leaves the leader untouched without inspecting other
///   categories.
///
/// ## Thread Safety
///
/// Count updates and the leader decision run under a single `Mutex`, so no
/// reader can observe a leader that disagrees with the counts it was derived
/// from. The leader's display name is published through an `ArcSwap`, which
/// means `top_category` never waits behind an update in progress.
#[derive(Debug)]
pub struct CategoryRankingCache {
    state: Mutex<RankingState>,
    leader_display: ArcSwap<String>,
}

/// Count and first-seen casing of one category.
#[derive(Debug, Clone)]
struct CategoryCount {
    display: String,
    count: u64,
}

#[derive(Debug, Default)]
struct RankingState {
    /// Keyed by normalized name; iteration order is first-seen order.
    categories: IndexMap<String, CategoryCount>,
    /// Normalized key of the current leader.
    leader: Option<String>,
}

impl RankingState {
    fn count_of(&self, key: &str) -> u64 {
        self.categories.get(key).map(|entry| entry.count).unwrap_or(0)
    }

    fn display_of(&self, key: &str) -> String {
        self.categories
            .get(key)
            .map(|entry| entry.display.clone())
            .unwrap_or_default()
    }

    /// Applies one count change and returns the updated count.
    fn update_count(&mut self, category: &str, key: &str, change: CountChange) -> Result<u64> {
        match change {
            CountChange::Increment => {
                let entry = self
                    .categories
                    .entry(key.to_owned())
                    .or_insert_with(|| CategoryCount {
                        display: category.to_owned(),
                        count: 0,
                    });
                entry.count += 1;
                Ok(entry.count)
            }
            CountChange::Decrement => {
                let entry = self.categories.get_mut(key).ok_or_else(|| {
                    MarketplaceError::InvariantViolation {
                        category: category.to_owned(),
                        detail: "removed a listing from a category that was never tracked"
                            .to_owned(),
                    }
                })?;
                if entry.count == 0 {
                    return Err(MarketplaceError::InvariantViolation {
                        category: category.to_owned(),
                        detail: "category count would drop below zero".to_owned(),
                    });
                }
                entry.count -= 1;
                Ok(entry.count)
            }
        }
    }

    /// Decides who leads after `key` moved to `new_count`.
    fn next_leader(&self, key: &str, new_count: u64, change: CountChange) -> Option<String> {
        let Some(leader) = self.leader.as_deref() else {
            return (new_count > 0).then(|| key.to_owned());
        };

        let leader_count = self.count_of(leader);
        if new_count > leader_count {
            Some(key.to_owned())
        } else if key == leader && change == CountChange::Decrement {
            self.rescan(leader, new_count)
        } else {
            self.leader.clone()
        }
    }

    /// Walks every category in first-seen order, keeping the incumbent unless
    /// some other category has a strictly higher count.
    fn rescan(&self, incumbent: &str, incumbent_count: u64) -> Option<String> {
        let mut best = incumbent;
        let mut best_count = incumbent_count;

        for (key, entry) in &self.categories {
            if entry.count > best_count {
                best = key.as_str();
                best_count = entry.count;
            }
        }

        debug!(
            incumbent,
            winner = best,
            count = best_count,
            categories = self.categories.len(),
            "rescanned category ranking"
        );
        (best_count > 0).then(|| best.to_owned())
    }
}

impl CategoryRankingCache {
    /// Creates a new empty ranking cache.
    ///
    /// ## Examples
    ///
    /// ```
    /// use marketplace_index::CategoryRankingCache;
    ///
    /// let cache = CategoryRankingCache::new();
    /// assert_eq!(cache.top_category(), "");
    /// ```
    pub fn new() -> Self {
        CategoryRankingCache {
            state: Mutex::new(RankingState::default()),
            leader_display: ArcSwap::from_pointee(String::new()),
        }
    }

    /// Processes a listing event published by the `ListingStore`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use marketplace_index::{CategoryRankingCache, Decimal, ListingStore};
    ///
    /// let store = ListingStore::new();
    /// let cache = CategoryRankingCache::new();
    ///
    /// let (listing, event) = store.allocate("bob", "Racket", "Light", Decimal::new(80, 0), "Sports", "2024-01-01 09:00:00");
    /// cache.process_listing_event(&event).unwrap();
    /// store.insert(listing);
    ///
    /// assert_eq!(cache.top_category(), "Sports");
    /// ```
    pub fn process_listing_event(&self, event: &ListingEvent) -> Result<()> {
        self.apply(&event.category, event.change)
    }

    /// Applies a +1/-1 change to `category` and updates the leader.
    ///
    /// The whole read-decide-write sequence runs under the cache's mutex, so
    /// concurrent calls are serialized. The first casing seen for a category is
    /// the one reported back forever after.
    ///
    /// Returns `InvariantViolation` when a decrement targets a category that was
    /// never counted or whose count is already zero. The counts are left
    /// untouched in that case.
    pub fn apply(&self, category: &str, change: CountChange) -> Result<()> {
        let key = normalize_key(category);
        let mut state = self.state.lock();

        let new_count = match state.update_count(category, &key, change) {
            Ok(count) => count,
            Err(err) => {
                error!(category, %change, error = %err, "category ranking out of sync");
                return Err(err);
            }
        };

        let next_leader = state.next_leader(&key, new_count, change);
        if next_leader != state.leader {
            let leader_name = next_leader
                .as_deref()
                .map(|leader| state.display_of(leader))
                .unwrap_or_default();
            info!(
                previous = state.leader.as_deref().unwrap_or(""),
                leader = %leader_name,
                count = next_leader.as_deref().map(|leader| state.count_of(leader)).unwrap_or(0),
                "top category changed"
            );
            state.leader = next_leader;
            // Published while the lock is held so publications follow decision order.
            self.leader_display.store(Arc::new(leader_name));
        }

        Ok(())
    }

    /// Returns the display name of the category with the most active listings,
    /// or an empty string when there are none.
    ///
    /// This is a single atomic pointer load and never blocks on `apply`.
    pub fn top_category(&self) -> String {
        (**self.leader_display.load()).clone()
    }

    /// Returns the number of active listings counted for `category`, ignoring case.
    pub fn count(&self, category: &str) -> u64 {
        self.state.lock().count_of(&normalize_key(category))
    }

    /// Returns the first-seen display casing of `category`, if it was ever counted.
    pub fn display_name(&self, category: &str) -> Option<String> {
        self.state
            .lock()
            .categories
            .get(&normalize_key(category))
            .map(|entry| entry.display.clone())
    }

    /// Returns a snapshot of `(display name, count)` pairs in first-seen order.
    ///
    /// Categories whose count dropped to zero are still included.
    pub fn counts(&self) -> Vec<(String, u64)> {
        self.state
            .lock()
            .categories
            .values()
            .map(|entry| (entry.display.clone(), entry.count))
            .collect()
    }
}

impl Default for CategoryRankingCache {
    fn default() -> Self {
        Self::new()
    }
}
