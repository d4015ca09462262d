use crate::category_query::{self, SortKey, SortOrder};
use crate::category_ranking_cache::CategoryRankingCache;
use crate::error::{MarketplaceError, Result};
use crate::identity_registry::IdentityRegistry;
use crate::listing_store::ListingStore;
use crate::types::{Listing, ListingId, FIRST_LISTING_ID};
use rust_decimal::Decimal;
use tracing::debug;

/// Settings a `Marketplace` is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// Id given to the first listing; later ones count up from here
    pub first_listing_id: ListingId,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            first_listing_id: FIRST_LISTING_ID,
        }
    }
}

/// The in-memory marketplace: users, listings and the category ranking.
///
/// Every mutation of the listing store is routed through the ranking cache, so
/// `get_top_category` always reflects the listings currently stored. All methods
/// take `&self`; wrap the marketplace in an `Arc` to share it across threads.
///
/// ## Examples
///
/// ```
/// use marketplace_index::{Decimal, Marketplace, SortKey, SortOrder};
///
/// let marketplace = Marketplace::new();
/// marketplace.register_user("alice").unwrap();
///
/// let id = marketplace
///     .create_listing("alice", "Lamp", "Desk lamp", Decimal::new(25, 0), "Home", "2024-03-01 12:00:00")
///     .unwrap();
///
/// assert_eq!(marketplace.get_listing(id).unwrap().title, "Lamp");
/// assert_eq!(marketplace.get_top_category(), "Home");
///
/// let home = marketplace.query_category("HOME", SortKey::Time, SortOrder::Ascending).unwrap();
/// assert_eq!(home.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Marketplace {
    users: IdentityRegistry,
    listings: ListingStore,
    ranking: CategoryRankingCache,
}

impl Marketplace {
    /// Creates an empty marketplace with default settings.
    pub fn new() -> Self {
        Self::with_config(&MarketplaceConfig::default())
    }

    /// Creates an empty marketplace from `config`.
    pub fn with_config(config: &MarketplaceConfig) -> Self {
        Marketplace {
            users: IdentityRegistry::new(),
            listings: ListingStore::starting_at(config.first_listing_id),
            ranking: CategoryRankingCache::new(),
        }
    }

    /// Registers a user; fails with `AlreadyExists` if the name is taken in any
    /// casing, or `EmptyUsername` for an empty name.
    pub fn register_user(&self, username: &str) -> Result<()> {
        if username.is_empty() {
            return Err(MarketplaceError::EmptyUsername);
        }
        if self.users.register(username) {
            Ok(())
        } else {
            Err(MarketplaceError::AlreadyExists {
                username: username.to_owned(),
            })
        }
    }

    /// Case-insensitive check for a registered user.
    pub fn user_exists(&self, username: &str) -> bool {
        self.users.exists(username)
    }

    /// Stores a new listing and counts it towards its category.
    ///
    /// The caller is expected to have validated the owner and the fields.
    pub fn create_listing(
        &self,
        owner: &str,
        title: &str,
        description: &str,
        price: Decimal,
        category: &str,
        created_at: &str,
    ) -> Result<ListingId> {
        let (listing, event) = self
            .listings
            .allocate(owner, title, description, price, category, created_at);
        // Counted before it becomes visible, so a concurrent delete can never
        // decrement ahead of this increment.
        self.ranking.process_listing_event(&event)?;
        Ok(self.listings.insert(listing))
    }

    /// Returns the listing stored under `id`.
    pub fn get_listing(&self, id: ListingId) -> Result<Listing> {
        self.listings.get(id)
    }

    /// Removes the listing stored under `id` and returns it.
    ///
    /// Fails with `ListingNotFound` if it is already gone. Ownership checks are
    /// the caller's responsibility.
    pub fn delete_listing(&self, id: ListingId) -> Result<Listing> {
        let (listing, event) = self.listings.remove(id)?;
        self.ranking.process_listing_event(&event)?;
        Ok(listing)
    }

    /// Point-in-time copy of all listings in insertion order.
    pub fn list_all_listings(&self) -> Vec<Listing> {
        self.listings.snapshot()
    }

    /// Display name of the category with the most listings, or `""` if there are none.
    pub fn get_top_category(&self) -> String {
        self.ranking.top_category()
    }

    /// Listings of `category` (ignoring case), ordered by `key` and `order`.
    pub fn query_category(
        &self,
        category: &str,
        key: SortKey,
        order: SortOrder,
    ) -> Result<Vec<Listing>> {
        let snapshot = self.listings.snapshot();
        debug!(category, ?key, ?order, scanned = snapshot.len(), "querying category");
        category_query::query_category(snapshot, category, key, order)
    }

    /// Number of active listings counted for `category`, ignoring case.
    pub fn category_count(&self, category: &str) -> u64 {
        self.ranking.count(category)
    }

    /// The ranking cache, for callers that want counts or display names.
    pub fn ranking(&self) -> &CategoryRankingCache {
        &self.ranking
    }
}
