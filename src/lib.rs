//! An in-memory marketplace index: registered users, listings, and a category
//! ranking that always knows which category currently has the most listings.
//!
//! ## Architecture
//!
//! The core is split into independent services:
//!
//! 1. `IdentityRegistry`: case-insensitive set of registered users
//! 2. `ListingStore`: id-indexed listings with a monotonic id allocator
//! 3. `CategoryRankingCache`: per-category counts plus a cached leader
//! 4. `query_category`: filtering and ordering of a store snapshot
//!
//! The store publishes a `ListingEvent` for every insert and delete, and the
//! ranking cache consumes it under its own lock. `Marketplace` wires the pieces
//! together and is what callers normally use.
//!
//! ## Example Usage
//!
//! ```rust
//! use marketplace_index::{Decimal, Marketplace};
//! use std::sync::Arc;
//!
//! let marketplace = Arc::new(Marketplace::new());
//! marketplace.register_user("alice").unwrap();
//!
//! let price = Decimal::new(1999, 2); // 19.99
//! let sports = marketplace
//!     .create_listing("alice", "Ball", "Size 5", price, "Sports", "2024-01-01 08:00:00")
//!     .unwrap();
//! marketplace
//!     .create_listing("alice", "Cable", "USB-C", price, "Electronics", "2024-01-01 08:05:00")
//!     .unwrap();
//!
//! // Ties keep the incumbent.
//! assert_eq!(marketplace.get_top_category(), "Sports");
//!
//! // The leader losing a listing triggers a rescan.
//! marketplace.delete_listing(sports).unwrap();
//! assert_eq!(marketplace.get_top_category(), "Electronics");
//! ```
//!
//! Reading the top category is a single atomic load and never waits for a
//! writer. Updating it is O(1) except when the leader itself loses a listing,
//! which costs one pass over the distinct categories.

mod category_query;
mod category_ranking_cache;
pub mod command;
mod error;
mod identity_registry;
mod listing_store;
mod marketplace;
mod types;

// Re-export public API
pub use category_query::{comparator, query_category, SortKey, SortOrder};
pub use category_ranking_cache::CategoryRankingCache;
pub use error::{MarketplaceError, Result};
pub use identity_registry::IdentityRegistry;
pub use listing_store::ListingStore;
pub use marketplace::{Marketplace, MarketplaceConfig};
pub use types::{
    normalize_key, CountChange, Listing, ListingEvent, ListingId, User, FIRST_LISTING_ID,
};

// Re-export commonly used external dependencies
pub use rust_decimal::Decimal;
