use rust_decimal::Decimal;
use std::fmt;

/// Identifier of a listing, allocated from a strictly increasing counter.
pub type ListingId = u64;

/// The id handed out to the very first listing of a fresh marketplace.
pub const FIRST_LISTING_ID: ListingId = 100_001;

/// Normalizes a user-supplied name (username or category) into its lookup key.
///
/// All comparisons in the marketplace are case-insensitive, so every map is keyed
/// by the lowercase form while the original casing is kept for display.
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase()
}

/// A registered marketplace user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// The username exactly as it was first registered
    pub username: String,
}

impl User {
    /// Creates a user keeping the given casing for display.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Represents a single listing in the marketplace.
///
/// Listings are immutable once stored: the only mutations the store performs are
/// inserting a new record and removing one by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Unique, monotonically allocated identifier
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// Asking price (using fixed-point arithmetic)
    pub price: Decimal,
    /// Creation timestamp in `YYYY-MM-DD HH:MM:SS` form, so it orders lexicographically
    pub created_at: String,
    /// Category as the seller typed it
    pub category: String,
    /// Username of the seller
    pub owner: String,
}

impl Listing {
    /// Returns `true` when this listing belongs to `category`, ignoring case.
    pub fn in_category(&self, category: &str) -> bool {
        normalize_key(&self.category) == normalize_key(category)
    }

    /// Returns `true` when `username` owns this listing, ignoring case.
    pub fn is_owned_by(&self, username: &str) -> bool {
        normalize_key(&self.owner) == normalize_key(username)
    }
}

/// Represents an event published by the `ListingStore` when its contents change.
///
/// The event is consumed by the `CategoryRankingCache` so the store itself never
/// needs to know how categories are ranked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEvent {
    /// The listing the change concerns
    pub listing_id: ListingId,
    /// Category of that listing, in its display casing
    pub category: String,
    /// Whether the listing was added or removed
    pub change: CountChange,
}

/// Direction of a category count update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountChange {
    /// A listing was inserted (+1)
    Increment,
    /// A listing was removed (-1)
    Decrement,
}

impl fmt::Display for CountChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountChange::Increment => f.write_str("+1"),
            CountChange::Decrement => f.write_str("-1"),
        }
    }
}
