use crate::error::{MarketplaceError, Result};
use crate::types::{CountChange, Listing, ListingEvent, ListingId, FIRST_LISTING_ID};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// The id-indexed table of active listings.
///
/// This structure is responsible only for:
///
/// - Allocating listing ids from a strictly increasing counter
/// - Storing and removing listings
/// - Publishing events describing each change
///
/// It does not track category counts; that is the job of the
/// `CategoryRankingCache`, which consumes the events returned here.
///
/// ### Thread Safety
///
/// Listings live in a sharded `DashMap` and ids come from an `AtomicU64`, so the
/// store can be shared by reference across threads without an outer lock.
#[derive(Debug)]
pub struct ListingStore {
    listings: DashMap<ListingId, Listing>,
    next_id: AtomicU64,
}

impl ListingStore {
    /// Creates an empty store whose first listing gets id 100001.
    pub fn new() -> Self {
        Self::starting_at(FIRST_LISTING_ID)
    }

    /// Creates an empty store whose first listing gets `first_id`.
    pub fn starting_at(first_id: ListingId) -> Self {
        ListingStore {
            listings: DashMap::new(),
            next_id: AtomicU64::new(first_id),
        }
    }

    /// Builds a new listing under the next id, without storing it yet.
    ///
    /// Returns the listing and the event announcing it. Ids are never reused,
    /// even when the listing holding one is deleted or never inserted.
    ///
    /// ## Examples
    ///
    /// ```
    /// use marketplace_index::{CountChange, Decimal, ListingStore};
    ///
    /// let store = ListingStore::new();
    /// let (listing, event) = store.allocate(
    ///     "alice",
    ///     "Phone",
    ///     "Barely used",
    ///     Decimal::new(300, 0),
    ///     "Electronics",
    ///     "2024-01-01 10:00:00",
    /// );
    ///
    /// assert_eq!(listing.id, 100001);
    /// assert_eq!(event.change, CountChange::Increment);
    /// assert!(store.is_empty(), "Allocated listings are not visible yet");
    ///
    /// let id = store.insert(listing);
    /// assert_eq!(store.get(id).unwrap().category, "Electronics");
    /// ```
    pub fn allocate(
        &self,
        owner: &str,
        title: &str,
        description: &str,
        price: Decimal,
        category: &str,
        created_at: &str,
    ) -> (Listing, ListingEvent) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let listing = Listing {
            id,
            title: title.to_owned(),
            description: description.to_owned(),
            price,
            created_at: created_at.to_owned(),
            category: category.to_owned(),
            owner: owner.to_owned(),
        };
        let event = ListingEvent {
            listing_id: id,
            category: category.to_owned(),
            change: CountChange::Increment,
        };
        (listing, event)
    }

    /// Makes an allocated listing visible to readers and returns its id.
    pub fn insert(&self, listing: Listing) -> ListingId {
        let id = listing.id;
        debug!(listing_id = id, category = %listing.category, owner = %listing.owner, "stored listing");
        self.listings.insert(id, listing);
        id
    }

    /// Returns a copy of the listing stored under `id`.
    pub fn get(&self, id: ListingId) -> Result<Listing> {
        self.listings
            .get(&id)
            .map(|listing| listing.value().clone())
            .ok_or(MarketplaceError::ListingNotFound { id })
    }

    /// Removes the listing stored under `id`.
    ///
    /// Returns the removed listing and the event to publish, or `ListingNotFound`
    /// when the id is absent (never allocated, or already deleted).
    pub fn remove(&self, id: ListingId) -> Result<(Listing, ListingEvent)> {
        let (_, listing) = self
            .listings
            .remove(&id)
            .ok_or(MarketplaceError::ListingNotFound { id })?;
        debug!(listing_id = id, category = %listing.category, "removed listing");

        let event = ListingEvent {
            listing_id: id,
            category: listing.category.clone(),
            change: CountChange::Decrement,
        };
        Ok((listing, event))
    }

    /// Returns a point-in-time copy of every stored listing, ordered by id.
    ///
    /// Because ids are allocated monotonically this is also insertion order.
    /// Later inserts and deletes never show up in a returned snapshot.
    pub fn snapshot(&self) -> Vec<Listing> {
        let mut listings: Vec<Listing> = self
            .listings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        listings.sort_by_key(|listing| listing.id);
        listings
    }

    /// Returns the number of active listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Returns `true` if there are no active listings.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl Default for ListingStore {
    fn default() -> Self {
        Self::new()
    }
}
