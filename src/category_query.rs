use crate::error::{MarketplaceError, Result};
use crate::types::{normalize_key, Listing};
use std::cmp::Ordering;

/// The field listings in a category are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Numeric price
    Price,
    /// Creation timestamp
    #[default]
    Time,
}

impl SortKey {
    /// Parses a caller-supplied sort key.
    ///
    /// `"price"` and `"sort_price"` (any casing) select price ordering; every
    /// other value falls back to time ordering.
    ///
    /// ## Examples
    ///
    /// ```
    /// use marketplace_index::SortKey;
    ///
    /// assert_eq!(SortKey::parse("PRICE"), SortKey::Price);
    /// assert_eq!(SortKey::parse("sort_time"), SortKey::Time);
    /// assert_eq!(SortKey::parse("whatever"), SortKey::Time);
    /// ```
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("price") || raw.eq_ignore_ascii_case("sort_price") {
            SortKey::Price
        } else {
            SortKey::Time
        }
    }
}

/// Direction of a category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses a caller-supplied order: `"dsc"` (any casing) is descending,
    /// anything else ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("dsc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

/// Resolves a key and an order into a comparator over listings.
pub fn comparator(key: SortKey, order: SortOrder) -> impl Fn(&Listing, &Listing) -> Ordering {
    move |left, right| {
        let ordering = match key {
            SortKey::Price => left.price.cmp(&right.price),
            // Fixed-width timestamps compare chronologically as plain strings
            SortKey::Time => left.created_at.cmp(&right.created_at),
        };
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Selects the listings of `category` from `listings` and orders them.
///
/// `listings` is expected in insertion order (as `ListingStore::snapshot`
/// returns it). The sort is stable, so listings with equal keys keep that order
/// in both directions.
///
/// Returns `CategoryNotFound` when nothing matches; an emptied category and an
/// unknown one look the same.
///
/// ## Examples
///
/// ```
/// use marketplace_index::{query_category, Decimal, Listing, SortKey, SortOrder};
///
/// let listing = |id, price: i64| Listing {
///     id,
///     title: format!("item {id}"),
///     description: String::new(),
///     price: Decimal::new(price, 0),
///     created_at: format!("2024-01-01 10:00:{:02}", id % 60),
///     category: "Books".to_owned(),
///     owner: "carol".to_owned(),
/// };
/// let snapshot = vec![listing(1, 30), listing(2, 10), listing(3, 20)];
///
/// let sorted = query_category(snapshot, "books", SortKey::Price, SortOrder::Ascending).unwrap();
/// let ids: Vec<u64> = sorted.iter().map(|listing| listing.id).collect();
/// assert_eq!(ids, vec![2, 3, 1]);
/// ```
pub fn query_category(
    listings: Vec<Listing>,
    category: &str,
    key: SortKey,
    order: SortOrder,
) -> Result<Vec<Listing>> {
    let wanted = normalize_key(category);
    let mut matching: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| normalize_key(&listing.category) == wanted)
        .collect();

    if matching.is_empty() {
        return Err(MarketplaceError::CategoryNotFound {
            category: category.to_owned(),
        });
    }

    matching.sort_by(comparator(key, order));
    Ok(matching)
}
