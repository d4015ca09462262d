use crate::types::ListingId;
use thiserror::Error;

/// Errors returned by marketplace operations.
///
/// None of these are recovered inside the crate: every one is handed back to the
/// caller, which decides how to present it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    /// A user with this name (in any casing) is already registered
    #[error("user '{username}' already exists")]
    AlreadyExists { username: String },

    /// Usernames must not be empty
    #[error("username must not be empty")]
    EmptyUsername,

    /// No listing is stored under this id
    #[error("listing {id} not found")]
    ListingNotFound { id: ListingId },

    /// The category has no active listings (or was never used)
    #[error("category '{category}' not found")]
    CategoryNotFound { category: String },

    /// The category counts disagree with the listing store. Never expected in
    /// correct operation.
    #[error("category ranking invariant violated for '{category}': {detail}")]
    InvariantViolation { category: String, detail: String },
}

impl MarketplaceError {
    /// Returns `true` for the "not found" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MarketplaceError::ListingNotFound { .. } | MarketplaceError::CategoryNotFound { .. }
        )
    }
}

/// Convenience result alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketplaceError>;
