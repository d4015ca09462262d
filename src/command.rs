//! Line-oriented command layer on top of [`Marketplace`].
//!
//! Each input line is split into tokens, the first token selects a
//! [`CommandKind`] and the matching handler validates the arguments, calls into
//! the marketplace and renders the response line(s).
//!
//! ```text
//! REGISTER <user>
//! CREATE_LISTING <user> <title> <description> <price> <category>
//! GET_LISTING <user> <listing_id>
//! DELETE_LISTING <user> <listing_id>
//! GET_CATEGORY <user> <category> <sort_key> <sort_order>
//! GET_TOP_CATEGORY <user>
//! ```
//!
//! Free-text arguments may be wrapped in single quotes to include spaces.

use crate::category_query::{SortKey, SortOrder};
use crate::error::MarketplaceError;
use crate::marketplace::Marketplace;
use crate::types::{Listing, ListingId};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// `chrono` format of listing timestamps. Fixed width, so it sorts chronologically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of creation timestamps for new listings.
pub type Clock = Box<dyn Fn() -> String + Send + Sync>;

/// The current local time in [`TIMESTAMP_FORMAT`].
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Failures reported back to the user. The `Display` text is the response line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Error - invalid arguments")]
    InvalidArguments,
    #[error("Error - unknown user")]
    UnknownUser,
    #[error("Error - user already existing")]
    UserAlreadyExisting,
    #[error("Error - empty title, description, or category")]
    EmptyField,
    #[error("Error - price must be a positive value")]
    NonPositivePrice,
    #[error("Error - invalid price format")]
    InvalidPriceFormat,
    #[error("Error - invalid listing id")]
    InvalidListingId,
    #[error("Error - not found")]
    NotFound,
    #[error("Error - listing not found")]
    ListingNotFound,
    #[error("Error - listing owner mismatch")]
    OwnerMismatch,
    #[error("Error - category not found")]
    CategoryNotFound,
    #[error("Error - unknown command")]
    UnknownCommand,
    #[error("Error - internal command error")]
    Internal,
}

impl From<MarketplaceError> for CommandError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::AlreadyExists { .. } => CommandError::UserAlreadyExisting,
            MarketplaceError::EmptyUsername => CommandError::InvalidArguments,
            MarketplaceError::ListingNotFound { .. } => CommandError::NotFound,
            MarketplaceError::CategoryNotFound { .. } => CommandError::CategoryNotFound,
            MarketplaceError::InvariantViolation { .. } => {
                warn!(error = %err, "marketplace invariant violated while executing command");
                CommandError::Internal
            }
        }
    }
}

type CommandResult = std::result::Result<String, CommandError>;
type Handler = fn(&CommandShell, &[String]) -> CommandResult;

/// The closed set of commands the shell understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Register,
    CreateListing,
    GetListing,
    DeleteListing,
    GetCategory,
    GetTopCategory,
}

impl CommandKind {
    /// Looks up a command keyword, ignoring case and surrounding whitespace.
    pub fn parse(keyword: &str) -> Option<Self> {
        let kind = match keyword.trim().to_uppercase().as_str() {
            "REGISTER" => CommandKind::Register,
            "CREATE_LISTING" => CommandKind::CreateListing,
            "GET_LISTING" => CommandKind::GetListing,
            "DELETE_LISTING" => CommandKind::DeleteListing,
            "GET_CATEGORY" => CommandKind::GetCategory,
            "GET_TOP_CATEGORY" => CommandKind::GetTopCategory,
            _ => return None,
        };
        Some(kind)
    }

    fn handler(self) -> Handler {
        match self {
            CommandKind::Register => CommandShell::register,
            CommandKind::CreateListing => CommandShell::create_listing,
            CommandKind::GetListing => CommandShell::get_listing,
            CommandKind::DeleteListing => CommandShell::delete_listing,
            CommandKind::GetCategory => CommandShell::get_category,
            CommandKind::GetTopCategory => CommandShell::get_top_category,
        }
    }
}

/// Splits a command line on runs of spaces, keeping single-quoted runs together.
///
/// Only the space character separates tokens; tabs stay inside a token.
///
/// Quotes are left in the tokens; use [`strip_quotes`] on free-text arguments.
///
/// ## Examples
///
/// ```
/// use marketplace_index::command::tokenize;
///
/// let tokens = tokenize("CREATE_LISTING bob 'Old  phone' 'Works fine' 100 Electronics");
/// assert_eq!(tokens, vec!["CREATE_LISTING", "bob", "'Old  phone'", "'Works fine'", "100", "Electronics"]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.trim().chars() {
        if ch == '\'' {
            in_quotes = !in_quotes;
            current.push(ch);
        } else if ch == ' ' && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Removes one leading and one trailing single quote, if present.
pub fn strip_quotes(token: &str) -> &str {
    let token = token.strip_prefix('\'').unwrap_or(token);
    token.strip_suffix('\'').unwrap_or(token)
}

/// Renders a listing as `title|description|price|created_at|category|owner`,
/// with the price rounded to a whole number.
pub fn format_listing(listing: &Listing) -> String {
    let price = listing
        .price
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!(
        "{}|{}|{}|{}|{}|{}",
        listing.title, listing.description, price, listing.created_at, listing.category, listing.owner
    )
}

/// Executes command lines against a shared [`Marketplace`].
pub struct CommandShell {
    marketplace: Arc<Marketplace>,
    clock: Clock,
}

impl CommandShell {
    /// Creates a shell stamping new listings with the local time.
    pub fn new(marketplace: Arc<Marketplace>) -> Self {
        Self::with_clock(marketplace, Box::new(local_timestamp))
    }

    /// Creates a shell taking creation timestamps from `clock`.
    pub fn with_clock(marketplace: Arc<Marketplace>, clock: Clock) -> Self {
        Self { marketplace, clock }
    }

    /// Executes one input line and returns the text to print.
    ///
    /// Returns `None` for blank lines and for commands whose response is empty
    /// (such as `GET_TOP_CATEGORY` with no listings).
    ///
    /// ## Examples
    ///
    /// ```
    /// use marketplace_index::command::CommandShell;
    /// use marketplace_index::Marketplace;
    /// use std::sync::Arc;
    ///
    /// let shell = CommandShell::with_clock(
    ///     Arc::new(Marketplace::new()),
    ///     Box::new(|| "2024-05-01 09:30:00".to_owned()),
    /// );
    ///
    /// assert_eq!(shell.execute_line("REGISTER user1").as_deref(), Some("Success"));
    /// assert_eq!(
    ///     shell.execute_line("CREATE_LISTING user1 'Phone model 8' 'Black color' 1000 'Electronics'").as_deref(),
    ///     Some("100001")
    /// );
    /// assert_eq!(
    ///     shell.execute_line("GET_LISTING user1 100001").as_deref(),
    ///     Some("Phone model 8|Black color|1000|2024-05-01 09:30:00|Electronics|user1")
    /// );
    /// ```
    pub fn execute_line(&self, line: &str) -> Option<String> {
        let tokens = tokenize(line);
        let keyword = tokens.first()?;

        let response = match CommandKind::parse(keyword) {
            Some(kind) => {
                debug!(?kind, arguments = tokens.len() - 1, "dispatching command");
                (kind.handler())(self, &tokens)
            }
            None => Err(CommandError::UnknownCommand),
        };

        let text = response.unwrap_or_else(|err| err.to_string());
        (!text.is_empty()).then_some(text)
    }

    fn authenticate(&self, username: &str) -> std::result::Result<(), CommandError> {
        if self.marketplace.user_exists(username) {
            Ok(())
        } else {
            Err(CommandError::UnknownUser)
        }
    }

    fn register(&self, args: &[String]) -> CommandResult {
        let [_, username, ..] = args else {
            return Err(CommandError::InvalidArguments);
        };
        self.marketplace.register_user(username)?;
        Ok("Success".to_owned())
    }

    fn create_listing(&self, args: &[String]) -> CommandResult {
        let [_, username, title, description, price, category, ..] = args else {
            return Err(CommandError::InvalidArguments);
        };
        self.authenticate(username)?;

        let title = strip_quotes(title);
        let description = strip_quotes(description);
        let category = strip_quotes(category);
        if [title, description, category]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(CommandError::EmptyField);
        }

        let price = parse_price(price)?;
        let created_at = (self.clock)();
        let id = self.marketplace.create_listing(
            username,
            title,
            description,
            price,
            category,
            &created_at,
        )?;
        Ok(id.to_string())
    }

    fn get_listing(&self, args: &[String]) -> CommandResult {
        let [_, username, listing_id, ..] = args else {
            return Err(CommandError::InvalidArguments);
        };
        self.authenticate(username)?;

        let id = parse_listing_id(listing_id)?;
        let listing = self.marketplace.get_listing(id)?;
        Ok(format_listing(&listing))
    }

    fn delete_listing(&self, args: &[String]) -> CommandResult {
        let [_, username, listing_id, ..] = args else {
            return Err(CommandError::InvalidArguments);
        };
        self.authenticate(username)?;

        let id = parse_listing_id(listing_id)?;
        let listing = self
            .marketplace
            .get_listing(id)
            .map_err(listing_not_found)?;
        if !listing.is_owned_by(username) {
            return Err(CommandError::OwnerMismatch);
        }

        self.marketplace
            .delete_listing(id)
            .map_err(listing_not_found)?;
        Ok("Success".to_owned())
    }

    fn get_category(&self, args: &[String]) -> CommandResult {
        let [_, username, category, sort_key, sort_order, ..] = args else {
            return Err(CommandError::InvalidArguments);
        };
        self.authenticate(username)?;

        let listings = self.marketplace.query_category(
            strip_quotes(category),
            SortKey::parse(sort_key),
            SortOrder::parse(sort_order),
        )?;
        Ok(listings
            .iter()
            .map(format_listing)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn get_top_category(&self, args: &[String]) -> CommandResult {
        let [_, username, ..] = args else {
            return Err(CommandError::InvalidArguments);
        };
        self.authenticate(username)?;
        Ok(self.marketplace.get_top_category())
    }
}

/// Parses a price in plain or scientific notation.
///
/// Digit separators, values outside `Decimal`'s range and non-zero values too
/// small to represent are all reported as an invalid format.
fn parse_price(raw: &str) -> std::result::Result<Decimal, CommandError> {
    if raw.contains('_') {
        return Err(CommandError::InvalidPriceFormat);
    }
    let price = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| CommandError::InvalidPriceFormat)?;

    let mantissa = raw.split(['e', 'E']).next().unwrap_or(raw);
    if price.is_zero() && mantissa.chars().any(|ch| matches!(ch, '1'..='9')) {
        return Err(CommandError::InvalidPriceFormat);
    }
    if price <= Decimal::ZERO {
        return Err(CommandError::NonPositivePrice);
    }
    Ok(price)
}

fn parse_listing_id(raw: &str) -> std::result::Result<ListingId, CommandError> {
    raw.parse().map_err(|_| CommandError::InvalidListingId)
}

/// Deleting reports a missing listing differently from reading one.
fn listing_not_found(err: MarketplaceError) -> CommandError {
    match err {
        MarketplaceError::ListingNotFound { .. } => CommandError::ListingNotFound,
        other => other.into(),
    }
}
