//! # Session Error Types
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Session Error Categories                            │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │ Validation       │  │ Fetch            │  │ Precondition         │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │ checkout fields  │  │ catalog page     │  │ checkout entered     │  │
//! │  │ failed; shown    │  │ failed; banner,  │  │ with an empty cart   │  │
//! │  │ per field        │  │ retry available  │  │ (caller bug)         │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐                            │
//! │  │ OrderRejected    │  │ Config           │                            │
//! │  │ backend refused  │  │ storefront.toml  │                            │
//! │  └──────────────────┘  └──────────────────┘                            │
//! │                                                                         │
//! │  None of these is fatal: replaying the operation is always allowed.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use storefront_core::CoreError;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failure reported by the product-search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The search endpoint could not be reached.
    #[error("Product search unavailable: {0}")]
    Unavailable(String),

    /// The endpoint answered with something the engine cannot use.
    #[error("Malformed product search response: {0}")]
    Malformed(String),
}

/// Failure reported by the order-placement collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Order placement failed: {reason}")]
pub struct PlacementError {
    pub reason: String,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid session configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the session engines.
#[derive(Debug, Error)]
pub enum SessionError {
    /// One or more checkout fields failed validation. Per-field messages
    /// are on the wizard.
    #[error("Checkout form has {count} invalid field(s)")]
    Validation { count: usize },

    /// A catalog page could not be fetched. Already loaded items are kept.
    #[error(transparent)]
    Fetch(#[from] SearchError),

    /// Checkout was entered (or submitted) with an empty cart.
    #[error("Checkout requires a non-empty cart")]
    EmptyCart,

    /// The order backend refused the order; the cart is left intact.
    #[error(transparent)]
    OrderRejected(#[from] PlacementError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SessionError {
    /// Whether the user can fix this by editing input or retrying.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SessionError::EmptyCart | SessionError::Config(_))
    }
}
