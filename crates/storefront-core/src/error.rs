//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Domain errors (unknown field, bad amount)      │
//! │  └── ValidationError  - One checkout field failing one rule            │
//! │                                                                         │
//! │  storefront-session errors (separate crate)                            │
//! │  ├── SearchError      - Product search collaborator failed             │
//! │  ├── PlacementError   - Order placement collaborator failed            │
//! │  └── SessionError     - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → UI banner / field  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A checkout form field name that the wizard does not know.
    ///
    /// ## When This Occurs
    /// - The rendering layer sends `updateField("zip", ..)` instead of
    ///   `postalCode`
    #[error("Unknown checkout field: {0}")]
    UnknownField(String),

    /// A value outside a closed set (sort key, shipping or payment method).
    #[error("Unknown {kind}: '{value}'")]
    UnknownChoice { kind: &'static str, value: String },

    /// A decimal amount that cannot be represented as whole cents.
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field failing a single rule.
///
/// The `field` is the human label ("First name"), so `to_string()` is the
/// message shown next to the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Nothing picked from a selector.
    #[error("{field} must be selected")]
    NotSelected { field: String },

    /// Invalid format (e.g. an e-mail address without a domain). The
    /// reason is the whole message.
    #[error("{reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// The label of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::NotSelected { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownChoice {
            kind: "shipping method",
            value: "drone".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown shipping method: 'drone'");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::TooShort {
            field: "First name".to_string(),
            min: 2,
        };
        assert_eq!(err.to_string(), "First name must be at least 2 characters");
        assert_eq!(err.field(), "First name");

        let err = ValidationError::Required {
            field: "Card number".to_string(),
        };
        assert_eq!(err.to_string(), "Card number is required");

        let err = ValidationError::NotSelected {
            field: "Country".to_string(),
        };
        assert_eq!(err.to_string(), "Country must be selected");
        assert_eq!(err.field(), "Country");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "Email".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
