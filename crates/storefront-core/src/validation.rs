//! # Validation Module
//!
//! Field rules for the checkout form and the catalog search box.
//!
//! ## Checkout Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field            Rule                                                  │
//! │  ───────────────  ───────────────────────────────────────────────────   │
//! │  firstName        ≥ 2 chars                                             │
//! │  lastName         ≥ 2 chars                                             │
//! │  email            local@domain.tld                                      │
//! │  phone            ≥ 9 chars                                             │
//! │  address          ≥ 5 chars                                             │
//! │  city             ≥ 2 chars                                             │
//! │  postalCode       ≥ 5 chars                                             │
//! │  country          selected: ≥ 2 chars (an ISO-style code)               │
//! │  shippingMethod   standard | express | overnight                        │
//! │  paymentMethod    card | paypal | bnpl                                  │
//! │  card fields      required only when paymentMethod = card               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters and whitespace counts, so `" X"` meets
//! a two character minimum. Only the card-detail presence check ignores
//! surrounding whitespace.

use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::CheckoutField;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Requires a non-blank value.
pub fn validate_required(field: CheckoutField, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.label().to_string(),
        });
    }
    Ok(())
}

/// Requires at least `min` characters.
///
/// ```rust
/// use storefront_core::types::CheckoutField;
/// use storefront_core::validation::validate_min_length;
///
/// assert!(validate_min_length(CheckoutField::City, "Oslo", 2).is_ok());
/// assert!(validate_min_length(CheckoutField::City, "X", 2).is_err());
/// ```
pub fn validate_min_length(field: CheckoutField, value: &str, min: usize) -> ValidationResult<()> {
    if value.chars().count() < min {
        return Err(ValidationError::TooShort {
            field: field.label().to_string(),
            min,
        });
    }
    Ok(())
}

/// Requires a selector value of at least `min` characters; anything shorter
/// means nothing was picked.
pub fn validate_selected(field: CheckoutField, value: &str, min: usize) -> ValidationResult<()> {
    if value.chars().count() < min {
        return Err(ValidationError::NotSelected {
            field: field.label().to_string(),
        });
    }
    Ok(())
}

/// Validates an e-mail address.
///
/// ## Rules
/// - exactly one `@`, no whitespace
/// - local part: letters, digits and `_ ' + - .`, not starting or ending
///   with `.`, no `..`
/// - domain: at least two dot-separated labels, labels made of letters,
///   digits and `-` and not starting with `-`
/// - top-level label: at least two letters
///
/// ```rust
/// use storefront_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(value: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: CheckoutField::Email.label().to_string(),
        reason: "Invalid email address".to_string(),
    };

    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;

    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_'+-.".contains(c));
    if !local_ok {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid());
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    if labels_ok && tld_ok {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Requires the value to parse as one member of a closed set.
///
/// ```rust
/// use storefront_core::types::{CheckoutField, ShippingMethod};
/// use storefront_core::validation::validate_choice;
///
/// let method: ShippingMethod =
///     validate_choice(CheckoutField::ShippingMethod, "express", &["standard", "express"]).unwrap();
/// assert_eq!(method, ShippingMethod::Express);
/// ```
pub fn validate_choice<T: FromStr>(
    field: CheckoutField,
    value: &str,
    allowed: &[&str],
) -> ValidationResult<T> {
    value.parse::<T>().map_err(|_| ValidationError::NotAllowed {
        field: field.label().to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    })
}

/// Normalizes a catalog search term: surrounding whitespace is trimmed and
/// anything past `max_len` characters is dropped. Never fails, so a filter
/// change always goes through.
///
/// ```rust
/// use storefront_core::validation::normalize_search_query;
///
/// assert_eq!(normalize_search_query("  desk lamp ", 100), "desk lamp");
/// assert_eq!(normalize_search_query("lampshade", 4), "lamp");
/// ```
pub fn normalize_search_query(query: &str, max_len: usize) -> String {
    query.trim().chars().take(max_len).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.co").is_ok());
        assert!(validate_email("o'neil@shop.ie").is_ok());

        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("ada@example.c").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("a..b@example.com").is_err());
        assert!(validate_email(".ada@example.com").is_err());
        assert!(validate_email("ada lovelace@example.com").is_err());
        assert!(validate_email("ada@-example.com").is_err());
    }

    #[test]
    fn test_email_error_message() {
        let err = validate_email("nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email address");
        assert_eq!(err.field(), "Email");
        // no trimming before the check
        assert!(validate_email(" ada@example.com").is_err());
    }

    #[test]
    fn test_validate_min_length() {
        assert!(validate_min_length(CheckoutField::Phone, "123456789", 9).is_ok());
        assert!(validate_min_length(CheckoutField::Phone, "12345678", 9).is_err());
        // characters, not bytes
        assert!(validate_min_length(CheckoutField::City, "Łó", 2).is_ok());
        // whitespace counts toward the minimum
        assert!(validate_min_length(CheckoutField::City, " X", 2).is_ok());
        assert!(validate_min_length(CheckoutField::City, "X", 2).is_err());
    }

    #[test]
    fn test_validate_selected() {
        assert!(validate_selected(CheckoutField::Country, "US", 2).is_ok());
        let err = validate_selected(CheckoutField::Country, "", 2).unwrap_err();
        assert_eq!(err.to_string(), "Country must be selected");
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required(CheckoutField::Cvv, "123").is_ok());
        assert_eq!(
            validate_required(CheckoutField::Cvv, "  ").unwrap_err(),
            ValidationError::Required {
                field: "CVV".to_string()
            }
        );
    }

    #[test]
    fn test_validate_choice() {
        let ok: ValidationResult<PaymentMethod> =
            validate_choice(CheckoutField::PaymentMethod, "paypal", &["card", "paypal", "bnpl"]);
        assert_eq!(ok.unwrap(), PaymentMethod::Paypal);

        let err: ValidationResult<PaymentMethod> =
            validate_choice(CheckoutField::PaymentMethod, "cash", &["card", "paypal", "bnpl"]);
        assert!(matches!(err, Err(ValidationError::NotAllowed { .. })));
    }

    #[test]
    fn test_normalize_search_query() {
        assert_eq!(normalize_search_query("  lamp ", 100), "lamp");
        assert_eq!(normalize_search_query("", 100), "");
        assert_eq!(normalize_search_query(&"x".repeat(101), 100), "x".repeat(100));
        // characters, not bytes
        assert_eq!(normalize_search_query("żółw", 2), "żó");
    }
}
