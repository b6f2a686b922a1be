//! Newtype IDs for type-safe record references.
//!
//! Every record is stored under a row key, so IDs are strings restricted to a
//! character set that never needs escaping inside a table key or a URL path.
//! Use the `define_id!` macro to create a wrapper per record type so a
//! `CustomerId` can never be passed where a `ProductId` is expected.

/// Errors that can occur when parsing a record ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty or whitespace.
    #[error("ID cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("ID must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that is not allowed in a row key.
    #[error("ID may only contain letters, digits, '-', '_' and '.' (found {0:?})")]
    InvalidCharacter(char),
}

/// Maximum ID length accepted by the forms.
pub const MAX_ID_LENGTH: usize = 64;

/// Check that `value` can be used as a record ID.
///
/// # Errors
///
/// Returns an [`IdError`] describing the first rule the value breaks.
pub fn validate_id(value: &str) -> Result<(), IdError> {
    if value.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if value.chars().count() > MAX_ID_LENGTH {
        return Err(IdError::TooLong { max: MAX_ID_LENGTH });
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(IdError::InvalidCharacter(c));
    }
    Ok(())
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` (validated), `as_str()`, `into_inner()`
/// - `Display`, `FromStr` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use abc_retailers_core::define_id;
/// define_id!(WarehouseId);
///
/// let id = WarehouseId::parse("WH-JHB-01").unwrap();
/// assert_eq!(id.as_str(), "WH-JHB-01");
/// assert!(WarehouseId::parse("bad/id").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, rejecting values that are unsafe as row keys.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty, too long, or contains
            /// characters other than ASCII letters, digits, `-`, `_` and `.`.
            pub fn parse(value: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::validate_id(value)?;
                Ok(Self(value.to_owned()))
            }

            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CustomerId);
define_id!(ProductId);
define_id!(OrderId);

impl OrderId {
    /// Generate a fresh random order ID (UUID v4, hyphenated).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_row_key_safe_values() {
        assert!(CustomerId::parse("CUST-001").is_ok());
        assert!(ProductId::parse("42").is_ok());
        assert!(CustomerId::parse("jane.doe_7").is_ok());
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(CustomerId::parse(""), Err(IdError::Empty));
        assert_eq!(CustomerId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn rejects_reserved_characters() {
        for bad in ["a/b", "a\\b", "a#b", "a?b", "a b", "a'b"] {
            assert!(
                matches!(ProductId::parse(bad), Err(IdError::InvalidCharacter(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_ids() {
        let long = "x".repeat(MAX_ID_LENGTH + 1);
        assert_eq!(
            OrderId::parse(&long),
            Err(IdError::TooLong { max: MAX_ID_LENGTH })
        );
    }

    #[test]
    fn generated_order_ids_are_valid_and_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
        assert!(OrderId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn serializes_transparently() {
        let id = CustomerId::parse("C1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"C1\"");
    }
}
