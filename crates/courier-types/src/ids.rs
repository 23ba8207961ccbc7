//! Type-safe identifier wrappers.
//!
//! Domain keys ([`OrderId`], [`PartnerId`]) are opaque strings supplied by
//! the marketplace in WebSocket paths and lifecycle notifications. They are
//! validated once at construction so every downstream component can treat
//! them as well-formed room keys.
//!
//! [`ConnectionId`] is allocated server-side for each live subscriber and
//! uses UUID v7 so identifiers sort by connect time in logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length of a domain key, in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// Errors produced when a domain key fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeded [`MAX_KEY_LEN`].
    #[error("identifier is {len} bytes, maximum is {MAX_KEY_LEN}")]
    TooLong {
        /// Length of the rejected identifier.
        len: usize,
    },

    /// The identifier contained a character outside `[A-Za-z0-9_-]`.
    #[error("identifier contains invalid character {found:?}")]
    InvalidCharacter {
        /// The first offending character.
        found: char,
    },
}

/// Check a raw domain key against the accepted alphabet and length.
///
/// # Errors
///
/// Returns the first [`IdError`] the key violates.
pub fn validate_key(raw: &str) -> Result<(), IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty);
    }
    if raw.len() > MAX_KEY_LEN {
        return Err(IdError::TooLong { len: raw.len() });
    }
    if let Some(found) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(IdError::InvalidCharacter { found });
    }
    Ok(())
}

/// Generates a validated newtype wrapper around [`String`].
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`] if the identifier is empty, too long,
            /// or contains characters outside `[A-Za-z0-9_-]`.
            pub fn parse(raw: &str) -> Result<Self, IdError> {
                validate_key(raw)?;
                Ok(Self(raw.to_owned()))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                validate_key(&raw)?;
                Ok(Self(raw))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_key! {
    /// Identifier of an order in the marketplace.
    OrderId
}

define_key! {
    /// Identifier of a delivery partner (rider).
    PartnerId
}

/// Unique identifier for one live subscriber connection.
///
/// A reconnecting client always receives a fresh id; ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_uuid_keys() {
        assert!(OrderId::parse("o1").is_ok());
        assert!(PartnerId::parse("p_1").is_ok());
        assert!(OrderId::parse("0190c5a2-7d1e-7c3a-9f00-1b2c3d4e5f60").is_ok());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(OrderId::parse(""), Err(IdError::Empty));
        assert_eq!(
            OrderId::parse("o/1"),
            Err(IdError::InvalidCharacter { found: '/' })
        );
        assert_eq!(
            PartnerId::parse("rider 7"),
            Err(IdError::InvalidCharacter { found: ' ' })
        );
        let long = "a".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(
            PartnerId::parse(&long),
            Err(IdError::TooLong { .. })
        ));
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<OrderId, _> = serde_json::from_str("\"o42\"");
        assert!(ok.is_ok());
        let bad: Result<OrderId, _> = serde_json::from_str("\"o 42\"");
        assert!(bad.is_err());
    }

    #[test]
    fn connection_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.into_inner().to_string());
    }
}
