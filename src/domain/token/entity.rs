//! Token entity and related types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token identifier, assigned by the store on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(i64);

impl TokenId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TokenId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for TokenId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A token record that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewToken {
    pub name: String,
    pub secret: String,
    pub enabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewToken {
    /// Create an enabled token record
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            enabled: true,
            expires_at: None,
        }
    }

    /// Set expiration
    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }
}

/// Access token entity
///
/// The secret is the bearer credential. It is immutable once the store has
/// assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    id: TokenId,
    name: String,
    secret: String,
    enabled: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Token {
    /// Build a persisted token from a new record and store-managed fields
    pub fn from_new(
        id: TokenId,
        new_token: NewToken,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: new_token.name,
            secret: new_token.secret,
            enabled: new_token.enabled,
            expires_at: new_token.expires_at,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Check whether the token has expired at the given instant.
    /// A token is expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Masked representation safe to show to any caller
    pub fn masked_secret(&self) -> String {
        super::mask::mask(&self.secret)
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
