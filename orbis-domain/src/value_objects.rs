//! Value Objects for the Orbis Domain
//!
//! Small validated primitives shared by every layer: the case-insensitive
//! country name key, the list sort order, and domain errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Country name is empty after trimming
    #[error("Invalid country name: {0}")]
    InvalidName(String),

    /// Sort order not recognised
    #[error("Invalid sort order: {0}")]
    InvalidSort(String),
}

// =============================================================================
// NameKey
// =============================================================================

/// Case-insensitive identity key for a country.
///
/// "France", "FRANCE" and " france " all produce the same key.
///
/// # Invariants
/// - Never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(String);

impl NameKey {
    /// Build a key from a display name
    ///
    /// # Errors
    /// Returns `DomainError::InvalidName` if the name is blank
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidName("Name must be non-empty".to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Get the normalized key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a display name maps to this key
    pub fn matches(&self, name: &str) -> bool {
        name.trim().to_lowercase() == self.0
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CountrySort
// =============================================================================

/// Sort order for country listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountrySort {
    /// Estimated GDP, largest first, countries without a GDP last
    #[serde(rename = "gdp_desc")]
    GdpDesc,
}

impl CountrySort {
    /// Wire value used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            CountrySort::GdpDesc => "gdp_desc",
        }
    }
}

impl FromStr for CountrySort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gdp_desc" => Ok(CountrySort::GdpDesc),
            other => Err(DomainError::InvalidSort(other.to_string())),
        }
    }
}

impl fmt::Display for CountrySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
