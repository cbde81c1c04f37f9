// crates/gatekeeper-core/src/core/time.rs
// ============================================================================
// Module: Gatekeeper Time Model
// Description: Canonical UTC timestamp representation for all sealed artifacts.
// Purpose: Guarantee a single, stable ISO 8601 "Z" rendering for hashing.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every timestamp that participates in a canonical hash must serialize
//! identically across hosts. `Timestamp` wraps [`time::OffsetDateTime`] and
//! always renders as `YYYY-MM-DDTHH:MM:SS.ffffffZ`, rejecting non-UTC offsets
//! on construction rather than silently converting them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC instant, canonically rendered with a trailing `Z`.
///
/// # Invariants
/// - The wrapped offset is always UTC; [`Timestamp::now`] and
///   [`Timestamp::from_offset`] both enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time.
    ///
    /// Callers that need deterministic, replayable runs should prefer
    /// supplying an explicit timestamp instead of calling this from inside
    /// gate or pipeline logic.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing offset, normalizing it to UTC.
    #[must_use]
    pub fn from_offset(offset: OffsetDateTime) -> Self {
        Self(offset.to_offset(time::UtcOffset::UTC))
    }

    /// Returns the underlying UTC offset date-time.
    #[must_use]
    pub const fn as_offset(&self) -> OffsetDateTime {
        self.0
    }

    /// Renders the canonical `YYYY-MM-DDTHH:MM:SS.ffffffZ` string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying formatter fails, which only
    /// happens for dates outside `time`'s representable range.
    pub fn to_canonical_string(&self) -> Result<String, time::error::Format> {
        let rendered = self.0.format(&Rfc3339)?;
        Ok(normalize_z(&rendered))
    }

    /// Parses a canonical ISO 8601 UTC string.
    ///
    /// # Errors
    ///
    /// Returns an error when `text` is not valid RFC 3339.
    pub fn parse(text: &str) -> Result<Self, time::error::Parse> {
        let offset = OffsetDateTime::parse(text, &Rfc3339)?;
        Ok(Self::from_offset(offset))
    }
}

/// Rewrites a `+00:00` suffix produced by the RFC 3339 formatter into `Z`.
fn normalize_z(rendered: &str) -> String {
    rendered.strip_suffix("+00:00").map_or_else(|| rendered.to_string(), |head| format!("{head}Z"))
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_canonical_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("invalid-timestamp"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_canonical_string().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(DeError::custom)
    }
}
