// crates/gatekeeper-core/src/core/identifiers.rs
// ============================================================================
// Module: Gatekeeper Identifiers
// Description: Canonical opaque identifiers for packets, runs, and intents.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers are opaque newtypes that serialize as plain strings. Validation
//! of non-emptiness happens at the packet/run boundary, not in these
//! wrappers, so the types stay cheap to construct in tests and providers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Macro-Generated String Identifiers
// ============================================================================

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), ".")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true when the identifier is empty or all-whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(ArtifactId, "Artifact identifier for a publish packet.");
string_id!(TenantId, "Tenant identifier scoped to a run or packet.");
string_id!(ActorId, "Actor identifier for the caller that submitted a packet.");
string_id!(CorrelationId, "Opaque correlation identifier propagated end to end.");
string_id!(DestinationId, "Destination identifier a publish packet targets.");
string_id!(IntentId, "Identifier for a recorded side-effect intent.");
string_id!(ScenarioLabel, "Free-form scenario label used in Proof Pack manifests.");

// ============================================================================
// SECTION: Run Identifier
// ============================================================================

/// Run identifier: a UUID scoped to one pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh random run identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID as a run identifier.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Receipt / Pack Identifiers
// ============================================================================

string_id!(ReceiptId, "Identifier minted by the Governance SDK for a receipt.");
string_id!(EvidenceId, "Identifier minted by the Governance SDK for an evidence record.");
string_id!(PackId, "Identifier for a sealed Proof Pack.");
