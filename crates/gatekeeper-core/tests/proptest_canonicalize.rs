// crates/gatekeeper-core/tests/proptest_canonicalize.rs
// ============================================================================
// Module: Canonicalizer Property-Based Tests
// Description: Property tests for canonical JSON determinism and hash stability.
// Purpose: Detect panics and non-determinism across wide input ranges.
// ============================================================================

//! Property-based tests for canonicalization and hashing invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use gatekeeper_core::HashAlgorithm;
use gatekeeper_core::canonicalize;
use gatekeeper_core::hash_bytes;
use gatekeeper_core::verify_hash;
use proptest::prelude::*;
use serde_json::Value;

fn json_object_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z0-9_]{1,6}", inner, 0 .. 4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn canonicalize_never_panics_on_random_json(value in json_object_strategy(3)) {
        let _ = canonicalize(&value);
    }

    #[test]
    fn canonicalize_is_deterministic_across_repeated_calls(value in json_object_strategy(3)) {
        let first = canonicalize(&value).expect("canonicalize");
        let second = canonicalize(&value).expect("canonicalize");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn canonical_form_is_independent_of_object_key_insertion_order(
        pairs in prop::collection::vec(("[a-zA-Z0-9_]{1,6}", any::<i64>()), 1 .. 6),
    ) {
        let mut forward = serde_json::Map::new();
        for (key, value) in &pairs {
            forward.insert(key.clone(), Value::Number((*value).into()));
        }
        let mut reversed = serde_json::Map::new();
        for (key, value) in pairs.iter().rev() {
            reversed.insert(key.clone(), Value::Number((*value).into()));
        }

        let forward_bytes = canonicalize(&Value::Object(forward)).expect("canonicalize forward");
        let reversed_bytes = canonicalize(&Value::Object(reversed)).expect("canonicalize reversed");
        prop_assert_eq!(forward_bytes, reversed_bytes);
    }

    #[test]
    fn hash_bytes_is_deterministic_and_verifies(bytes in prop::collection::vec(any::<u8>(), 0 .. 512)) {
        let first = hash_bytes(HashAlgorithm::Sha256, &bytes);
        let second = hash_bytes(HashAlgorithm::Sha256, &bytes);
        prop_assert_eq!(&first.value, &second.value);
        prop_assert!(verify_hash(&bytes, &first));
    }

    #[test]
    fn hash_bytes_changes_with_a_single_flipped_byte(
        mut bytes in prop::collection::vec(any::<u8>(), 1 .. 512),
        index in any::<usize>(),
    ) {
        let original = hash_bytes(HashAlgorithm::Sha256, &bytes);
        let flip_at = index % bytes.len();
        bytes[flip_at] ^= 0xFF;
        let tampered = hash_bytes(HashAlgorithm::Sha256, &bytes);
        prop_assert_ne!(original.value, tampered.value);
    }
}
