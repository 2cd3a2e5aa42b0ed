//! Property-based tests for patch naming and ordering.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{encode_patch_name, is_patch_file_name};
    use crate::store::{PatchFile, PatchSet};
    use proptest::prelude::*;

    // ============================================================================
    // encode_patch_name property tests
    // ============================================================================

    proptest! {
        /// Property: encoded names are flat (no separators survive)
        #[test]
        fn encode_patch_name_is_flat(input in ".*") {
            let result = encode_patch_name(&input);
            prop_assert!(!result.contains('/'));
            prop_assert!(!result.contains('\\'));
        }

        /// Property: encoded names are recognized as patch files, dotfiles included
        #[test]
        fn encode_patch_name_is_a_patch_file(input in "[a-zA-Z0-9_./-]{1,40}") {
            let result = encode_patch_name(&input);
            prop_assert!(result.ends_with(".diff"));
            prop_assert!(is_patch_file_name(&result));
        }

        /// Property: paths without underscores or backslashes never collide
        #[test]
        fn encode_patch_name_is_injective_without_underscores(
            a in "[a-z0-9./]{1,20}",
            b in "[a-z0-9./]{1,20}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(encode_patch_name(&a), encode_patch_name(&b));
        }
    }

    // ============================================================================
    // PatchSet ordering property tests
    // ============================================================================

    proptest! {
        /// Property: a PatchSet's order does not depend on input order
        #[test]
        fn patch_set_order_is_input_independent(
            names in proptest::collection::btree_set("[A-Za-z0-9_-]{1,12}\\.diff", 0..12)
        ) {
            let forward: Vec<PatchFile> = names
                .iter()
                .map(|n| PatchFile::new(n.clone(), Vec::new()))
                .collect();
            let mut backward = forward.clone();
            backward.reverse();

            let a = PatchSet::new(forward);
            let b = PatchSet::new(backward);
            prop_assert_eq!(a.names(), b.names());
        }

        /// Property: PatchSet order is byte-wise and case-sensitive
        #[test]
        fn patch_set_order_is_bytewise(
            names in proptest::collection::btree_set("[A-Za-z0-9_-]{1,12}\\.diff", 0..12)
        ) {
            let set = PatchSet::new(
                names.iter().map(|n| PatchFile::new(n.clone(), Vec::new())).collect(),
            );
            let sorted = set.names();
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].as_bytes() < pair[1].as_bytes());
            }
        }
    }
}
