//! Property-based test generators.

use proptest::prelude::*;

/// Strategy producing sorted, unique-keyed u32 record sets.
///
/// Keys are unique and ascending, matching what a btree stores; values are
/// arbitrary.
pub fn sorted_u32_pairs(max: usize) -> impl Strategy<Value = Vec<(u32, u32)>> {
    proptest::collection::btree_map(any::<u32>(), any::<u32>(), 0..max)
        .prop_map(|map| map.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pairs_are_sorted_and_unique(pairs in sorted_u32_pairs(32)) {
            for window in pairs.windows(2) {
                prop_assert!(window[0].0 < window[1].0);
            }
        }
    }
}
