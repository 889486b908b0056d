use proptest::prelude::*;
use redline_model::{ContentHash, SectionContent};

proptest! {
    #[test]
    fn prop_display_parse_roundtrip(bytes in proptest::array::uniform32(any::<u8>())) {
        let hash = ContentHash::new(bytes);
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        prop_assert_eq!(hash, parsed);
    }

    #[test]
    fn prop_compute_is_stable(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(ContentHash::compute(&data), ContentHash::compute(&data));
    }

    #[test]
    fn prop_distinct_figures_hash_apart(a in 0u32..10_000, b in 0u32..10_000) {
        prop_assume!(a != b);
        let left = SectionContent::text("body").with_figure("total", f64::from(a));
        let right = SectionContent::text("body").with_figure("total", f64::from(b));
        prop_assert_ne!(ContentHash::of_content(&left), ContentHash::of_content(&right));
    }
}
