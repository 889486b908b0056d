use proptest::prelude::*;
use redline_match::{match_revisions, MatchResult, ScorerWeights, SectionFingerprint, DEFAULT_THRESHOLD};
use redline_model::{Fingerprint, SectionId};
use std::collections::BTreeSet;

const TITLE_POOL: &[&str] = &[
    "budget", "capital", "staffing", "risk", "timeline", "mandate", "outlook", "summary",
];

fn fingerprint_strategy() -> impl Strategy<Value = Fingerprint> {
    (
        proptest::sample::subsequence(TITLE_POOL.to_vec(), 0..4),
        prop_oneof!["narrative", "table", "heading"],
        0.0..=1.0f64,
        proptest::collection::vec(-1.0..=1.0f32, 4),
        any::<bool>(),
    )
        .prop_map(|(tokens, structural, position, embedding, embedded)| {
            let fp = Fingerprint::new(structural, position).with_tokens(tokens);
            if embedded {
                fp.with_embedding(embedding)
            } else {
                fp
            }
        })
}

fn side_strategy(max_len: usize) -> impl Strategy<Value = Vec<SectionFingerprint>> {
    proptest::collection::vec(fingerprint_strategy(), 0..max_len).prop_map(|prints| {
        prints
            .into_iter()
            .enumerate()
            .map(|(i, fp)| SectionFingerprint::new(format!("s{i:02}"), fp))
            .collect()
    })
}

fn ids(entries: &[SectionFingerprint]) -> BTreeSet<SectionId> {
    entries.iter().map(|entry| entry.id.clone()).collect()
}

proptest! {
    #[test]
    fn prop_matching_a_snapshot_against_itself_is_perfect(side in side_strategy(12)) {
        let result = match_revisions(&side, &side, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();

        prop_assert_eq!(result.matched.len(), side.len());
        prop_assert!(result.new_sections.is_empty());
        prop_assert!(result.deprecated.is_empty());
        for pair in &result.matched {
            prop_assert_eq!(&pair.prev, &pair.curr);
            prop_assert!((pair.similarity - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_every_section_lands_in_exactly_one_bucket(
        prev in side_strategy(10),
        curr in side_strategy(10),
    ) {
        let result = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();

        let mut prev_seen: BTreeSet<SectionId> = result.deprecated.iter().cloned().collect();
        prop_assert_eq!(prev_seen.len(), result.deprecated.len());
        for pair in &result.matched {
            prop_assert!(prev_seen.insert(pair.prev.clone()), "prev id reused");
        }
        prop_assert_eq!(prev_seen, ids(&prev));

        let mut curr_seen: BTreeSet<SectionId> = result.new_sections.iter().cloned().collect();
        prop_assert_eq!(curr_seen.len(), result.new_sections.len());
        for pair in &result.matched {
            prop_assert!(curr_seen.insert(pair.curr.clone()), "curr id reused");
        }
        prop_assert_eq!(curr_seen, ids(&curr));
    }

    #[test]
    fn prop_matched_pairs_clear_the_threshold(
        prev in side_strategy(8),
        curr in side_strategy(8),
        threshold in 0.0..=1.0f64,
    ) {
        let result = match_revisions(&prev, &curr, &ScorerWeights::default(), threshold).unwrap();
        for pair in &result.matched {
            prop_assert!(pair.similarity >= threshold);
            prop_assert!(pair.similarity <= 1.0);
        }
    }

    #[test]
    fn prop_result_ignores_input_order(
        prev in side_strategy(8).prop_shuffle(),
        curr in side_strategy(8),
    ) {
        let mut restored = prev.clone();
        restored.sort_by(|a, b| a.id.cmp(&b.id));

        let shuffled = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();
        let sorted = match_revisions(&restored, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();
        prop_assert_eq!(shuffled, sorted);
    }
}

#[test]
fn results_round_trip_through_serde() {
    let prev = vec![
        SectionFingerprint::new("budget", Fingerprint::new("table", 0.2).with_title("Budget")),
        SectionFingerprint::new("risk", Fingerprint::new("narrative", 0.6).with_title("Risk")),
    ];
    let curr = vec![SectionFingerprint::new(
        "budget",
        Fingerprint::new("table", 0.25).with_title("Budget"),
    )];

    let result = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
        .unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let back: MatchResult = serde_json::from_str(&json).unwrap();
    assert_eq!(result, back);
}
