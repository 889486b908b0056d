//! Cross-revision section alignment
//!
//! Builds the full similarity matrix between a previous snapshot's sections
//! and the current draft's, solves the maximum-similarity assignment, and
//! splits the outcome at the acceptance threshold: confident pairs carry
//! ids forward, everything else becomes new or deprecated. Low-confidence
//! pairs are reported, never force-merged.
//!
//! Results are canonical: both sides are re-sorted by id before scoring, so
//! the outcome does not depend on input order. Ties in total similarity
//! break toward the smaller position gap, then the smaller previous id.

use crate::assignment::solve_max;
use crate::error::MatchError;
use crate::score::{pair_similarity, DomainScorer, ScorerWeights};
use rayon::prelude::*;
use redline_model::{Fingerprint, SectionId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Acceptance threshold below which an assigned pair is split into a
/// deprecated prev and a new curr instead of a match
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Similarity quantum: scores closer than this count as tied
const SIM_QUANTUM: f64 = 10_000_000.0;
/// Multiplier lifting quantized similarity above every tie-break layer
const LAYER: i64 = 1_000_000_000;
/// Position-gap quantum for the first tie-break
const POS_QUANTUM: f64 = 1_000.0;
/// Multiplier lifting the position layer above the id-rank layer
const POS_UNIT: i64 = 1_000;
/// Highest id rank that still participates in tie-breaking
const RANK_CAP: usize = 999;

/// A section id paired with its similarity fingerprint
///
/// The ingestion provider computes fingerprints; the matcher only compares
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionFingerprint {
    /// Stable id from the owning snapshot
    pub id: SectionId,
    /// Similarity signature
    pub fingerprint: Fingerprint,
}

impl SectionFingerprint {
    /// Pair an id with its fingerprint
    #[must_use]
    pub fn new(id: impl Into<SectionId>, fingerprint: Fingerprint) -> Self {
        Self {
            id: id.into(),
            fingerprint,
        }
    }
}

/// One confidently aligned pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchedPair {
    /// Section in the previous snapshot
    pub prev: SectionId,
    /// Section in the current draft
    pub curr: SectionId,
    /// Similarity score in [0, 1]
    pub similarity: f64,
}

/// Outcome of aligning two snapshots
///
/// Matched sections carry their prev id and dependency edges into the next
/// snapshot; new sections need fresh ids and explicit edges; deprecated
/// sections leave the active graph but stay in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchResult {
    /// Pairs at or above the acceptance threshold, ascending by prev id
    pub matched: Vec<MatchedPair>,
    /// Current sections with no confident counterpart, ascending
    pub new_sections: Vec<SectionId>,
    /// Previous sections with no confident counterpart, ascending
    pub deprecated: Vec<SectionId>,
}

impl MatchResult {
    /// True when every section on both sides found a counterpart
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.new_sections.is_empty() && self.deprecated.is_empty()
    }
}

/// Align two snapshots' sections by fingerprint similarity
///
/// The reserved domain-signal slot stays unplugged here and its weight is
/// redistributed; use [`match_revisions_with`] to supply a scorer.
///
/// # Errors
/// [`MatchError::DuplicateId`] and [`MatchError::DimensionMismatch`] on
/// malformed input.
pub fn match_revisions(
    prev: &[SectionFingerprint],
    curr: &[SectionFingerprint],
    weights: &ScorerWeights,
    threshold: f64,
) -> Result<MatchResult, MatchError> {
    align(prev, curr, weights, None, threshold, &AtomicBool::new(false))
}

/// [`match_revisions`] with a domain scorer plugged into the reserved slot
///
/// # Errors
/// Same conditions as [`match_revisions`].
pub fn match_revisions_with(
    prev: &[SectionFingerprint],
    curr: &[SectionFingerprint],
    weights: &ScorerWeights,
    domain: &dyn DomainScorer,
    threshold: f64,
) -> Result<MatchResult, MatchError> {
    align(
        prev,
        curr,
        weights,
        Some(domain),
        threshold,
        &AtomicBool::new(false),
    )
}

/// Run the alignment on the blocking pool under a wall-clock budget
///
/// The solve is the one core operation that can run long. When `budget`
/// elapses the worker is cancelled and [`MatchError::ComputationTimeout`]
/// comes back with nothing partial attached; retry with fewer sections, a
/// relaxed threshold, or a longer budget.
///
/// # Errors
/// Input errors as [`match_revisions`], plus
/// [`MatchError::ComputationTimeout`] when the budget elapses and
/// [`MatchError::WorkerLost`] if the worker terminates abnormally.
pub async fn match_revisions_bounded(
    prev: Vec<SectionFingerprint>,
    curr: Vec<SectionFingerprint>,
    weights: ScorerWeights,
    domain: Option<Arc<dyn DomainScorer>>,
    threshold: f64,
    budget: Duration,
) -> Result<MatchResult, MatchError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let task = tokio::task::spawn_blocking(move || {
        align(
            &prev,
            &curr,
            &weights,
            domain.as_deref(),
            threshold,
            &worker_cancel,
        )
    });

    match tokio::time::timeout(budget, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(MatchError::WorkerLost {
            reason: join_error.to_string(),
        }),
        Err(_elapsed) => {
            cancel.store(true, Ordering::Relaxed);
            tracing::warn!(
                "revision match abandoned after {} ms budget",
                budget.as_millis()
            );
            Err(MatchError::ComputationTimeout)
        }
    }
}

fn align(
    prev: &[SectionFingerprint],
    curr: &[SectionFingerprint],
    weights: &ScorerWeights,
    domain: Option<&dyn DomainScorer>,
    threshold: f64,
    cancel: &AtomicBool,
) -> Result<MatchResult, MatchError> {
    let prev_sorted = canonical(prev)?;
    let curr_sorted = canonical(curr)?;
    check_dimensions(&prev_sorted, &curr_sorted)?;

    let similarities: Vec<Vec<f64>> = prev_sorted
        .par_iter()
        .map(|p| -> Result<Vec<f64>, MatchError> {
            if cancel.load(Ordering::Relaxed) {
                return Err(MatchError::ComputationTimeout);
            }
            Ok(curr_sorted
                .iter()
                .map(|c| pair_similarity(&p.fingerprint, &c.fingerprint, weights, domain))
                .collect())
        })
        .collect::<Result<_, _>>()?;

    let values: Vec<Vec<i64>> = prev_sorted
        .iter()
        .enumerate()
        .map(|(rank, p)| {
            curr_sorted
                .iter()
                .enumerate()
                .map(|(j, c)| {
                    let gap = (p.fingerprint.position - c.fingerprint.position).abs();
                    layered_value(similarities[rank][j], gap, rank)
                })
                .collect()
        })
        .collect();

    let assignment = solve_max(&values, cancel).ok_or(MatchError::ComputationTimeout)?;

    let mut matched = Vec::new();
    let mut taken_curr = vec![false; curr_sorted.len()];
    for (i, slot) in assignment.iter().enumerate() {
        let Some(j) = slot else { continue };
        let similarity = similarities[i][*j];
        if similarity >= threshold {
            matched.push(MatchedPair {
                prev: prev_sorted[i].id.clone(),
                curr: curr_sorted[*j].id.clone(),
                similarity,
            });
            taken_curr[*j] = true;
        }
    }

    let matched_prev: BTreeSet<&SectionId> = matched.iter().map(|pair| &pair.prev).collect();
    let deprecated: Vec<SectionId> = prev_sorted
        .iter()
        .filter(|p| !matched_prev.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();
    let new_sections: Vec<SectionId> = curr_sorted
        .iter()
        .enumerate()
        .filter(|(j, _)| !taken_curr[*j])
        .map(|(_, c)| c.id.clone())
        .collect();

    tracing::debug!(
        "aligned {} prev with {} curr: {} matched, {} new, {} deprecated",
        prev_sorted.len(),
        curr_sorted.len(),
        matched.len(),
        new_sections.len(),
        deprecated.len()
    );

    Ok(MatchResult {
        matched,
        new_sections,
        deprecated,
    })
}

/// Sort one side by id, rejecting duplicates
fn canonical(side: &[SectionFingerprint]) -> Result<Vec<&SectionFingerprint>, MatchError> {
    let mut sorted: Vec<&SectionFingerprint> = side.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    for pair in sorted.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(MatchError::DuplicateId {
                id: pair[0].id.clone(),
            });
        }
    }
    Ok(sorted)
}

/// Every non-empty embedding across both sides must share one dimension
fn check_dimensions(
    prev: &[&SectionFingerprint],
    curr: &[&SectionFingerprint],
) -> Result<(), MatchError> {
    let mut expected: Option<usize> = None;
    for entry in prev.iter().chain(curr.iter()) {
        let dim = entry.fingerprint.embedding.len();
        if dim == 0 {
            continue;
        }
        match expected {
            None => expected = Some(dim),
            Some(d) if d == dim => {}
            Some(d) => {
                return Err(MatchError::DimensionMismatch {
                    id: entry.id.clone(),
                    expected: d,
                    found: dim,
                });
            }
        }
    }
    Ok(())
}

/// Quantize one cell into dominated layers: similarity first, then the
/// position gap, then the prev-id rank. A full unit of a higher layer always
/// outweighs everything below it across the whole assignment.
#[allow(clippy::cast_possible_truncation)]
fn layered_value(similarity: f64, position_gap: f64, prev_rank: usize) -> i64 {
    let sim_q = (similarity.clamp(0.0, 1.0) * SIM_QUANTUM).round() as i64;
    let gap_q = (position_gap.clamp(0.0, 1.0) * POS_QUANTUM).round() as i64;
    let rank_bonus = i64::try_from(RANK_CAP.saturating_sub(prev_rank)).unwrap_or(0);
    sim_q * LAYER + (POS_QUANTUM as i64 - gap_q) * POS_UNIT + rank_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn print(id: &str, title: &str, position: f64) -> SectionFingerprint {
        SectionFingerprint::new(
            id,
            Fingerprint::new("narrative", position).with_title(title),
        )
    }

    fn embedded(id: &str, title: &str, position: f64, embedding: Vec<f32>) -> SectionFingerprint {
        SectionFingerprint::new(
            id,
            Fingerprint::new("narrative", position)
                .with_title(title)
                .with_embedding(embedding),
        )
    }

    fn plan_sections() -> Vec<SectionFingerprint> {
        vec![
            print("mandate", "Program Mandate", 0.0),
            print("budget", "Capital Budget", 0.4),
            print("timeline", "Delivery Timeline", 0.8),
        ]
    }

    #[test]
    fn identical_sets_match_perfectly() {
        let sections = plan_sections();
        let result = match_revisions(
            &sections,
            &sections,
            &ScorerWeights::default(),
            DEFAULT_THRESHOLD,
        )
        .unwrap();

        assert_eq!(result.matched.len(), 3);
        for pair in &result.matched {
            assert_eq!(pair.prev, pair.curr);
            assert!((pair.similarity - 1.0).abs() < 1e-9);
        }
        assert!(result.is_complete());
    }

    #[test]
    fn disjoint_sets_split_into_new_and_deprecated() {
        let prev = vec![
            embedded("budget", "Capital Budget", 0.1, vec![1.0, 0.0]),
            embedded("risk", "Risk Register", 0.2, vec![0.0, 1.0]),
        ];
        let mut curr = vec![
            embedded("menu", "Seasonal Menu", 0.9, vec![-1.0, 0.0]),
            embedded("recipes", "Recipe Index", 0.8, vec![0.0, -1.0]),
            embedded("suppliers", "Produce Suppliers", 0.7, vec![-0.7, -0.7]),
        ];
        for entry in &mut curr {
            entry.fingerprint.structural_type = "table".to_owned();
        }

        let result = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();

        assert!(result.matched.is_empty());
        assert_eq!(
            result.deprecated,
            vec![SectionId::new("budget"), SectionId::new("risk")]
        );
        assert_eq!(
            result.new_sections,
            vec![
                SectionId::new("menu"),
                SectionId::new("recipes"),
                SectionId::new("suppliers")
            ]
        );
    }

    #[test]
    fn equal_candidates_fall_to_the_smaller_prev_id() {
        // Two indistinguishable prev sections compete for one curr slot.
        let prev = vec![print("beta", "Overview", 0.5), print("alpha", "Overview", 0.5)];
        let curr = vec![print("overview", "Overview", 0.5)];

        let result = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].prev, SectionId::new("alpha"));
        assert_eq!(result.deprecated, vec![SectionId::new("beta")]);
    }

    #[test]
    fn position_gap_breaks_ties_before_id_order() {
        // Position carries no similarity weight here, so both candidates
        // score identically and only the tie-break layers separate them.
        let weights = ScorerWeights {
            position: 0.0,
            ..ScorerWeights::default()
        };
        let prev = vec![print("intro", "Introduction", 0.10)];
        let curr = vec![
            print("far", "Introduction", 0.95),
            print("near", "Introduction", 0.12),
        ];

        let result = match_revisions(&prev, &curr, &weights, DEFAULT_THRESHOLD).unwrap();

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].curr, SectionId::new("near"));
        assert_eq!(result.new_sections, vec![SectionId::new("far")]);
    }

    #[test]
    fn threshold_splits_instead_of_forcing_a_merge() {
        // Same structural type and position, nothing else shared: 0.25 of
        // 0.60 applied weight, well under the default threshold.
        let prev = vec![print("budget", "Capital Budget", 0.5)];
        let curr = vec![print("staffing", "Staffing Outlook", 0.5)];

        let strict = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();
        assert!(strict.matched.is_empty());
        assert_eq!(strict.deprecated, vec![SectionId::new("budget")]);
        assert_eq!(strict.new_sections, vec![SectionId::new("staffing")]);

        let relaxed = match_revisions(&prev, &curr, &ScorerWeights::default(), 0.3).unwrap();
        assert_eq!(relaxed.matched.len(), 1);
        assert!(relaxed.is_complete());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let prev = vec![embedded("a", "Alpha", 0.1, vec![0.5, 0.5])];
        let curr = vec![embedded("b", "Beta", 0.2, vec![0.5, 0.5, 0.5])];

        let err = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap_err();
        assert!(matches!(
            err,
            MatchError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let prev = vec![print("a", "Alpha", 0.1), print("a", "Alias", 0.2)];
        let err = match_revisions(&prev, &[], &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap_err();
        assert!(matches!(err, MatchError::DuplicateId { .. }));
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let mut prev = plan_sections();
        let curr = plan_sections();
        let forward = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();
        prev.reverse();
        let reversed = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();
        assert_eq!(forward, reversed);
    }

    #[tokio::test]
    async fn bounded_solve_agrees_with_the_sync_path() {
        let prev = plan_sections();
        let curr = plan_sections();
        let sync = match_revisions(&prev, &curr, &ScorerWeights::default(), DEFAULT_THRESHOLD)
            .unwrap();

        let bounded = match_revisions_bounded(
            prev,
            curr,
            ScorerWeights::default(),
            None,
            DEFAULT_THRESHOLD,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(sync, bounded);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_timeout_and_nothing_else() {
        let wide: Vec<SectionFingerprint> = (0..100)
            .map(|i| {
                let phase = f64::from(i);
                let embedding: Vec<f32> = (0..128)
                    .map(|d| ((phase + f64::from(d)).sin() as f32))
                    .collect();
                embedded(
                    &format!("s{i:03}"),
                    &format!("Section {i}"),
                    phase / 100.0,
                    embedding,
                )
            })
            .collect();

        let err = match_revisions_bounded(
            wide.clone(),
            wide,
            ScorerWeights::default(),
            None,
            DEFAULT_THRESHOLD,
            Duration::ZERO,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MatchError::ComputationTimeout));
    }
}
