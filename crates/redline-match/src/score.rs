//! Pairwise similarity scoring
//!
//! A pair score is a weighted mean of independent [0, 1] components computed
//! from the two fingerprints. Components that cannot be evaluated for a pair
//! (no embeddings on either side, no domain scorer plugged in) drop out and
//! the remaining weights renormalize, so a pair of identical fingerprints
//! always scores exactly 1.0.

use redline_model::Fingerprint;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Relative weights of the similarity components
///
/// Weights are relative, not required to sum to one; scoring divides by the
/// sum of the weights that were actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScorerWeights {
    /// Title token overlap (Jaccard)
    pub title: f64,
    /// Structural-type equality, binary
    pub structural: f64,
    /// Content embedding cosine similarity
    pub embedding: f64,
    /// Relative-position overlap
    pub position: f64,
    /// Pluggable domain-specific signal
    pub domain: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            title: 0.35,
            structural: 0.15,
            embedding: 0.25,
            position: 0.10,
            domain: 0.15,
        }
    }
}

/// Domain-specific similarity signal plugged into the reserved weight slot
///
/// Implementations see both fingerprints and return a [0, 1] score; values
/// outside the range are clamped. When no scorer is supplied the slot's
/// weight is redistributed across the other components.
pub trait DomainScorer: Send + Sync {
    /// Score a candidate pair
    fn score(&self, prev: &Fingerprint, curr: &Fingerprint) -> f64;
}

impl<T: DomainScorer + ?Sized> DomainScorer for &T {
    fn score(&self, prev: &Fingerprint, curr: &Fingerprint) -> f64 {
        (**self).score(prev, curr)
    }
}

/// Weighted similarity of one candidate pair, in [0, 1]
#[must_use]
pub fn pair_similarity(
    prev: &Fingerprint,
    curr: &Fingerprint,
    weights: &ScorerWeights,
    domain: Option<&dyn DomainScorer>,
) -> f64 {
    let mut weighted = 0.0;
    let mut applied = 0.0;

    weighted += weights.title * title_similarity(prev, curr);
    applied += weights.title;

    if prev.structural_type == curr.structural_type {
        weighted += weights.structural;
    }
    applied += weights.structural;

    // An empty embedding means none was supplied; the component only applies
    // when both sides carry one.
    if !prev.embedding.is_empty() && !curr.embedding.is_empty() {
        weighted += weights.embedding * cosine(&prev.embedding, &curr.embedding);
        applied += weights.embedding;
    }

    weighted += weights.position * (1.0 - (prev.position - curr.position).abs());
    applied += weights.position;

    if let Some(scorer) = domain {
        weighted += weights.domain * scorer.score(prev, curr).clamp(0.0, 1.0);
        applied += weights.domain;
    }

    if applied <= f64::EPSILON {
        return 0.0;
    }
    (weighted / applied).clamp(0.0, 1.0)
}

/// Jaccard overlap of the normalized title token sets
///
/// Two empty titles are indistinguishable and count as a full match.
fn title_similarity(prev: &Fingerprint, curr: &Fingerprint) -> f64 {
    if prev.title_tokens.is_empty() && curr.title_tokens.is_empty() {
        return 1.0;
    }
    let shared = prev.title_tokens.intersection(&curr.title_tokens).count();
    let union = prev.title_tokens.union(&curr.title_tokens).count();
    if union == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        shared as f64 / union as f64
    }
}

/// Cosine similarity mapped affinely from [-1, 1] into [0, 1]
///
/// A zero-norm vector carries no direction; two of them agree vacuously,
/// one against a real vector scores zero. Callers check dimensions before
/// reaching this point.
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a <= f64::EPSILON || norm_b <= f64::EPSILON {
        return if norm_a <= f64::EPSILON && norm_b <= f64::EPSILON {
            1.0
        } else {
            0.0
        };
    }
    let raw = dot / (norm_a.sqrt() * norm_b.sqrt());
    ((raw + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn narrative(title: &str, position: f64, embedding: Vec<f32>) -> Fingerprint {
        Fingerprint::new("narrative", position)
            .with_title(title)
            .with_embedding(embedding)
    }

    #[test]
    fn identical_fingerprints_score_one_without_a_domain_scorer() {
        let fp = narrative("Budget Overview", 0.3, vec![0.6, 0.8]);
        let score = pair_similarity(&fp, &fp.clone(), &ScorerWeights::default(), None);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn identical_fingerprints_without_embeddings_still_score_one() {
        let fp = narrative("Risk Register", 0.7, Vec::new());
        let score = pair_similarity(&fp, &fp.clone(), &ScorerWeights::default(), None);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn disjoint_fingerprints_score_low() {
        let a = narrative("Budget Overview", 0.0, vec![1.0, 0.0]);
        let mut b = narrative("Staffing Timeline", 1.0, vec![-1.0, 0.0]);
        b.structural_type = "table".to_owned();
        let score = pair_similarity(&a, &b, &ScorerWeights::default(), None);
        assert!(score < 0.1, "score was {score}");
    }

    #[test]
    fn title_overlap_is_jaccard() {
        let a = narrative("annual capital budget", 0.5, Vec::new());
        let b = narrative("capital budget detail", 0.5, Vec::new());
        // shared {capital, budget} over union of four tokens
        assert!((title_similarity(&a, &b) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn opposed_embeddings_map_to_zero() {
        assert!(cosine(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-9);
        assert!((cosine(&[0.0, 2.0], &[0.0, 5.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_norm_embeddings_agree_only_with_each_other() {
        assert_eq!(cosine(&[0.0, 0.0], &[0.0, 0.0]), 1.0);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn domain_scorer_contributes_its_slot() {
        struct Flat(f64);
        impl DomainScorer for Flat {
            fn score(&self, _: &Fingerprint, _: &Fingerprint) -> f64 {
                self.0
            }
        }

        let fp = narrative("Overview", 0.2, vec![0.5, 0.5]);
        let with_zero = pair_similarity(&fp, &fp.clone(), &ScorerWeights::default(), Some(&Flat(0.0)));
        let with_one = pair_similarity(&fp, &fp.clone(), &ScorerWeights::default(), Some(&Flat(1.0)));
        // A zero domain signal drags an otherwise perfect pair to 0.85.
        assert!((with_zero - 0.85).abs() < 1e-9, "score was {with_zero}");
        assert!((with_one - 1.0).abs() < 1e-9, "score was {with_one}");
    }
}
