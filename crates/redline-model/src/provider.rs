//! Capability interfaces supplied by the surrounding application
//!
//! The engine performs no inference and no I/O. Similarity scores,
//! embeddings, and term extraction arrive through these traits; callers are
//! expected to hand in implementations backed by already-resolved results,
//! keeping provider latency and retry policy outside the core.

/// Similarity and embedding capability
pub trait SimilarityProvider: Send + Sync {
    /// Similarity of two text payloads, in [0, 1]
    fn similarity(&self, a: &str, b: &str) -> f64;

    /// Fixed-dimension embedding of a text payload
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Entity/term extraction capability
///
/// Used during constraint compilation to instantiate enumerated-set and
/// required-term parameters from governance section content.
pub trait TermExtractor: Send + Sync {
    /// Terms extracted from `text`, in extraction order
    fn extract_terms(&self, text: &str) -> Vec<String>;
}

impl<T: SimilarityProvider + ?Sized> SimilarityProvider for &T {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        (**self).similarity(a, b)
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        (**self).embed(text)
    }
}

impl<T: TermExtractor + ?Sized> TermExtractor for &T {
    fn extract_terms(&self, text: &str) -> Vec<String> {
        (**self).extract_terms(text)
    }
}
