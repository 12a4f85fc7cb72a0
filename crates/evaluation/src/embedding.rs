//! Text embedding providers.
//!
//! Every metric goes through the [`Embedder`] trait. Implementations must be deterministic for
//! a fixed configuration and return vectors of one fixed length. Embedding is the dominant
//! cost of evaluation, so the trait takes a batch and metrics embed each text set in a single
//! call.

use crate::{EvaluationError, EvaluationResult};

/// Maps text to fixed-length vectors.
pub trait Embedder {
    /// Embed every text, returning one vector per input in input order.
    fn embed(&self, texts: &[&str]) -> EvaluationResult<Vec<Vec<f32>>>;

    /// Length of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Description of the provider, for logging.
    fn name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, texts: &[&str]) -> EvaluationResult<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Bag-of-words embedding via feature hashing.
///
/// Lowercased alphanumeric tokens are hashed into buckets and the resulting counts are
/// L2-normalised. This is lexical, not semantic: texts sharing words are similar, synonyms are
/// not. Use it offline and in tests; plug a sentence-embedding model in through [`Embedder`]
/// for real evaluation.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dimensions: usize,
    name: String,
}

impl HashingEmbedder {
    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidInput` if `dimensions` is zero.
    pub fn new(dimensions: usize) -> EvaluationResult<Self> {
        if dimensions == 0 {
            return Err(EvaluationError::InvalidInput(
                "embedding dimensions must be positive".into(),
            ));
        }
        Ok(Self {
            dimensions,
            name: "hashing".to_string(),
        })
    }

    /// Label the embedder with the model it stands in for.
    pub fn named(mut self, model_name: &str) -> Self {
        self.name = format!("hashing ({model_name})");
        self
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let mut tokens = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .peekable();

        if tokens.peek().is_none() && !lowered.is_empty() {
            // text without words, blank or punctuation only, embeds as itself
            vector[self.bucket(&lowered)] += 1.0;
        }
        for token in tokens {
            vector[self.bucket(token)] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[&str]) -> EvaluationResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 64-bit FNV-1a, stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(PRIME))
}
