//! Text similarity between renter preferences and listing copy.
//!
//! The embedding backend is an injectable capability. Without one (or when it
//! fails) the semantic signal is a neutral 0.5 and scoring carries on.

use std::sync::Arc;
use thiserror::Error;

use crate::models::{ListingProfile, RenterProfile};

/// Errors raised by embedding backends
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend unavailable")]
    Unavailable,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Capability that turns texts into embedding vectors
pub trait TextEmbedder: Send + Sync {
    /// Whether calling `embed` can produce vectors at all
    fn is_available(&self) -> bool {
        true
    }

    /// Embed each text, returning one vector per input in order
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Default capability: no backend configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmbedder;

impl TextEmbedder for NoopEmbedder {
    fn is_available(&self) -> bool {
        false
    }

    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Unavailable)
    }
}

/// Semantic signal computed through a `TextEmbedder`
#[derive(Clone)]
pub struct SemanticMatcher {
    embedder: Arc<dyn TextEmbedder>,
}

impl std::fmt::Debug for SemanticMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticMatcher")
            .field("available", &self.embedder.is_available())
            .finish()
    }
}

impl Default for SemanticMatcher {
    fn default() -> Self {
        Self::new(Arc::new(NoopEmbedder))
    }
}

impl SemanticMatcher {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }

    pub fn is_available(&self) -> bool {
        self.embedder.is_available()
    }

    /// Similarity in [0, 1]; 0.5 when unavailable, failing, or text is missing
    pub fn score(&self, renter: &RenterProfile, listing: &ListingProfile) -> f64 {
        if !self.embedder.is_available() {
            return 0.5;
        }

        let renter_texts = renter_texts(renter);
        let listing_texts = listing_texts(listing);
        if renter_texts.is_empty() || listing_texts.is_empty() {
            return 0.5;
        }

        match self.similarity(&renter_texts, &listing_texts) {
            Ok(similarity) => ((similarity + 1.0) / 2.0).clamp(0.0, 1.0),
            Err(e) => {
                tracing::warn!(
                    "Semantic scoring failed for renter {} / listing {}, using neutral signal: {}",
                    renter.user_id,
                    listing.id,
                    e
                );
                0.5
            }
        }
    }

    fn similarity(&self, left: &[String], right: &[String]) -> Result<f64, EmbeddingError> {
        let left = mean_pool(&self.embedder.embed(left)?)?;
        let right = mean_pool(&self.embedder.embed(right)?)?;
        if left.len() != right.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "dimension mismatch: {} vs {}",
                left.len(),
                right.len()
            )));
        }
        Ok(cosine_similarity(&left, &right))
    }
}

fn renter_texts(renter: &RenterProfile) -> Vec<String> {
    renter
        .custom_preferences
        .iter()
        .chain(renter.locations.iter())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

fn listing_texts(listing: &ListingProfile) -> Vec<String> {
    listing
        .description
        .iter()
        .chain(listing.custom_tags.iter())
        .chain(listing.neighborhood_description.iter())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Element-wise mean of a batch of equal-length vectors
fn mean_pool(vectors: &[Vec<f32>]) -> Result<Vec<f32>, EmbeddingError> {
    let first = vectors
        .first()
        .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding batch".into()))?;
    let dims = first.len();

    let mut pooled = vec![0.0_f32; dims];
    for vector in vectors {
        if vector.len() != dims {
            return Err(EmbeddingError::InvalidResponse(format!(
                "ragged embedding batch: expected {} dimensions, got {}",
                dims,
                vector.len()
            )));
        }
        for (acc, value) in pooled.iter_mut().zip(vector) {
            *acc += value;
        }
    }

    let count = vectors.len() as f32;
    pooled.iter_mut().for_each(|value| *value /= count);
    Ok(pooled)
}

/// Cosine similarity in [-1, 1]; zero vectors compare as 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|y| (*y as f64).powi(2)).sum::<f64>().sqrt();
    dot / (norm_a * norm_b + 1e-8)
}
