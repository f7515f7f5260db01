//! Embedding vector types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of values produced per audio asset
pub const EMBEDDING_DIM: usize = 512;

/// Width of the storage column the embedding is padded to
pub const PADDED_DIM: usize = 1536;

/// Errors raised while building or decoding an embedding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    #[error("embedding dimension mismatch: {actual} (expected {expected})")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding value at index {index} is not finite")]
    NonFinite { index: usize },

    #[error("malformed embedding text: {0}")]
    Parse(String),
}

/// Audio embedding with exactly [`EMBEDDING_DIM`] finite values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Validate length and finiteness
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.len() != EMBEDDING_DIM {
            return Err(EmbeddingError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: values.len(),
            });
        }
        check_finite(&values)?;
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean norm, accumulated in f64
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&v| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt()
    }

    /// Cosine similarity in [-1, 1]
    ///
    /// Returns 0.0 when either vector has zero magnitude.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f64 {
        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;

        for (&a, &b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (a as f64, b as f64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
    }

    /// Zero-extend to the storage width
    pub fn padded(&self) -> PaddedEmbedding {
        let mut values = Vec::with_capacity(PADDED_DIM);
        values.extend_from_slice(&self.0);
        values.resize(PADDED_DIM, 0.0);
        PaddedEmbedding(values)
    }
}

impl TryFrom<Vec<f32>> for EmbeddingVector {
    type Error = EmbeddingError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<EmbeddingVector> for Vec<f32> {
    fn from(embedding: EmbeddingVector) -> Self {
        embedding.0
    }
}

/// Embedding zero-extended to [`PADDED_DIM`] values for storage
///
/// Only obtainable through [`EmbeddingVector::padded`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PaddedEmbedding(Vec<f32>);

impl PaddedEmbedding {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    /// Check the storage invariants before a write
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.0.len() != PADDED_DIM {
            return Err(EmbeddingError::DimensionMismatch {
                expected: PADDED_DIM,
                actual: self.0.len(),
            });
        }
        check_finite(&self.0)
    }
}

fn check_finite(values: &[f32]) -> Result<(), EmbeddingError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EmbeddingError::NonFinite { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit(index: usize) -> EmbeddingVector {
        let mut values = vec![0.0; EMBEDDING_DIM];
        values[index] = 1.0;
        EmbeddingVector::new(values).unwrap()
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = EmbeddingVector::new(vec![0.0; 511]).unwrap_err();
        assert_eq!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 512,
                actual: 511
            }
        );
        assert!(err.to_string().contains("511"));
    }

    #[test]
    fn test_rejects_nan() {
        let mut values = vec![0.5; EMBEDDING_DIM];
        values[42] = f32::NAN;
        assert_eq!(
            EmbeddingVector::new(values).unwrap_err(),
            EmbeddingError::NonFinite { index: 42 }
        );
    }

    #[test]
    fn test_cosine_identical_is_one() {
        let values: Vec<f32> = (0..EMBEDDING_DIM).map(|i| (i as f32 * 0.37).sin()).collect();
        let a = EmbeddingVector::new(values.clone()).unwrap();
        let b = EmbeddingVector::new(values).unwrap();
        assert_relative_eq!(a.cosine_similarity(&b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert_relative_eq!(unit(0).cosine_similarity(&unit(1)), 0.0);

        let negative = EmbeddingVector::new(
            unit(3).as_slice().iter().map(|v| -v).collect(),
        )
        .unwrap();
        assert_relative_eq!(unit(3).cosine_similarity(&negative), -1.0);
    }

    #[test]
    fn test_cosine_is_scale_invariant() {
        let a = EmbeddingVector::new(vec![1.0; EMBEDDING_DIM]).unwrap();
        let b = EmbeddingVector::new(vec![7.5; EMBEDDING_DIM]).unwrap();
        assert_relative_eq!(a.cosine_similarity(&b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_vector_similarity() {
        let zero = EmbeddingVector::new(vec![0.0; EMBEDDING_DIM]).unwrap();
        assert_eq!(zero.cosine_similarity(&unit(0)), 0.0);
    }

    #[test]
    fn test_padding_keeps_prefix() {
        let values: Vec<f32> = (0..EMBEDDING_DIM).map(|i| i as f32).collect();
        let padded = EmbeddingVector::new(values.clone()).unwrap().padded();

        assert_eq!(padded.as_slice().len(), PADDED_DIM);
        assert_eq!(&padded.as_slice()[..EMBEDDING_DIM], values.as_slice());
        assert!(padded.as_slice()[EMBEDDING_DIM..].iter().all(|&v| v == 0.0));
        assert!(padded.validate().is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::to_string(&vec![0.25f32; 10]).unwrap();
        assert!(serde_json::from_str::<EmbeddingVector>(&json).is_err());
    }
}
