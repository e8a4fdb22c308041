//! Deterministic feature-hashing text encoder.
//!
//! Lowercased word unigrams and padded character trigrams are hashed into a
//! fixed number of signed buckets, then the vector is scaled to unit length.
//! Texts sharing vocabulary land close together; no model download needed.

use async_trait::async_trait;

use crate::domain::errors::EncodingError;
use crate::domain::ports::TextEncoder;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f64 = 1.0;
const TRIGRAM_WEIGHT: f64 = 0.5;

pub struct HashingEncoder {
    dimension: usize,
    max_input_chars: usize,
    model_id: String,
}

impl HashingEncoder {
    pub fn new(dimension: usize, max_input_chars: usize) -> Self {
        Self {
            dimension,
            max_input_chars,
            model_id: format!("geoembed-hashing-v1-d{dimension}"),
        }
    }

    /// Synchronous encoding, shared by the async trait method and benches.
    pub fn encode_sync(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        let length = text.chars().count();
        if length > self.max_input_chars {
            return Err(EncodingError::TextTooLong {
                length,
                max_length: self.max_input_chars,
                unit: "characters",
            });
        }

        let mut buckets = vec![0.0_f64; self.dimension];
        if self.dimension == 0 {
            return Ok(Vec::new());
        }

        let lowered = text.to_lowercase();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.accumulate(&mut buckets, &[b"w:", word.as_bytes()], WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('^')
                .chain(word.chars())
                .chain(std::iter::once('$'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut buckets, &[b"c:", trigram.as_bytes()], TRIGRAM_WEIGHT);
            }
        }

        let norm = buckets.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut buckets {
                *value /= norm;
            }
        }

        Ok(buckets.into_iter().map(|v| v as f32).collect())
    }

    fn accumulate(&self, buckets: &mut [f64], parts: &[&[u8]], weight: f64) {
        let hash = fnv1a(parts);
        let index = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        buckets[index] += sign * weight;
    }
}

fn fnv1a(parts: &[&[u8]]) -> u64 {
    parts
        .iter()
        .flat_map(|part| part.iter())
        .fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
        })
}

#[async_trait]
impl TextEncoder for HashingEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        self.encode_sync(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_identifier(&self) -> &str {
        &self.model_id
    }
}
