//! Sentence-transformers BERT encoder using candle-transformers
//!
//! Pipeline per text:
//! 1. Tokenize, rejecting input longer than the model's position table
//! 2. BERT forward pass to get token embeddings
//! 3. Mean pooling over tokens
//! 4. L2 normalization to a unit vector
//!
//! Weights, config and tokenizer are fetched once from the HuggingFace hub
//! and cached under `~/.cache/huggingface/hub/`.

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::Tokenizer;
use tracing::{info, warn};

use crate::domain::errors::EncodingError;
use crate::domain::ports::TextEncoder;

impl From<candle_core::Error> for EncodingError {
    fn from(err: candle_core::Error) -> Self {
        Self::Model(err.to_string())
    }
}

struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_seq_length: usize,
}

/// BERT sentence encoder. Cheap to share; inference runs on the blocking pool.
pub struct BertEncoder {
    inner: Arc<LoadedModel>,
    model_id: String,
    dimension: usize,
}

impl BertEncoder {
    /// Download (if needed) and load `model_id`, e.g.
    /// `sentence-transformers/all-MiniLM-L6-v2`.
    pub fn load(model_id: &str) -> Result<Self, EncodingError> {
        let device = select_device();
        info!(model = model_id, ?device, "loading BERT model");

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| EncodingError::Model(format!("failed to initialize HuggingFace API: {e}")))?;
        let repo = api.model(model_id.to_string());
        let fetch = |file: &str| {
            repo.get(file)
                .map_err(|e| EncodingError::Model(format!("failed to download {file}: {e}")))
        };

        let tokenizer_path = fetch("tokenizer.json")?;
        let config_path = fetch("config.json")?;
        let weights_path = fetch("model.safetensors")?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EncodingError::Model(format!("failed to load tokenizer: {e}")))?;

        let config_file = std::fs::File::open(&config_path)
            .map_err(|e| EncodingError::Model(format!("failed to open config.json: {e}")))?;
        let config: Config = serde_json::from_reader(config_file)
            .map_err(|e| EncodingError::Model(format!("failed to parse config.json: {e}")))?;

        // SAFETY: the safetensors file lives in the hub cache and is not
        // modified while mapped.
        #[allow(unsafe_code)]
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = BertModel::load(vb, &config)?;

        info!(
            model = model_id,
            dimension = config.hidden_size,
            layers = config.num_hidden_layers,
            "BERT model loaded"
        );

        Ok(Self {
            dimension: config.hidden_size,
            model_id: model_id.to_string(),
            inner: Arc::new(LoadedModel {
                model,
                tokenizer,
                device,
                max_seq_length: config.max_position_embeddings,
            }),
        })
    }

    pub fn max_seq_length(&self) -> usize {
        self.inner.max_seq_length
    }
}

fn select_device() -> Device {
    if candle_core::utils::cuda_is_available() {
        match Device::new_cuda(0) {
            Ok(device) => return device,
            Err(e) => warn!(error = %e, "CUDA available but initialization failed, using CPU"),
        }
    }
    if candle_core::utils::metal_is_available() {
        match Device::new_metal(0) {
            Ok(device) => return device,
            Err(e) => warn!(error = %e, "Metal available but initialization failed, using CPU"),
        }
    }
    Device::Cpu
}

impl LoadedModel {
    fn encode_blocking(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EncodingError::Model(format!("tokenization failed: {e}")))?;

        let ids = encoding.get_ids();
        if ids.len() > self.max_seq_length {
            return Err(EncodingError::TextTooLong {
                length: ids.len(),
                max_length: self.max_seq_length,
                unit: "tokens",
            });
        }

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        // (1, seq_len, hidden)
        let hidden = self.model.forward(&input_ids, &token_type_ids, None)?;
        let (_, seq_len, _) = hidden.dims3()?;
        let pooled = (hidden.sum(1)? / seq_len as f64)?;

        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f32::MAX)?;
        let normalized = pooled.broadcast_div(&norm)?;

        Ok(normalized.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?)
    }
}

#[async_trait]
impl TextEncoder for BertEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        let model = Arc::clone(&self.inner);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || model.encode_blocking(&text))
            .await
            .map_err(|e| EncodingError::Model(format!("inference task failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_identifier(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires network access to the HuggingFace hub
    #[tokio::test]
    #[ignore]
    async fn test_minilm_sentence_embedding() {
        let encoder = BertEncoder::load("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(encoder.dimension(), 384);

        let v = encoder.encode("A lighthouse on a rocky coast").await.unwrap();
        assert_eq!(v.len(), 384);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);

        let long = "word ".repeat(encoder.max_seq_length() + 10);
        assert!(matches!(
            encoder.encode(&long).await,
            Err(EncodingError::TextTooLong { unit: "tokens", .. })
        ));
    }
}
