//! Text encoders
//!
//! - `HashingEncoder`: deterministic feature hashing, always available
//! - `BertEncoder`: sentence-transformers BERT via candle (`bert` feature)

#[cfg(feature = "bert")]
pub mod bert_model;
pub mod hashing_encoder;

#[cfg(feature = "bert")]
pub use bert_model::BertEncoder;
pub use hashing_encoder::HashingEncoder;
