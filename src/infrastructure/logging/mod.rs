//! Logging infrastructure
//!
//! Structured logging with `tracing`:
//! - JSON and pretty console formats
//! - Rolling file output via `tracing-appender`
//! - `RUST_LOG` overrides through `EnvFilter`

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
