//! Infrastructure layer module
//!
//! Adapters satisfying the domain ports:
//! - Database (SQLite with sqlx, optional SpatiaLite)
//! - Text encoders
//! - H3 spatial cells
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod database;
pub mod logging;
pub mod setup;
pub mod spatial;
pub mod vector;
