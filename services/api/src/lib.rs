//! services/api/src/lib.rs
//!
//! The store locator HTTP service: configuration, storage and mail adapters,
//! and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
