//! Core traits and types for the lattice-serve decoding service
//!
//! This crate provides foundational types used across all other crates:
//! - Audio sample helpers
//! - Error types
//! - Ranked hypothesis types (`Alternative`, `Word`)

pub mod audio;
pub mod error;
pub mod hypothesis;

pub use audio::{duration_seconds, pcm16_to_samples};
pub use error::{AudioError, DecodeError, Error, ModelError, Result};
pub use hypothesis::{Alternative, Word};
