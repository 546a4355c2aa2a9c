//! Error types for the tracer
//!
//! This module contains error types and a result type for the tracer.

use thiserror::Error;

/// Result type for tracer operations
pub type Result<T> = std::result::Result<T, TracerError>;

/// Error type for tracer operations
#[derive(Debug, Error)]
pub enum TracerError {
	/// The loader has no further definition of an interposed symbol
	#[error("Failed to resolve real `{symbol}`: {reason}")]
	SymbolNotFound { symbol: String, reason: String },

	/// An environment setting has an unrecognised value
	#[error("Invalid value {value:?} for {key}")]
	InvalidConfig { key: &'static str, value: String },
}
