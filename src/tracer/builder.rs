//! Builder for creating tracers
//!
//! This module contains the `TracerBuilder` struct and the configuration
//! it produces.

use crate::ffi::Resolution;
use crate::tracer::sink::{RecordSink, StderrSink};
use crate::tracer::{Result, Tracer, TracerError};

/// Environment variable selecting the symbol resolution policy
pub const RESOLVE_ENV: &str = "FILEHOOK_RESOLVE";
/// Environment variable enabling the call count summary at exit
pub const STATS_ENV: &str = "FILEHOOK_STATS";

/// Configuration for a tracer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracerConfig {
	/// When to look up the genuine implementations
	pub resolution: Resolution,
	/// Whether to log call counts when the process exits
	pub print_stats: bool,
}

impl TracerConfig {
	/// Read the configuration from `FILEHOOK_RESOLVE` and `FILEHOOK_STATS`
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Read the configuration through an arbitrary variable lookup
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(value) = lookup(RESOLVE_ENV) {
			config.resolution = match value.trim().to_ascii_lowercase().as_str() {
				"" | "cached" => Resolution::Cached,
				"per-call" | "percall" | "always" => Resolution::PerCall,
				_ => return Err(TracerError::InvalidConfig { key: RESOLVE_ENV, value }),
			};
		}

		if let Some(value) = lookup(STATS_ENV) {
			config.print_stats = match value.trim().to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => true,
				"" | "0" | "false" | "no" | "off" => false,
				_ => return Err(TracerError::InvalidConfig { key: STATS_ENV, value }),
			};
		}

		Ok(config)
	}
}

/// Builder for creating tracers
pub struct TracerBuilder {
	config: TracerConfig,
	sink: Option<Box<dyn RecordSink>>,
}

impl Default for TracerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for TracerBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TracerBuilder")
			.field("config", &self.config)
			.field("sink", &self.sink.as_ref().map_or("StderrSink", |s| s.name()))
			.finish()
	}
}

impl TracerBuilder {
	/// Create a new tracer builder with default settings
	#[must_use]
	pub fn new() -> Self {
		Self {
			config: TracerConfig::default(),
			sink: None,
		}
	}

	/// Replace the whole configuration
	#[must_use]
	pub fn config(mut self, config: TracerConfig) -> Self {
		self.config = config;
		self
	}

	/// Set the symbol resolution policy
	#[must_use]
	pub const fn resolution(mut self, resolution: Resolution) -> Self {
		self.config.resolution = resolution;
		self
	}

	/// Enable or disable the call count summary at exit
	#[must_use]
	pub const fn print_stats(mut self, print: bool) -> Self {
		self.config.print_stats = print;
		self
	}

	/// Set the record sink
	#[must_use]
	pub fn sink<S: RecordSink + 'static>(mut self, sink: S) -> Self {
		self.sink = Some(Box::new(sink));
		self
	}

	/// Build the tracer
	#[must_use]
	pub fn build(self) -> Tracer {
		let sink = self.sink.unwrap_or_else(|| Box::new(StderrSink::new()));
		Tracer::new(self.config, sink)
	}
}
