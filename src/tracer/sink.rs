//! Record sinks
//!
//! A sink receives the record of every intercepted call. Sinks are shared by
//! all threads of the traced process and must emit each record as a unit.

use std::io::Write;
use tracing::debug;

use crate::call::CallRecord;
use crate::util::can_log;

/// Destination for call records
pub trait RecordSink: Send + Sync {
	/// Emit one record
	///
	/// Called after the genuine function returned. Failures to emit are the
	/// sink's own business and must never reach the intercepted caller.
	fn record(&self, record: &CallRecord<'_>);

	/// Get the name of the sink
	///
	/// This is used for debugging and logging purposes.
	fn name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}

/// Writes the `###` trace line to standard error
///
/// The line is formatted into one buffer first and written while holding the
/// process-wide stderr lock, so concurrent calls never interleave.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl StderrSink {
	#[must_use]
	pub const fn new() -> Self {
		Self
	}
}

impl RecordSink for StderrSink {
	fn record(&self, record: &CallRecord<'_>) {
		let line = record.to_line();
		let mut stderr = std::io::stderr().lock();
		let _ = stderr.write_all(&line);
	}

	fn name(&self) -> &'static str {
		"StderrSink"
	}
}

/// Emits each record as a structured `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
	#[must_use]
	pub const fn new() -> Self {
		Self
	}
}

impl RecordSink for TracingSink {
	fn record(&self, record: &CallRecord<'_>) {
		if !can_log() {
			return;
		}
		match *record {
			CallRecord::Fopen { path, mode, result } => {
				debug!(
					function = "fopen",
					path = ?path,
					mode = ?mode,
					result = ?result,
					"intercepted call"
				);
			},
			CallRecord::Open { path, flags, mode, result } => {
				debug!(
					function = "open",
					path = ?path,
					flags,
					mode = ?mode,
					result,
					"intercepted call"
				);
			},
			CallRecord::Close { fd, result } => {
				debug!(function = "close", fd, result, "intercepted call");
			},
		}
	}

	fn name(&self) -> &'static str {
		"TracingSink"
	}
}

impl<S: RecordSink + ?Sized> RecordSink for std::sync::Arc<S> {
	fn record(&self, record: &CallRecord<'_>) {
		(**self).record(record);
	}

	fn name(&self) -> &'static str {
		(**self).name()
	}
}
