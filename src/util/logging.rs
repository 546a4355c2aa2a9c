//! Diagnostic logging for filehook
//!
//! These are the layer's own diagnostics, separate from the `###` trace
//! lines. They always go to stderr so the traced program's stdout is left
//! untouched.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable raising the diagnostic level to `debug`
pub const DEBUG_ENV: &str = "FILEHOOK_DEBUG";

static INIT: Once = Once::new();

struct Alive;

impl Drop for Alive {
	fn drop(&mut self) {}
}

thread_local! {
	static ALIVE: Alive = const { Alive };
}

/// Whether `tracing` events can still be emitted on the current thread
///
/// The fmt layer formats into a thread-local buffer, and touching it after
/// the thread's thread-local destructors ran panics. On the main thread
/// those destructors run before `atexit` handlers, so hooks called from
/// such handlers must stay silent.
pub fn can_log() -> bool {
	// First touched before any event on the thread, so it is registered ahead
	// of the fmt layer's buffer.
	ALIVE.try_with(|_| ()).is_ok()
}

/// Initialize the tracing system
///
/// This function sets up tracing with an `EnvFilter` that:
/// - Honors the `RUST_LOG` environment variable if set
/// - Uses the `FILEHOOK_DEBUG` environment variable to control logging level
/// - Only logs warnings and errors by default
pub fn init_logging() {
	if !can_log() {
		return;
	}

	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| default_filter(std::env::var_os(DEBUG_ENV).is_some()));

		// A subscriber installed by someone else in this image wins.
		let _ = tracing_subscriber::registry()
			.with(fmt::layer().with_target(true).with_writer(std::io::stderr))
			.with(filter)
			.try_init();
	});
}

fn default_filter(debug: bool) -> EnvFilter {
	if debug {
		EnvFilter::new("filehook=debug,filehook_preload=debug")
	} else {
		EnvFilter::new("filehook=warn,filehook_preload=warn")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::cell::Cell;
	use std::sync::mpsc::{self, Sender};

	#[test]
	fn init_is_idempotent() {
		init_logging();
		init_logging();
	}

	struct ReportOnDrop(Cell<Option<Sender<bool>>>);

	impl Drop for ReportOnDrop {
		fn drop(&mut self) {
			if let Some(tx) = self.0.take() {
				let _ = tx.send(can_log());
			}
		}
	}

	thread_local! {
		static REPORT: ReportOnDrop = const { ReportOnDrop(Cell::new(None)) };
	}

	#[test]
	fn logging_stops_once_thread_teardown_started() {
		let (tx, rx) = mpsc::channel();
		std::thread::spawn(move || {
			// Registered before the sentinel, so destroyed after it.
			REPORT.with(|r| r.0.set(Some(tx)));
			assert!(can_log());
		})
		.join()
		.unwrap();
		assert!(!rx.recv().unwrap());
	}
}
