//! Tracer functionality
//!
//! The tracer sits between an exported hook and the genuine libc function:
//! it calls the real implementation, hands the call record to its sink and
//! returns the untouched result with `errno` preserved.

mod builder;
mod error;
mod sink;
mod stats;

pub use builder::{RESOLVE_ENV, STATS_ENV, TracerBuilder, TracerConfig};
pub use error::{Result, TracerError};
pub use sink::{RecordSink, StderrSink, TracingSink};
pub use stats::CallStats;

use libc::{FILE, c_char, c_int, c_uint, mode_t};
use nix::errno::Errno;
use once_cell::sync::OnceCell;

use crate::call::CallRecord;
use crate::ffi::{CloseFn, FopenFn, OpenFn};
use crate::util::HookGuard;
use stats::CallCounters;

static GLOBAL: OnceCell<Tracer> = OnceCell::new();

/// Records intercepted calls and forwards them to the genuine functions
pub struct Tracer {
	config: TracerConfig,
	sink: Box<dyn RecordSink>,
	counters: CallCounters,
}

impl std::fmt::Debug for Tracer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tracer")
			.field("config", &self.config)
			.field("sink", &self.sink.name())
			.field("stats", &self.stats())
			.finish()
	}
}

impl Tracer {
	pub(crate) fn new(config: TracerConfig, sink: Box<dyn RecordSink>) -> Self {
		Self {
			config,
			sink,
			counters: CallCounters::default(),
		}
	}

	/// Create a tracer from `FILEHOOK_*` environment variables
	///
	/// Invalid settings are reported and replaced by the defaults; the traced
	/// process must keep running either way.
	#[must_use]
	pub fn from_env() -> Self {
		let config = TracerConfig::from_env().unwrap_or_else(|e| {
			if crate::util::can_log() {
				tracing::warn!("{}, using defaults", e);
			}
			TracerConfig::default()
		});
		TracerBuilder::new().config(config).build()
	}

	#[must_use]
	pub const fn config(&self) -> &TracerConfig {
		&self.config
	}

	#[must_use]
	pub fn sink_name(&self) -> &'static str {
		self.sink.name()
	}

	/// Counts of the calls recorded so far
	#[must_use]
	pub fn stats(&self) -> CallStats {
		self.counters.snapshot()
	}

	/// Trace `fopen(path, mode)` through `real`
	///
	/// # Safety
	///
	/// Same contract as `fopen(3)`; `real` must be a genuine `fopen`.
	pub unsafe fn fopen(&self, real: FopenFn, path: *const c_char, mode: *const c_char) -> *mut FILE {
		let guard = HookGuard::enter();
		let result = unsafe { real(path, mode) };
		if guard.is_outermost() {
			let errno = Errno::last_raw();
			self.emit(&unsafe { CallRecord::fopen(path, mode, result) });
			Errno::set_raw(errno);
		}
		result
	}

	/// Trace `open(path, flags[, mode])` through `real`
	///
	/// `mode` is only read, and forwarded, when `flags` asks for a file to be
	/// created. Otherwise the caller never passed it and its value is garbage.
	///
	/// # Safety
	///
	/// Same contract as `open(2)`; `real` must be a genuine `open`.
	pub unsafe fn open(&self, real: OpenFn, path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
		let guard = HookGuard::enter();
		let mode = needs_mode(flags).then_some(mode);
		let result = match mode {
			Some(mode) => unsafe { real(path, flags, mode as c_uint) },
			None => unsafe { real(path, flags) },
		};
		if guard.is_outermost() {
			let errno = Errno::last_raw();
			self.emit(&unsafe { CallRecord::open(path, flags, mode, result) });
			Errno::set_raw(errno);
		}
		result
	}

	/// Trace `close(fd)` through `real`
	///
	/// # Safety
	///
	/// Same contract as `close(2)`; `real` must be a genuine `close`.
	pub unsafe fn close(&self, real: CloseFn, fd: c_int) -> c_int {
		let guard = HookGuard::enter();
		let result = unsafe { real(fd) };
		if guard.is_outermost() {
			let errno = Errno::last_raw();
			self.emit(&CallRecord::close(fd, result));
			Errno::set_raw(errno);
		}
		result
	}

	fn emit(&self, record: &CallRecord<'_>) {
		self.counters.increment(record.function(), record.failed());
		self.sink.record(record);
	}
}

/// Whether `open` flags carry the optional mode argument
#[must_use]
pub const fn needs_mode(flags: c_int) -> bool {
	flags & libc::O_CREAT != 0 || flags & libc::O_TMPFILE == libc::O_TMPFILE
}

/// The process-wide tracer used by the exported hooks
///
/// Created from the environment on first use.
pub fn global() -> &'static Tracer {
	GLOBAL.get_or_init(Tracer::from_env)
}

/// Install `tracer` as the process-wide tracer
///
/// Fails, handing the tracer back, if a global tracer already exists.
pub fn install(tracer: Tracer) -> std::result::Result<(), Tracer> {
	GLOBAL.set(tracer)
}
