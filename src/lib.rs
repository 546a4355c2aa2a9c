//! filehook - A symbol interposition layer for file I/O tracing
//!
//! Loaded ahead of the C library (`LD_PRELOAD`), the `filehook-preload`
//! library replaces `fopen`, `open` and `close`. Each replacement asks the
//! dynamic loader for the next definition of its own name, calls it, writes
//! one trace line and hands back the genuine result.
//!
//! ```text
//! $ LD_PRELOAD=target/release/libfilehook_preload.so ./app
//! ### fopen( /tmp/test.txt, w) = 0x55d0c1b2a2a0
//! ### open( /etc/hosts, 524288) = 3
//! ### close(3) = 0
//! ```
//!
//! This crate holds everything but the exported symbols, so it can be used
//! and tested in-process:
//!
//! ```rust
//! use filehook::{CallRecord, RecordSink};
//!
//! struct Count(std::sync::atomic::AtomicUsize);
//!
//! impl RecordSink for Count {
//!     fn record(&self, _record: &CallRecord<'_>) {
//!         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!     }
//! }
//!
//! let tracer = filehook::new().sink(Count(Default::default())).build();
//! let status = unsafe { tracer.close(libc::close, -1) };
//! assert_eq!(status, -1);
//! assert_eq!(tracer.stats().total(), 1);
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("filehook relies on the ELF dynamic loader and only supports Linux");

pub mod call;
pub mod ffi;
pub mod tracer;
pub mod util;

pub use filehook_macros::interpose;

pub use call::{CallRecord, Function};
pub use ffi::{CloseFn, FopenFn, OpenFn, RealSymbol, Resolution};
pub use tracer::{CallStats, RecordSink, StderrSink, Tracer, TracerBuilder, TracerConfig, TracerError, TracingSink};
pub use tracer::{global, install};

/// Create a new tracer builder
#[must_use]
pub fn new() -> TracerBuilder {
	TracerBuilder::new()
}
