//! Preload library for filehook
//!
//! Injected with `LD_PRELOAD`, this library's `fopen`, `open` and `close`
//! are found before the C library's. Each one forwards to the genuine
//! function and writes a `###` trace line to stderr.

use filehook::{CloseFn, FopenFn, OpenFn, Tracer, interpose};
use libc::{FILE, c_char, c_int, mode_t};
use tracing::debug;

#[unsafe(link_section = ".init_array")]
#[used]
static CONSTRUCTOR: extern "C" fn() = on_load;

extern "C" fn on_load() {
	filehook::util::init_logging();

	let tracer = Tracer::from_env();
	debug!(
		"filehook loaded into pid {}: {:?}",
		std::process::id(),
		tracer.config()
	);
	// A hook may already have run from another library's constructor.
	if filehook::install(tracer).is_err() {
		debug!("tracer was created before the load constructor ran");
	}

	if filehook::global().config().print_stats {
		unsafe {
			libc::atexit(print_stats_at_exit);
		}
	}
}

// Runs after the main thread's thread-local destructors, where `tracing`
// can no longer format events, so the summary goes straight to stderr.
extern "C" fn print_stats_at_exit() {
	let stats = filehook::global().stats();
	let _ = stats.write_summary(&mut std::io::stderr().lock(), std::process::id());
}

/// `FILE *fopen(const char *path, const char *mode)`
#[interpose]
pub fn fopen(real: FopenFn, path: *const c_char, mode: *const c_char) -> *mut FILE {
	unsafe { filehook::global().fopen(real, path, mode) }
}

/// `int open(const char *path, int flags, ...)`
///
/// The optional mode is declared as a third parameter: on the Linux C ABIs
/// a variadic integer arrives in the same register as a named one. It is
/// only read when `flags` requests creation.
#[interpose]
pub fn open(real: OpenFn, path: *const c_char, flags: c_int, mode: mode_t) -> c_int {
	unsafe { filehook::global().open(real, path, flags, mode) }
}

/// `int close(int fd)`
#[interpose]
pub fn close(real: CloseFn, fd: c_int) -> c_int {
	unsafe { filehook::global().close(real, fd) }
}
