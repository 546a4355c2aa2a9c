//! Genuine libc entry points
//!
//! Signatures of the interposed functions and the `RealSymbol` cache used to
//! find the next definition of a name in the loader's search order.

use libc::{FILE, c_char, c_int, c_void};
use std::ffi::CStr;
use std::io::Write;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, Ordering};
use tracing::{debug, error};

use crate::tracer::{Result, TracerError};
use crate::util::can_log;

/// `FILE *fopen(const char *path, const char *mode)`
pub type FopenFn = unsafe extern "C" fn(path: *const c_char, mode: *const c_char) -> *mut FILE;

/// `int open(const char *path, int flags, ...)`
pub type OpenFn = unsafe extern "C" fn(path: *const c_char, flags: c_int, ...) -> c_int;

/// `int close(int fd)`
pub type CloseFn = unsafe extern "C" fn(fd: c_int) -> c_int;

/// How often a hook asks the loader for the genuine implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
	/// Look the symbol up once and reuse the address for the process lifetime
	#[default]
	Cached,
	/// Look the symbol up on every call
	PerCall,
}

/// Lazily resolved address of the next definition of a symbol
///
/// The cache is written without a lock. Every resolution of the same name
/// yields the same address, so a racing second store is a no-op.
pub struct RealSymbol {
	ptr: AtomicPtr<c_void>,
	name: &'static CStr,
}

impl RealSymbol {
	#[must_use]
	pub const fn new(name: &'static CStr) -> Self {
		Self {
			ptr: AtomicPtr::new(std::ptr::null_mut()),
			name,
		}
	}

	/// The symbol name, without the trailing nul
	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name.to_str().unwrap_or("<non-utf8>")
	}

	/// Address stored by an earlier resolution, if any
	#[must_use]
	pub fn cached(&self) -> Option<NonNull<c_void>> {
		NonNull::new(self.ptr.load(Ordering::Acquire))
	}

	/// Resolve the genuine implementation according to `policy`
	pub fn resolve(&self, policy: Resolution) -> Result<NonNull<c_void>> {
		if policy == Resolution::Cached {
			if let Some(p) = self.cached() {
				return Ok(p);
			}
		}

		let p = lookup_next(self.name)?;
		if self.ptr.swap(p.as_ptr(), Ordering::AcqRel).is_null() && can_log() {
			debug!("resolved real {} at {:p}", self.name(), p);
		}
		Ok(p)
	}

	/// Resolve and reinterpret the address as the function pointer type `F`
	///
	/// # Safety
	///
	/// `F` must be a function pointer type matching the C signature of the
	/// symbol.
	pub unsafe fn resolve_as<F: Copy>(&self, policy: Resolution) -> Result<F> {
		const { assert!(std::mem::size_of::<F>() == std::mem::size_of::<*mut c_void>()) };
		let p = self.resolve(policy)?;
		Ok(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&p.as_ptr()) })
	}
}

impl std::fmt::Debug for RealSymbol {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RealSymbol")
			.field("name", &self.name)
			.field("ptr", &self.ptr.load(Ordering::Relaxed))
			.finish()
	}
}

/// `dlsym(RTLD_NEXT, name)`, with the `dlerror()` text on failure
fn lookup_next(name: &CStr) -> Result<NonNull<c_void>> {
	unsafe {
		// Clear any stale error so a null result can be told apart.
		libc::dlerror();
		let p = libc::dlsym(libc::RTLD_NEXT, name.as_ptr());
		if let Some(p) = NonNull::new(p) {
			return Ok(p);
		}

		let err = libc::dlerror();
		let reason = if err.is_null() {
			"symbol resolved to a null address".to_string()
		} else {
			CStr::from_ptr(err).to_string_lossy().into_owned()
		};

		Err(TracerError::SymbolNotFound {
			symbol: name.to_string_lossy().into_owned(),
			reason,
		})
	}
}

/// Resolve a hook's target through the global tracer's policy, or abort
///
/// A hook without its genuine implementation cannot do anything useful, so
/// an unresolvable symbol ends the process.
///
/// # Safety
///
/// Same contract as [`RealSymbol::resolve_as`].
#[doc(hidden)]
pub unsafe fn resolve_or_abort<F: Copy>(symbol: &RealSymbol) -> F {
	let policy = crate::global().config().resolution;
	match unsafe { symbol.resolve_as::<F>(policy) } {
		Ok(f) => f,
		Err(e) => {
			if can_log() {
				error!("{}", e);
			} else {
				let _ = writeln!(std::io::stderr(), "filehook: {}", e);
			}
			std::process::abort();
		},
	}
}
