//! Types describing a single intercepted call

use libc::{FILE, c_char, c_int, mode_t};
use std::ffi::CStr;

/// The functions this layer interposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
	Fopen,
	Open,
	Close,
}

impl Function {
	pub const ALL: [Self; 3] = [Self::Fopen, Self::Open, Self::Close];

	/// The C symbol name
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::Fopen => "fopen",
			Self::Open => "open",
			Self::Close => "close",
		}
	}

	pub(crate) const fn index(self) -> usize {
		self as usize
	}
}

impl std::fmt::Display for Function {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// Arguments and result of one intercepted call
///
/// Records borrow the caller's strings and live only as long as the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRecord<'a> {
	Fopen {
		path: Option<&'a CStr>,
		mode: Option<&'a CStr>,
		result: *const FILE,
	},
	Open {
		path: Option<&'a CStr>,
		flags: c_int,
		/// Present only when the mode argument was forwarded
		mode: Option<mode_t>,
		result: c_int,
	},
	Close {
		fd: c_int,
		result: c_int,
	},
}

impl<'a> CallRecord<'a> {
	/// Build an `fopen` record from raw C arguments
	///
	/// # Safety
	///
	/// Non-null `path` and `mode` must point to nul-terminated strings that
	/// outlive the record.
	#[must_use]
	pub unsafe fn fopen(path: *const c_char, mode: *const c_char, result: *const FILE) -> Self {
		Self::Fopen {
			path: unsafe { opt_cstr(path) },
			mode: unsafe { opt_cstr(mode) },
			result,
		}
	}

	/// Build an `open` record from raw C arguments
	///
	/// # Safety
	///
	/// A non-null `path` must point to a nul-terminated string that outlives
	/// the record.
	#[must_use]
	pub unsafe fn open(path: *const c_char, flags: c_int, mode: Option<mode_t>, result: c_int) -> Self {
		Self::Open {
			path: unsafe { opt_cstr(path) },
			flags,
			mode,
			result,
		}
	}

	#[must_use]
	pub const fn close(fd: c_int, result: c_int) -> Self {
		Self::Close { fd, result }
	}

	#[must_use]
	pub const fn function(&self) -> Function {
		match self {
			Self::Fopen { .. } => Function::Fopen,
			Self::Open { .. } => Function::Open,
			Self::Close { .. } => Function::Close,
		}
	}

	/// Whether the genuine call reported failure through its return value
	#[must_use]
	pub fn failed(&self) -> bool {
		match *self {
			Self::Fopen { result, .. } => result.is_null(),
			Self::Open { result, .. } | Self::Close { result, .. } => result < 0,
		}
	}
}

unsafe fn opt_cstr<'a>(p: *const c_char) -> Option<&'a CStr> {
	if p.is_null() { None } else { Some(unsafe { CStr::from_ptr(p) }) }
}
