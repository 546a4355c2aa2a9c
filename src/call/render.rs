//! Text rendering of call records
//!
//! The `###` line format is what downstream tooling greps for, so it must
//! stay byte-for-byte stable:
//!
//! ```text
//! ### fopen( /tmp/test.txt, w) = 0x55d0c1b2a2a0
//! ### open( /tmp/test.txt, 577, 0644) = 3
//! ### close(3) = 0
//! ```

use std::ffi::CStr;
use std::io::{self, Write};

use crate::call::CallRecord;

/// Prefix of every trace line
pub const LINE_PREFIX: &str = "### ";

impl CallRecord<'_> {
	/// Write the trace line, including the trailing newline
	pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
		out.write_all(LINE_PREFIX.as_bytes())?;
		match *self {
			Self::Fopen { path, mode, result } => {
				out.write_all(b"fopen( ")?;
				write_cstr(out, path)?;
				out.write_all(b", ")?;
				write_cstr(out, mode)?;
				out.write_all(b") = ")?;
				if result.is_null() {
					out.write_all(b"(nil)")?;
				} else {
					write!(out, "{:p}", result)?;
				}
			},
			Self::Open { path, flags, mode, result } => {
				out.write_all(b"open( ")?;
				write_cstr(out, path)?;
				write!(out, ", {}", flags)?;
				match mode {
					Some(0) => out.write_all(b", 0")?,
					Some(mode) => write!(out, ", 0{:o}", mode)?,
					None => {},
				}
				write!(out, ") = {}", result)?;
			},
			Self::Close { fd, result } => {
				write!(out, "close({}) = {}", fd, result)?;
			},
		}
		out.write_all(b"\n")
	}

	/// The trace line as bytes
	///
	/// Paths are not required to be UTF-8, so the line is kept as raw bytes.
	#[must_use]
	pub fn to_line(&self) -> Vec<u8> {
		let mut line = Vec::with_capacity(128);
		// Writing into a Vec cannot fail.
		let _ = self.write_line(&mut line);
		line
	}
}

fn write_cstr<W: Write + ?Sized>(out: &mut W, s: Option<&CStr>) -> io::Result<()> {
	match s {
		Some(s) => out.write_all(s.to_bytes()),
		None => out.write_all(b"(null)"),
	}
}
