//! Call statistics

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::call::Function;

/// Lock-free per-function counters
#[derive(Debug, Default)]
pub(crate) struct CallCounters {
	calls: [AtomicUsize; 3],
	failures: [AtomicUsize; 3],
}

impl CallCounters {
	pub(crate) fn increment(&self, function: Function, failed: bool) {
		self.calls[function.index()].fetch_add(1, Ordering::Relaxed);
		if failed {
			self.failures[function.index()].fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn snapshot(&self) -> CallStats {
		let load = |counters: &[AtomicUsize; 3]| counters.each_ref().map(|c| c.load(Ordering::Relaxed));
		CallStats {
			calls: load(&self.calls),
			failures: load(&self.failures),
		}
	}
}

/// Statistics about intercepted calls
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
	calls: [usize; 3],
	failures: [usize; 3],
}

impl CallStats {
	/// Number of recorded calls to `function`
	#[must_use]
	pub const fn calls(&self, function: Function) -> usize {
		self.calls[function.index()]
	}

	/// Number of recorded calls to `function` whose result signalled failure
	#[must_use]
	pub const fn failures(&self, function: Function) -> usize {
		self.failures[function.index()]
	}

	/// Total number of recorded calls
	#[must_use]
	pub fn total(&self) -> usize {
		self.calls.iter().sum()
	}

	/// Write the one-line exit summary for process `pid`
	///
	/// The line is built before the single write, like a trace line.
	pub fn write_summary<W: Write>(&self, out: &mut W, pid: u32) -> io::Result<()> {
		let line = format!("filehook: calls in pid {}: {}\n", pid, self);
		out.write_all(line.as_bytes())
	}
}

impl std::fmt::Display for CallStats {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (i, function) in Function::ALL.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}: {} ({} failed)", function, self.calls(*function), self.failures(*function))?;
		}
		Ok(())
	}
}
