//! Re-entrancy guard
//!
//! The layer's own runtime may call an interposed symbol while a hook is
//! running (the standard library closing a descriptor, for instance). Such
//! nested calls are forwarded without being recorded.

use std::cell::Cell;

thread_local! {
	static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as being inside a hook for its lifetime
#[derive(Debug)]
pub struct HookGuard {
	outermost: bool,
	entered: bool,
}

impl HookGuard {
	/// Enter a hook on the current thread
	#[must_use]
	pub fn enter() -> Self {
		// Thread-local storage is gone while the thread is being torn down;
		// calls made then are treated as nested.
		match DEPTH.try_with(|depth| {
			let d = depth.get();
			depth.set(d.saturating_add(1));
			d
		}) {
			Ok(d) => Self {
				outermost: d == 0,
				entered: true,
			},
			Err(_) => Self {
				outermost: false,
				entered: false,
			},
		}
	}

	/// Whether this is the outermost hook on the thread
	#[must_use]
	pub const fn is_outermost(&self) -> bool {
		self.outermost
	}
}

impl Drop for HookGuard {
	fn drop(&mut self) {
		if self.entered {
			let _ = DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
		}
	}
}
