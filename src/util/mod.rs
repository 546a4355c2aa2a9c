//! Utility modules for filehook
//!
//! This module contains utility functions and types used by filehook.

pub mod guard;
pub mod logging;

pub use guard::HookGuard;
pub use logging::{can_log, init_logging};
