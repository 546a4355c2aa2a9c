//! Intercepted call records
//!
//! This module contains the record produced for every intercepted call and
//! its textual rendering.

mod render;
mod types;

pub use render::LINE_PREFIX;
pub use types::{CallRecord, Function};
