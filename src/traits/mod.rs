//! Core traits for resource cleanup.

mod dispose;

pub use dispose::{AsyncDispose, Dispose};
