//! Flash chip types and registry
//!
//! This module provides the descriptor type for supported flash chips and
//! the static table they are looked up in.

mod registry;
mod types;

pub use registry::*;
pub use types::*;
