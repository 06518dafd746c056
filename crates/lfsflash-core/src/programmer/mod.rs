//! Bus master traits
//!
//! This module defines the trait a serial bus implementation must provide
//! for the driver to talk to a flash chip.

mod traits;

pub use traits::*;
