//! CLI command implementations
//!
//! Each command is implemented in its own module.

pub mod commit;
pub mod info;
pub mod sync;
