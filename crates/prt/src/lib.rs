//! # PRT - P runtime support
//!
//! Routines that assembly generated by `pcc` calls for I/O. Each program
//! links against this library (built as a static library) and calls the
//! C ABI entry points by name:
//!
//! - `printInt(a0)` - integers and booleans
//! - `printReal(fa0)` - single precision reals
//! - `printString(a0)` - NUL terminated strings
//! - `readInt() -> a0`, `readReal() -> fa0`
//!
//! ## Modules
//!
//! - [`format`] - how values are rendered, shared with the compiler's tests
//! - [`io`] - the C ABI entry points

pub mod format;
pub mod io;

pub use format::{format_int, format_real, parse_int, parse_real};

/// Runtime version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
