//! Host-side drivers for Intcode programs
//!
//! The VM knows nothing about how its inputs and outputs are interpreted;
//! this crate collects the conventions used by programs that run on it:
//! chained amplifiers, patched-input searches, interactive consoles, and
//! ASCII text.
#![warn(missing_docs)]

pub mod amplifier;
pub mod ascii;
pub mod console;
pub mod search;

pub use console::{worker as console_worker, Console};
