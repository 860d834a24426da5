//! Common utilities for the SGA crates.
//!
//! This crate provides the binary primitives shared by the archive engine:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`text`] - Fixed-width NUL-padded ASCII and UTF-16LE fields

mod error;
mod reader;

pub mod text;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export memchr for NUL-terminator searches
pub use memchr;
