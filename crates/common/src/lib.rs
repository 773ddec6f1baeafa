//! Shared types and error definitions used across all courier crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
