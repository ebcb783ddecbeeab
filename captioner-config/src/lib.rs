//! Configuration management for the captioner service.
//!
//! Provides environment detection, configuration loading from YAML files
//! with environment variable overrides, secret handling, and shared
//! configuration types.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
