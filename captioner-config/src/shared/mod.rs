//! Configuration types shared across services and binaries.

mod retry;

pub use retry::*;
