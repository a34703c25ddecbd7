//! Test fixtures for bkit
//!
//! Real temp directories with automatic cleanup; available to other crates
//! through the `test-utils` feature.

pub mod filesystem;

pub use filesystem::{ProjectFixture, TempDirFixture};
