//! Terminal capability detection
//!
//! Decides color and unicode output once per process so the display layer
//! and the logger agree on what to emit.

pub mod capabilities;

pub use capabilities::TerminalCapabilities;
