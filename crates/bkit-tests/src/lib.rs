pub mod fixtures;
pub mod test_env;

// Re-export key testing utilities
pub use fixtures::{archive_entries, write_pack_content};
pub use test_env::{HermeticSession, HermeticSessionBuilder, MockBehavior, TestEnvironment};
