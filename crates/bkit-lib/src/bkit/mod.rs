pub mod bump;
pub mod config;
pub mod externals;
pub mod fsutil;
pub mod ignore;
pub mod manifest;
pub mod materialize;
pub mod package;
pub mod registry;
pub mod scaffold;
pub mod sync;
pub mod templates;
pub mod validate;
pub mod walk;
pub mod watch;

// Re-export main types for convenience
pub use config::{CONFIG_FILE, Project, ProjectConfig};
pub use externals::Toolchain;
pub use manifest::Manifest;
pub use materialize::{Materializer, PackOutcome, Strategy};
pub use sync::{ResolvedTarget, SyncEntry, SyncMode};

// Re-export primitives types for convenience
pub use crate::primitives::{BumpLevel, PackKind, Product, ScriptLanguage, VersionTuple};
