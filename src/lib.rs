//! dotmate - Dotfile Mirroring
//!
//! dotmate keeps a managed copy of the configuration directories you care
//! about. Each tracked directory is mirrored into one destination folder, and
//! every refresh reconciles the mirror: new and changed files are copied,
//! unchanged files are left alone, files removed from the source are pruned.
//!
//! ## Modules
//!
//! - [`config`]: Settings file loading and location
//! - [`registry`]: Persistent record of tracked paths
//! - [`validate`]: Source path checks
//! - [`copy`]: Single-file copy primitive
//! - [`mirror`]: Tree reconciliation
//! - [`sync`]: Engine entry points used by the CLI and TUI
//! - [`tree`]: Directory tree model for display
//! - [`tui`]: Terminal user interface

pub mod config;
pub mod copy;
pub mod error;
pub mod mirror;
pub mod registry;
pub mod sync;
pub mod tree;
pub mod tui;
pub mod validate;

pub use config::Config;
pub use error::{Error, Result};
pub use mirror::{sync_dir, SyncReport};
pub use registry::Registry;
pub use sync::{RefreshSummary, SyncEngine};
pub use tree::{build_tree, visible_nodes, TreeCursor, TreeNode};
