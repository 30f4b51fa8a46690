//! downtidy - keeps a downloads folder sorted
//!
//! This library classifies files by extension, moves them into per-category
//! subfolders of a root directory with collision-free names, and watches the
//! root so new arrivals are sorted as they appear.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod settle;
pub mod watcher;

pub use config::{ConfigError, Settings, WatchMode};
pub use file_category::{Category, CategoryTable};
pub use file_organizer::{MoveOutcome, OrganizeError, Organizer, SweepReport};
pub use settle::SettlePolicy;
pub use watcher::{CreatedEvent, FolderWatcher};

pub use cli::{Cli, run_cli};
