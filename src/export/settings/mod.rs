//! Configuration structures for export runs.
//!
//! Operator input arrives from the command line and an optional TOML file;
//! [`SettingsBuilder`] layers both into a validated [`ExportSettings`].

mod builder;
mod core;
mod file;
mod method;

pub use builder::SettingsBuilder;
pub use core::ExportSettings;
pub use file::SettingsFile;
pub use method::{DistributionMethod, ExportProduct, MethodSelection};
