#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Local state for the Tor Browser launcher
//!
//! This crate resolves where the launcher keeps its files and manages what
//! lives there:
//! - Directory layout from `HOME` and the XDG base directories
//! - One-time consolidation of legacy localized installs
//! - The merged mirror list
//! - `settings.json`, including migration from the legacy pickle format
//! - Network timeouts (environment overrides)

pub mod constants;
pub mod layout;
pub mod migrate;
pub mod mirrors;
pub mod network;
pub mod settings;

pub use layout::{
    Architecture, ArtifactPaths, BaseDirs, DirectoryIssue, Layout, PathResolver, SigningKeyPaths,
    TbbPaths,
};
pub use migrate::{migrate_legacy_install, MigrationReport};
pub use mirrors::MirrorList;
pub use network::NetworkConfig;
pub use settings::{Settings, SettingsStore};
