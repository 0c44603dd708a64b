//! Cleanup of finished podcast episodes and audiobooks on an Audiobookshelf server.
//!
//! A run reads its [`Config`] from the environment, asks the server which
//! items the user has finished, and deletes them unless the owning show or
//! book is tagged `KEEP`. See [`Purger::run`].

pub mod age;
pub mod cli;
pub mod client;
pub mod config;
pub mod decision;
pub mod error;
pub mod mapping;
pub mod purger;
pub mod report;
pub mod server;
pub mod types;

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::client::AbsClient;
    pub use crate::config::{Config, MediaTypeFilter};
    pub use crate::decision::{FilterPolicy, PurgeAction, PurgeDecision};
    pub use crate::error::{ApiError, ConfigError, PurgeError};
    pub use crate::purger::Purger;
    pub use crate::report::RunReport;
    pub use crate::server::MediaServer;
    pub use crate::types::{LibraryItem, MediaKind};
}

pub use client::AbsClient;
pub use config::Config;
pub use purger::Purger;
pub use report::RunReport;
