//! Per-item purge rules.
//!
//! Each item is judged on its own, so the order items arrive in never changes
//! an outcome. Rules are checked in a fixed order and the first match wins:
//! media-type scope, `KEEP` tag, finished flag, then the optional minimum age.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::age::MinAge;
use crate::config::{Config, MediaTypeFilter};
use crate::types::LibraryItem;

/// Exact, case-sensitive tag that protects a show or audiobook.
pub const KEEP_TAG: &str = "KEEP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeAction {
    Delete,
    SkipKeepTag,
    SkipUnfinished,
    SkipTypeFilter,
    SkipTooRecent,
}

impl fmt::Display for PurgeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Delete => "delete",
            Self::SkipKeepTag => "skip (KEEP tag)",
            Self::SkipUnfinished => "skip (unfinished)",
            Self::SkipTypeFilter => "skip (media type)",
            Self::SkipTooRecent => "skip (too recent)",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeDecision {
    pub item_id: String,
    pub action: PurgeAction,
}

/// The config subset the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterPolicy {
    pub scope: MediaTypeFilter,
    pub min_age: Option<MinAge>,
}

impl FilterPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self { scope: config.media_type_filter, min_age: config.min_age }
    }

    pub fn decide(&self, item: &LibraryItem, now: DateTime<Utc>) -> PurgeDecision {
        PurgeDecision { item_id: item.id.clone(), action: self.action_for(item, now) }
    }

    fn action_for(&self, item: &LibraryItem, now: DateTime<Utc>) -> PurgeAction {
        if !self.scope.includes(item.kind) {
            return PurgeAction::SkipTypeFilter;
        }
        if item.tags.contains(KEEP_TAG) {
            return PurgeAction::SkipKeepTag;
        }
        if !item.finished {
            return PurgeAction::SkipUnfinished;
        }
        match self.min_age {
            Some(min) if !min.is_satisfied_by(item.added_at, now) => PurgeAction::SkipTooRecent,
            _ => PurgeAction::Delete,
        }
    }
}
