use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::PurgeAction;

/// An item the run could not finish handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub item_id: String,
    pub message: String,
}

/// Tally of one purge run. Only used for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub dry_run: bool,
    /// Items a decision was computed for.
    pub processed: usize,
    /// Deleted, or would have been deleted in a dry run.
    pub deleted: usize,
    pub skipped_keep_tag: usize,
    pub skipped_unfinished: usize,
    pub skipped_type_filter: usize,
    pub skipped_too_recent: usize,
    /// Items (or whole libraries) that could not be fetched.
    pub skipped_error: usize,
    pub delete_failed: usize,
    pub errors: Vec<ItemError>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run, ..Default::default() }
    }

    /// Count a computed decision. `Delete` is only counted once the deletion
    /// succeeds (or is simulated), see [`RunReport::record_deleted`].
    pub fn record_decision(&mut self, action: PurgeAction) {
        self.processed += 1;
        match action {
            PurgeAction::Delete => {}
            PurgeAction::SkipKeepTag => self.skipped_keep_tag += 1,
            PurgeAction::SkipUnfinished => self.skipped_unfinished += 1,
            PurgeAction::SkipTypeFilter => self.skipped_type_filter += 1,
            PurgeAction::SkipTooRecent => self.skipped_too_recent += 1,
        }
    }

    pub fn record_deleted(&mut self) { self.deleted += 1; }

    pub fn record_delete_failed(&mut self, item_id: &str, message: impl Into<String>) {
        self.delete_failed += 1;
        self.note(item_id, message);
    }

    pub fn record_fetch_error(&mut self, item_id: &str, message: impl Into<String>) {
        self.skipped_error += 1;
        self.note(item_id, message);
    }

    fn note(&mut self, item_id: &str, message: impl Into<String>) {
        self.errors.push(ItemError { item_id: item_id.to_string(), message: message.into() });
    }

    pub fn has_errors(&self) -> bool { !self.errors.is_empty() }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would delete" } else { "deleted" };
        write!(
            f,
            "{} processed, {} {}, {} failed, skipped: {} KEEP tag, {} unfinished, {} media type, {} too recent, {} fetch errors",
            self.processed,
            self.deleted,
            verb,
            self.delete_failed,
            self.skipped_keep_tag,
            self.skipped_unfinished,
            self.skipped_type_filter,
            self.skipped_too_recent,
            self.skipped_error,
        )
    }
}
