use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::decision::{FilterPolicy, PurgeAction};
use crate::error::{ApiError, PurgeError};
use crate::mapping::{item_from_summary, items_from_detail, FinishedSet};
use crate::report::RunReport;
use crate::server::MediaServer;
use crate::types::{Library, LibraryItem, LibraryItemSummary, MediaKind};

/// Purger owns the server handle and walks every library once per run.
pub struct Purger<S> {
    server: S,
    policy: FilterPolicy,
    dry_run: bool,
}

impl<S: MediaServer> Purger<S> {
    pub fn new(server: S, config: &Config) -> Self {
        Self { server, policy: FilterPolicy::from_config(config), dry_run: config.dry_run }
    }

    pub fn with_policy(server: S, policy: FilterPolicy, dry_run: bool) -> Self {
        Self { server, policy, dry_run }
    }

    pub fn server(&self) -> &S { &self.server }

    pub async fn run(&self) -> Result<RunReport, PurgeError> { self.run_at(Utc::now()).await }

    /// Single pass over all libraries, judging item age against `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport, PurgeError> {
        if self.dry_run {
            info!("DRY RUN MODE - no media will actually be deleted");
        }
        info!(scope = %self.policy.scope, "fetching user progress");
        let user = self.server.me().await.map_err(PurgeError::fatal)?;
        let finished = FinishedSet::from_progress(&user.media_progress);
        info!(
            user = user.username.as_deref().unwrap_or("?"),
            episodes = finished.episodes.len(),
            audiobooks = finished.audiobooks.len(),
            "finished media in progress data"
        );

        let libraries = self.server.libraries().await.map_err(PurgeError::fatal)?;
        let mut report = RunReport::new(self.dry_run);
        for library in &libraries {
            self.scan_library(library, &finished, now, &mut report).await?;
        }

        info!(%report, "cleanup complete");
        if self.dry_run {
            info!("(DRY RUN - no actual deletions were performed)");
        }
        Ok(report)
    }

    async fn scan_library(
        &self,
        library: &Library,
        finished: &FinishedSet,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<(), PurgeError> {
        let Some(kind) = MediaKind::from_library_media_type(&library.media_type) else {
            debug!(library = %library.name, media_type = %library.media_type, "ignoring library");
            return Ok(());
        };

        let summaries = match self.server.library_items(&library.id).await {
            Ok(items) => items,
            Err(e) => {
                let e = skippable(e)?;
                warn!(library = %library.name, error = %e, "failed to list library items");
                report.record_fetch_error(&library.id, e.to_string());
                return Ok(());
            }
        };

        if !self.policy.scope.includes(kind) {
            debug!(library = %library.name, items = summaries.len(), "library outside media type filter");
            for summary in &summaries {
                let item = item_from_summary(summary, kind, finished);
                report.record_decision(self.policy.decide(&item, now).action);
            }
            return Ok(());
        }

        info!(library = %library.name, items = summaries.len(), "scanning {} library", kind.label());
        for summary in &summaries {
            self.process_entry(summary, kind, finished, now, report).await?;
        }
        Ok(())
    }

    async fn process_entry(
        &self,
        summary: &LibraryItemSummary,
        kind: MediaKind,
        finished: &FinishedSet,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<(), PurgeError> {
        let detail = match self.server.library_item(&summary.id).await {
            Ok(d) => d,
            Err(e) => {
                let e = skippable(e)?;
                warn!(item = %summary.id, error = %e, "failed to fetch item details");
                report.record_fetch_error(&summary.id, e.to_string());
                return Ok(());
            }
        };

        let items = items_from_detail(&detail, kind, finished);
        debug!(item = %detail.id, candidates = items.len(), "fetched item");
        for item in &items {
            let decision = self.policy.decide(item, now);
            report.record_decision(decision.action);
            match decision.action {
                PurgeAction::Delete => self.purge(item, report).await?,
                PurgeAction::SkipKeepTag => debug!(item = %item.id, "skipping '{}' - has KEEP tag", item.display_name()),
                PurgeAction::SkipTooRecent => debug!(item = %item.id, "skipping '{}' - too recent", item.display_name()),
                _ => {}
            }
        }
        Ok(())
    }

    async fn purge(&self, item: &LibraryItem, report: &mut RunReport) -> Result<(), PurgeError> {
        if self.dry_run {
            info!(item = %item.id, "[DRY RUN] Would delete: {}", item.display_name());
            report.record_deleted();
            return Ok(());
        }

        info!(item = %item.id, "Deleting: {}", item.display_name());
        let result = match item.kind {
            MediaKind::PodcastEpisode => self.server.delete_episode(&item.library_item_id, &item.id).await,
            MediaKind::Audiobook => self.server.delete_library_item(&item.library_item_id).await,
        };
        match result {
            Ok(()) => {
                report.record_deleted();
                debug!(item = %item.id, "deleted");
            }
            Err(e) => {
                let e = skippable(e)?;
                error!(item = %item.id, error = %e, "failed to delete {}", item.display_name());
                report.record_delete_failed(&item.id, e.to_string());
            }
        }
        Ok(())
    }
}

/// Per-item failures are recorded and skipped; authentication failures end the run.
fn skippable(err: ApiError) -> Result<ApiError, PurgeError> {
    if err.is_auth_failure() { Err(PurgeError::Auth(err)) } else { Ok(err) }
}
