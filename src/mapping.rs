use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};

use crate::types::{LibraryItem, LibraryItemDetail, LibraryItemSummary, MediaKind, MediaProgress};

/// Ids the user has finished, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishedSet {
    pub episodes: HashSet<String>,
    pub audiobooks: HashSet<String>,
}

impl FinishedSet {
    /// Progress rows with an `episodeId` belong to podcast episodes; rows with only a
    /// `libraryItemId` belong to books.
    pub fn from_progress(progress: &[MediaProgress]) -> Self {
        let mut set = Self::default();
        for p in progress.iter().filter(|p| p.is_finished) {
            match (&p.episode_id, &p.library_item_id) {
                (Some(ep), _) if !ep.is_empty() => { set.episodes.insert(ep.clone()); }
                (_, Some(li)) if !li.is_empty() => { set.audiobooks.insert(li.clone()); }
                _ => {}
            }
        }
        set
    }

    pub fn contains(&self, kind: MediaKind, id: &str) -> bool {
        match kind {
            MediaKind::PodcastEpisode => self.episodes.contains(id),
            MediaKind::Audiobook => self.audiobooks.contains(id),
        }
    }
}

fn millis_to_utc(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.filter(|ms| *ms > 0).and_then(DateTime::<Utc>::from_timestamp_millis)
}

fn tag_set(tags: &[String]) -> BTreeSet<String> {
    tags.iter().cloned().collect()
}

/// Expand a fetched library item into purge candidates: one per episode for a
/// podcast (each carrying the show's tags), one for an audiobook.
pub fn items_from_detail(detail: &LibraryItemDetail, kind: MediaKind, finished: &FinishedSet) -> Vec<LibraryItem> {
    let tags = tag_set(&detail.media.tags);
    let meta = &detail.media.metadata;
    match kind {
        MediaKind::PodcastEpisode => {
            let show = meta.title.clone().unwrap_or_else(|| "Unknown Podcast".to_string());
            detail
                .media
                .episodes
                .iter()
                .filter_map(|ep| {
                    let id = ep.id.as_deref().filter(|id| !id.is_empty())?;
                    Some(LibraryItem {
                        id: id.to_string(),
                        library_item_id: detail.id.clone(),
                        kind,
                        title: ep.title.clone().unwrap_or_else(|| "Unknown Episode".to_string()),
                        parent_title: show.clone(),
                        tags: tags.clone(),
                        finished: finished.contains(kind, id),
                        added_at: millis_to_utc(ep.added_at),
                    })
                })
                .collect()
        }
        MediaKind::Audiobook => vec![LibraryItem {
            id: detail.id.clone(),
            library_item_id: detail.id.clone(),
            kind,
            title: meta.title.clone().unwrap_or_else(|| "Unknown Audiobook".to_string()),
            parent_title: meta.author_name.clone().unwrap_or_else(|| "Unknown Author".to_string()),
            tags,
            finished: finished.contains(kind, &detail.id),
            added_at: millis_to_utc(detail.added_at),
        }],
    }
}

/// Candidate built from a listing entry alone, for items that are decided
/// without a detail fetch. A podcast show stands in for its episodes.
pub fn item_from_summary(summary: &LibraryItemSummary, kind: MediaKind, finished: &FinishedSet) -> LibraryItem {
    let meta = &summary.media.metadata;
    LibraryItem {
        id: summary.id.clone(),
        library_item_id: summary.id.clone(),
        kind,
        title: meta.title.clone().unwrap_or_default(),
        parent_title: meta.author_name.clone().unwrap_or_default(),
        tags: tag_set(&summary.media.tags),
        finished: finished.contains(kind, &summary.id),
        added_at: None,
    }
}
