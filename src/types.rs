use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Domain ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    PodcastEpisode,
    Audiobook,
}

impl MediaKind {
    /// Map a library's `mediaType` (`podcast` / `book`) to the kind of item it holds.
    pub fn from_library_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "podcast" => Some(Self::PodcastEpisode),
            "book" => Some(Self::Audiobook),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PodcastEpisode => "podcast episode",
            Self::Audiobook => "audiobook",
        }
    }
}

/// A purge candidate: one podcast episode or one audiobook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    /// Episode id for episodes, library item id for audiobooks.
    pub id: String,
    /// The owning show (episodes) or the audiobook itself.
    pub library_item_id: String,
    pub kind: MediaKind,
    pub title: String,
    /// Show title for episodes, author for audiobooks.
    pub parent_title: String,
    /// Tags of the owning show or audiobook.
    pub tags: BTreeSet<String>,
    pub finished: bool,
    pub added_at: Option<DateTime<Utc>>,
}

impl LibraryItem {
    /// Human-readable name for log lines.
    pub fn display_name(&self) -> String {
        match self.kind {
            MediaKind::PodcastEpisode => format!("{} - {}", self.parent_title, self.title),
            MediaKind::Audiobook => format!("{} by {}", self.title, self.parent_title),
        }
    }
}

// --- Wire schema (Audiobookshelf REST API) ---
//
// Only the fields the purge needs are mapped; everything else is ignored and
// anything missing falls back to its default.

/// `GET /api/me`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub media_progress: Vec<MediaProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaProgress {
    #[serde(default)]
    pub library_item_id: Option<String>,
    #[serde(default)]
    pub episode_id: Option<String>,
    #[serde(default)]
    pub is_finished: bool,
}

/// `GET /api/libraries`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrariesResponse {
    #[serde(default)]
    pub libraries: Vec<Library>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub media_type: String,
}

/// `GET /api/libraries/{id}/items`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryItemsResponse {
    #[serde(default)]
    pub results: Vec<LibraryItemSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItemSummary {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media: Media,
}

/// `GET /api/items/{id}?expanded=1`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItemDetail {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub added_at: Option<i64>,
    #[serde(default)]
    pub media: Media,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub metadata: MediaMetadata,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub episodes: Vec<PodcastEpisode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastEpisode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub added_at: Option<i64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
