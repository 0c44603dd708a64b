use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Library, LibraryItemDetail, LibraryItemSummary, User};

/// The slice of the Audiobookshelf API the purge depends on.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Authenticated user, including media progress.
    async fn me(&self) -> Result<User>;
    async fn libraries(&self) -> Result<Vec<Library>>;
    async fn library_items(&self, library_id: &str) -> Result<Vec<LibraryItemSummary>>;
    async fn library_item(&self, library_item_id: &str) -> Result<LibraryItemDetail>;
    /// Remove an episode from a podcast and its file from disk.
    async fn delete_episode(&self, library_item_id: &str, episode_id: &str) -> Result<()>;
    /// Remove a library item and its files from disk.
    async fn delete_library_item(&self, library_item_id: &str) -> Result<()>;
}
