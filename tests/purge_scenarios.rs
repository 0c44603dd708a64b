use std::collections::HashMap;
use std::sync::Mutex;

use abs_cleanup::config::MediaTypeFilter;
use abs_cleanup::decision::FilterPolicy;
use abs_cleanup::error::{ApiError, PurgeError, Result};
use abs_cleanup::prelude::*;
use abs_cleanup::types::{Library, LibraryItemDetail, LibraryItemSummary, User};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    DeleteEpisode { item: String, episode: String },
    DeleteItem { item: String },
}

/// In-memory server: libraries, item details and canned failures, recording every delete.
#[derive(Default)]
struct FakeServer {
    progress: Value,
    libraries: Vec<Value>,
    items: HashMap<String, Vec<Value>>,
    details: HashMap<String, Value>,
    me_status: Option<StatusCode>,
    failing_details: HashMap<String, StatusCode>,
    failing_deletes: HashMap<String, StatusCode>,
    calls: Mutex<Vec<Call>>,
    requests: Mutex<usize>,
}

impl FakeServer {
    fn new() -> Self {
        Self { progress: json!([]), ..Default::default() }
    }

    fn finished(mut self, progress: Value) -> Self {
        self.progress = progress;
        self
    }

    fn library(mut self, id: &str, media_type: &str, details: Vec<Value>) -> Self {
        self.libraries.push(json!({ "id": id, "name": format!("{id} library"), "mediaType": media_type }));
        let summaries = details.iter().map(|d| json!({ "id": d["id"], "mediaType": media_type })).collect();
        self.items.insert(id.to_string(), summaries);
        for d in details {
            self.details.insert(d["id"].as_str().unwrap().to_string(), d);
        }
        self
    }

    fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

    fn requests(&self) -> usize { *self.requests.lock().unwrap() }

    fn hit(&self) { *self.requests.lock().unwrap() += 1; }
}

fn parse<T: serde::de::DeserializeOwned>(v: Value) -> T { serde_json::from_value(v).unwrap() }

#[async_trait]
impl MediaServer for FakeServer {
    async fn me(&self) -> Result<User> {
        self.hit();
        if let Some(status) = self.me_status {
            return Err(ApiError::status("/api/me", status));
        }
        Ok(parse(json!({ "id": "usr_1", "username": "tester", "mediaProgress": self.progress })))
    }

    async fn libraries(&self) -> Result<Vec<Library>> {
        self.hit();
        Ok(parse(Value::Array(self.libraries.clone())))
    }

    async fn library_items(&self, library_id: &str) -> Result<Vec<LibraryItemSummary>> {
        self.hit();
        match self.items.get(library_id) {
            Some(items) => Ok(parse(Value::Array(items.clone()))),
            None => Err(ApiError::status(format!("/api/libraries/{library_id}/items"), StatusCode::NOT_FOUND)),
        }
    }

    async fn library_item(&self, library_item_id: &str) -> Result<LibraryItemDetail> {
        self.hit();
        let endpoint = format!("/api/items/{library_item_id}");
        if let Some(status) = self.failing_details.get(library_item_id) {
            return Err(ApiError::status(endpoint, *status));
        }
        match self.details.get(library_item_id) {
            Some(d) => Ok(parse(d.clone())),
            None => Err(ApiError::status(endpoint, StatusCode::NOT_FOUND)),
        }
    }

    async fn delete_episode(&self, library_item_id: &str, episode_id: &str) -> Result<()> {
        self.hit();
        if let Some(status) = self.failing_deletes.get(episode_id) {
            return Err(ApiError::status(format!("/api/podcasts/{library_item_id}/episode/{episode_id}"), *status));
        }
        self.calls.lock().unwrap().push(Call::DeleteEpisode {
            item: library_item_id.to_string(),
            episode: episode_id.to_string(),
        });
        Ok(())
    }

    async fn delete_library_item(&self, library_item_id: &str) -> Result<()> {
        self.hit();
        if let Some(status) = self.failing_deletes.get(library_item_id) {
            return Err(ApiError::status(format!("/api/items/{library_item_id}"), *status));
        }
        self.calls.lock().unwrap().push(Call::DeleteItem { item: library_item_id.to_string() });
        Ok(())
    }
}

fn now() -> DateTime<Utc> { DateTime::from_timestamp(1_700_000_000, 0).unwrap() }

fn millis_ago(days: i64) -> i64 { (now() - TimeDelta::days(days)).timestamp_millis() }

fn podcast(id: &str, tags: &[&str], episodes: &[&str]) -> Value {
    let episodes: Vec<Value> = episodes.iter().map(|e| json!({ "id": e, "title": format!("Episode {e}") })).collect();
    json!({ "id": id, "mediaType": "podcast", "media": { "metadata": { "title": format!("Show {id}") }, "tags": tags, "episodes": episodes } })
}

fn audiobook(id: &str, tags: &[&str]) -> Value {
    json!({ "id": id, "mediaType": "book", "media": { "metadata": { "title": format!("Book {id}"), "authorName": "Author" }, "tags": tags } })
}

fn episode_done(item: &str, episode: &str) -> Value {
    json!({ "libraryItemId": item, "episodeId": episode, "isFinished": true })
}

fn book_done(item: &str) -> Value {
    json!({ "libraryItemId": item, "isFinished": true })
}

fn purger(server: FakeServer, scope: MediaTypeFilter, dry_run: bool) -> Purger<FakeServer> {
    Purger::with_policy(server, FilterPolicy { scope, min_age: None }, dry_run)
}

#[tokio::test]
async fn finished_episode_without_tags_is_deleted() {
    let server = FakeServer::new()
        .finished(json!([episode_done("li_a", "ep_a")]))
        .library("pods", "podcast", vec![podcast("li_a", &[], &["ep_a"])]);
    let p = purger(server, MediaTypeFilter::Everything, false);

    let report = p.run_at(now()).await.unwrap();

    assert_eq!(p.server().calls(), vec![Call::DeleteEpisode { item: "li_a".into(), episode: "ep_a".into() }]);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.processed, 1);
    assert!(!report.has_errors());
}

#[tokio::test]
async fn keep_tagged_show_is_never_deleted() {
    for dry_run in [false, true] {
        let server = FakeServer::new()
            .finished(json!([episode_done("li_b", "ep_b1"), episode_done("li_b", "ep_b2")]))
            .library("pods", "podcast", vec![podcast("li_b", &["KEEP"], &["ep_b1", "ep_b2", "ep_b3"])]);
        let p = purger(server, MediaTypeFilter::Everything, dry_run);

        let report = p.run_at(now()).await.unwrap();

        assert!(p.server().calls().is_empty());
        assert_eq!(report.skipped_keep_tag, 3);
        assert_eq!(report.deleted, 0);
    }
}

#[tokio::test]
async fn unfinished_items_are_left_alone() {
    let server = FakeServer::new()
        .finished(json!([{ "libraryItemId": "li_c", "episodeId": "ep_c1", "isFinished": false }]))
        .library("pods", "podcast", vec![podcast("li_c", &[], &["ep_c1", "ep_c2"])])
        .library("books", "book", vec![audiobook("li_book", &[])]);
    let p = purger(server, MediaTypeFilter::Everything, false);

    let report = p.run_at(now()).await.unwrap();

    assert!(p.server().calls().is_empty());
    assert_eq!(report.skipped_unfinished, 3);
    assert_eq!(report.processed, 3);
}

#[tokio::test]
async fn podcasts_scope_never_deletes_audiobooks() {
    let server = FakeServer::new()
        .finished(json!([episode_done("li_a", "ep_a"), book_done("li_book")]))
        .library("pods", "podcast", vec![podcast("li_a", &[], &["ep_a"])])
        .library("books", "book", vec![audiobook("li_book", &[]), audiobook("li_book2", &[])]);
    let p = purger(server, MediaTypeFilter::Podcasts, false);

    let report = p.run_at(now()).await.unwrap();

    assert_eq!(p.server().calls(), vec![Call::DeleteEpisode { item: "li_a".into(), episode: "ep_a".into() }]);
    assert_eq!(report.skipped_type_filter, 2);
    assert_eq!(report.deleted, 1);
}

#[tokio::test]
async fn audiobooks_scope_never_deletes_episodes() {
    let server = FakeServer::new()
        .finished(json!([episode_done("li_a", "ep_a"), book_done("li_book"), book_done("li_kept")]))
        .library("pods", "podcast", vec![podcast("li_a", &[], &["ep_a"])])
        .library("books", "book", vec![audiobook("li_book", &["sci-fi"]), audiobook("li_kept", &["KEEP"])]);
    let p = purger(server, MediaTypeFilter::Audiobooks, false);

    let report = p.run_at(now()).await.unwrap();

    assert_eq!(p.server().calls(), vec![Call::DeleteItem { item: "li_book".into() }]);
    assert_eq!(report.skipped_type_filter, 1);
    assert_eq!(report.skipped_keep_tag, 1);
    assert_eq!(report.deleted, 1);
}

#[tokio::test]
async fn dry_run_issues_no_deletes_and_is_repeatable() {
    let build = || {
        FakeServer::new()
            .finished(json!([episode_done("li_a", "ep_a1"), episode_done("li_a", "ep_a2"), book_done("li_book")]))
            .library("pods", "podcast", vec![podcast("li_a", &[], &["ep_a1", "ep_a2", "ep_a3"])])
            .library("books", "book", vec![audiobook("li_book", &[])])
    };
    let p = purger(build(), MediaTypeFilter::Everything, true);

    let first = p.run_at(now()).await.unwrap();
    let second = p.run_at(now()).await.unwrap();

    assert!(p.server().calls().is_empty());
    assert_eq!(first, second);
    assert!(first.dry_run);
    assert_eq!(first.deleted, 3);
    assert_eq!(first.skipped_unfinished, 1);
}

#[tokio::test]
async fn auth_failure_aborts_before_scanning() {
    let mut server = FakeServer::new().library("pods", "podcast", vec![podcast("li_a", &[], &["ep_a"])]);
    server.me_status = Some(StatusCode::UNAUTHORIZED);
    let p = purger(server, MediaTypeFilter::Everything, false);

    let err = p.run_at(now()).await.unwrap_err();

    assert!(matches!(err, PurgeError::Auth(_)));
    assert_eq!(p.server().requests(), 1);
    assert!(p.server().calls().is_empty());
}

#[tokio::test]
async fn forbidden_delete_aborts_run() {
    let mut server = FakeServer::new()
        .finished(json!([episode_done("li_a", "ep_a1"), episode_done("li_a", "ep_a2")]))
        .library("pods", "podcast", vec![podcast("li_a", &[], &["ep_a1", "ep_a2"])]);
    server.failing_deletes.insert("ep_a1".into(), StatusCode::FORBIDDEN);
    let p = purger(server, MediaTypeFilter::Everything, false);

    let err = p.run_at(now()).await.unwrap_err();

    assert!(matches!(err, PurgeError::Auth(_)));
    assert!(p.server().calls().is_empty());
}

#[tokio::test]
async fn one_bad_item_does_not_stop_the_pass() {
    let mut server = FakeServer::new()
        .finished(json!([episode_done("li_a", "ep_a"), episode_done("li_b", "ep_b")]))
        .library("pods", "podcast", vec![podcast("li_broken", &[], &["ep_x"]), podcast("li_a", &[], &["ep_a"]), podcast("li_b", &[], &["ep_b"])]);
    server.failing_details.insert("li_broken".into(), StatusCode::INTERNAL_SERVER_ERROR);
    server.failing_deletes.insert("ep_b".into(), StatusCode::INTERNAL_SERVER_ERROR);
    let p = purger(server, MediaTypeFilter::Everything, false);

    let report = p.run_at(now()).await.unwrap();

    assert_eq!(p.server().calls(), vec![Call::DeleteEpisode { item: "li_a".into(), episode: "ep_a".into() }]);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.delete_failed, 1);
    assert_eq!(report.skipped_error, 1);
    let noted: Vec<&str> = report.errors.iter().map(|e| e.item_id.as_str()).collect();
    assert_eq!(noted, vec!["li_broken", "ep_b"]);
    assert!(report.errors[0].message.contains("500"));
}

#[tokio::test]
async fn missing_library_listing_is_skipped() {
    let mut server = FakeServer::new()
        .finished(json!([book_done("li_book")]))
        .library("books", "book", vec![audiobook("li_book", &[])]);
    server.libraries.push(json!({ "id": "gone", "name": "Gone", "mediaType": "podcast" }));
    server.libraries.push(json!({ "id": "vids", "name": "Videos", "mediaType": "video" }));
    let p = purger(server, MediaTypeFilter::Everything, false);

    let report = p.run_at(now()).await.unwrap();

    assert_eq!(p.server().calls(), vec![Call::DeleteItem { item: "li_book".into() }]);
    assert_eq!(report.skipped_error, 1);
    assert_eq!(report.errors[0].item_id, "gone");
}

#[tokio::test]
async fn age_filter_spares_recent_items() {
    let recent = json!({ "id": "li_new", "addedAt": millis_ago(10), "media": { "metadata": { "title": "New" } } });
    let old = json!({ "id": "li_old", "addedAt": millis_ago(200), "media": { "metadata": { "title": "Old" } } });
    let server = FakeServer::new()
        .finished(json!([book_done("li_new"), book_done("li_old")]))
        .library("books", "book", vec![recent, old]);
    let policy = FilterPolicy { scope: MediaTypeFilter::Everything, min_age: Some("3m".parse().unwrap()) };
    let p = Purger::with_policy(server, policy, false);

    let report = p.run_at(now()).await.unwrap();

    assert_eq!(p.server().calls(), vec![Call::DeleteItem { item: "li_old".into() }]);
    assert_eq!(report.skipped_too_recent, 1);
    assert_eq!(report.deleted, 1);
}

#[test]
fn missing_token_fails_before_any_request() {
    let vars: HashMap<String, String> = [("ABS_URL".to_string(), "http://abs.local:13378".to_string())].into();
    let err = Config::from_vars(&vars).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("ABS_TOKEN")));
}
