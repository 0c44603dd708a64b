//! reqwest-backed [`MediaServer`] for a live Audiobookshelf instance.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, ConfigError, Result};
use crate::server::MediaServer;
use crate::types::{Library, LibrariesResponse, LibraryItemDetail, LibraryItemSummary, LibraryItemsResponse, User};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct AbsClient {
    base_url: Url,
    http: Client,
}

impl AbsClient {
    pub fn new(config: &Config) -> std::result::Result<Self, ClientInitError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| ClientInitError::Config(ConfigError::InvalidToken))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ClientInitError::Api(ApiError::ClientSetup(e)))?;

        Ok(Self { base_url: config.server_url.clone(), http })
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    /// Append path segments to the base URL, keeping any sub-path the server is mounted under.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Config only accepts http(s) URLs with a host, which always have path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> (String, RequestBuilder) {
        let endpoint = format!("/{}", segments.join("/"));
        let builder = self.http.request(method, self.url(segments));
        (endpoint, builder)
    }

    async fn send(endpoint: &str, builder: RequestBuilder) -> Result<Response> {
        tracing::debug!(endpoint, "request");
        let resp = builder
            .send()
            .await
            .map_err(|source| ApiError::Network { endpoint: endpoint.to_string(), source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::status(endpoint, status));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<T> {
        let (endpoint, builder) = self.request(Method::GET, segments);
        let resp = Self::send(&endpoint, builder.query(query)).await?;
        resp.json::<T>()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })
    }

    async fn delete(&self, segments: &[&str]) -> Result<()> {
        let (endpoint, builder) = self.request(Method::DELETE, segments);
        Self::send(&endpoint, builder.query(&[("hard", "1")])).await?;
        Ok(())
    }
}

/// Building the client can fail on the token (a config problem) or in the TLS stack.
#[derive(thiserror::Error, Debug)]
pub enum ClientInitError {
    #[error(transparent)]
    Config(ConfigError),
    #[error(transparent)]
    Api(ApiError),
}

#[async_trait]
impl MediaServer for AbsClient {
    async fn me(&self) -> Result<User> {
        self.get_json(&["api", "me"], &[]).await
    }

    async fn libraries(&self) -> Result<Vec<Library>> {
        let resp: LibrariesResponse = self.get_json(&["api", "libraries"], &[]).await?;
        Ok(resp.libraries)
    }

    async fn library_items(&self, library_id: &str) -> Result<Vec<LibraryItemSummary>> {
        let resp: LibraryItemsResponse = self.get_json(&["api", "libraries", library_id, "items"], &[]).await?;
        Ok(resp.results)
    }

    async fn library_item(&self, library_item_id: &str) -> Result<LibraryItemDetail> {
        self.get_json(&["api", "items", library_item_id], &[("expanded", "1")]).await
    }

    async fn delete_episode(&self, library_item_id: &str, episode_id: &str) -> Result<()> {
        self.delete(&["api", "podcasts", library_item_id, "episode", episode_id]).await
    }

    async fn delete_library_item(&self, library_item_id: &str) -> Result<()> {
        self.delete(&["api", "items", library_item_id]).await
    }
}
