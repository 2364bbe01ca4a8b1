use async_trait::async_trait;
pub use get_chapter::GetChapter;
pub use get_chapters::GetChapters;
pub use get_mirror::GetMirror;
use reqwest::Url;
pub use search::Search;
use serde::Deserialize;
use tracing::{debug, error};

use crate::{Error, Result};

pub mod get_chapter;
pub mod get_chapters;
pub mod get_mirror;
pub mod search;

pub static DEFAULT_BASE_URL: &str = "https://api.mangadex.org/";

/// Shared http client pointed at one catalog instance
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    /// Creates a client for the public mangadex api
    ///
    /// ## Errors
    ///
    /// Fails if the underlying http client can't be built
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client for the catalog found at `base_url`
    ///
    /// ## Errors
    ///
    /// Fails if `base_url` isn't a valid url
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("manga-cli/", env!("CARGO_PKG_VERSION")))
                .build()?,
            base_url,
        })
    }

    /// Returns the url of `path` relative to the catalog root
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Into::into)
    }

    /// Send a get request to `url` and decode the json response as `T`
    pub(crate) async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T> {
        debug!("{context}: GET {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!("{context} returned {status}");
            return Err(Error::upstream(context, format!("unexpected status {status}")));
        }
        response.json().await.map_err(|err| {
            error!("error decoding {context}: {err}");
            Error::upstream(context, err)
        })
    }
}

#[async_trait]
pub trait Request {
    type Response;

    async fn request(self, client: &Client) -> Result<Self::Response>;
}
