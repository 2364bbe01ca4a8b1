use std::fmt;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tokio::{fs, io::AsyncWriteExt, sync::mpsc};
use tracing::{debug, error, info};
use url::Url;

use crate::{api::Client, mirror::fetch_mirror, Error, Library, Quality, Result};

pub static DEFAULT_MAX_DOWNLOAD_RETRIES: u32 = 3;
static PARTIAL_EXTENSION: &str = "part";

/// Progress of a chapter download, pages are indexed from 1
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event {
    Init(usize),
    Skipped { index: usize, page: String },
    Downloaded { index: usize, page: String },
    Failed { index: usize, page: String },
    Done,
}

/// Materializes a single remote page as a local file
#[async_trait]
pub trait PageFetcher {
    /// ## Errors
    ///
    /// Fails on transport errors, non-success statuses, or if the file can't be written.
    /// No file is left at `destination` on failure.
    async fn fetch_page(&self, url: Url, destination: &Utf8Path) -> Result<()>;
}

/// Streams pages over http, retrying transient failures
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: ClientWithMiddleware,
}

impl fmt::Debug for HttpPageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPageFetcher").finish_non_exhaustive()
    }
}

impl HttpPageFetcher {
    pub fn new(max_download_retries: u32) -> Self {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(max_download_retries);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Self { client }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOWNLOAD_RETRIES)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: Url, destination: &Utf8Path) -> Result<()> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(url.as_str(), format!("bad status {status}")));
        }

        // An interrupted page must never look complete to the skip check
        let partial = Utf8PathBuf::from(format!("{destination}.{PARTIAL_EXTENSION}"));
        match write_body(response, &partial).await {
            Ok(()) => fs::rename(&partial, destination).await.map_err(Into::into),
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(&partial).await {
                    debug!("couldn't remove {partial}: {remove_err}");
                }
                Err(err)
            }
        }
    }
}

async fn write_body(mut response: reqwest::Response, path: &Utf8Path) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Downloads the pages of chapters into the local library.
///
/// Pages already present are skipped, so calling [`Downloader::download_chapter`] again
/// resumes an interrupted chapter. A failing page never stops the others.
#[derive(Debug, Clone)]
pub struct Downloader<F = HttpPageFetcher> {
    client: Client,
    library: Library,
    fetcher: F,
    sender: Option<mpsc::UnboundedSender<Event>>,
}

impl Downloader<HttpPageFetcher> {
    pub fn new(client: Client, library: Library) -> Self {
        Self::with_fetcher(client, library, HttpPageFetcher::default())
    }
}

impl<F: PageFetcher> Downloader<F> {
    pub fn with_fetcher(client: Client, library: Library, fetcher: F) -> Self {
        Self {
            client,
            library,
            fetcher,
            sender: None,
        }
    }

    #[must_use]
    pub fn set_sender(mut self, sender: mpsc::UnboundedSender<Event>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    fn emit(&self, event: Event) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                debug!("download event receiver dropped");
            }
        }
    }

    /// Downloads every page of `chapter_id` into the `title`/`label` chapter directory
    /// and returns that directory.
    ///
    /// ## Errors
    ///
    /// Fails right away if the directory can't be created or the mirror can't be fetched.
    /// Otherwise every page is attempted, and `Error::PartialDownload` names the pages that failed.
    pub async fn download_chapter(
        &self,
        title: &str,
        chapter_id: &str,
        label: &str,
        quality: Quality,
    ) -> Result<Utf8PathBuf> {
        let dir = self.library.ensure_chapter_dir(title, label)?;
        let mirror = fetch_mirror(&self.client, chapter_id).await?;
        let pages = mirror.pages(quality);
        let total = pages.len();
        info!("downloading {total} pages of {title} chapter {label} into {dir}");
        self.emit(Event::Init(total));

        let mut failed_pages = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            let index = index + 1;
            let destination = dir.join(sanitize_filename::sanitize(page));
            if destination.exists() {
                debug!("page {index}/{total} {page} already present, skipping");
                self.emit(Event::Skipped {
                    index,
                    page: page.clone(),
                });
                continue;
            }

            let result = match mirror.page_url(quality, page) {
                Ok(url) => self.fetcher.fetch_page(url, &destination).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => {
                    info!("downloaded page {index}/{total} {page}");
                    self.emit(Event::Downloaded {
                        index,
                        page: page.clone(),
                    });
                }
                Err(err) => {
                    error!("page {index}/{total} {page} failed: {err}");
                    failed_pages.push(page.clone());
                    self.emit(Event::Failed {
                        index,
                        page: page.clone(),
                    });
                }
            }
        }

        self.emit(Event::Done);

        if failed_pages.is_empty() {
            Ok(dir)
        } else {
            Err(Error::PartialDownload {
                count: failed_pages.len(),
                pages: failed_pages,
            })
        }
    }
}
