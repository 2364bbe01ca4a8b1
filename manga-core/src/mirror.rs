use url::Url;

use crate::{
    api::{Client, GetMirror},
    Request, Result,
};

/// Image variant offered by the mirror
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    #[default]
    Standard,
    /// Lower resolution images, lighter on bandwidth
    Reduced,
}

impl Quality {
    pub fn from_data_saver(data_saver: bool) -> Self {
        if data_saver {
            Self::Reduced
        } else {
            Self::Standard
        }
    }

    /// Path segment the mirror serves this variant under
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Standard => "data",
            Self::Reduced => "data-saver",
        }
    }
}

/// Short-lived location of a chapter's images.
///
/// The base url is only valid for a few minutes, a descriptor must not outlive the
/// download call it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorDescriptor {
    pub base_url: String,
    pub content_hash: String,
    pub standard_pages: Vec<String>,
    pub reduced_pages: Vec<String>,
}

impl MirrorDescriptor {
    pub fn pages(&self, quality: Quality) -> &[String] {
        match quality {
            Quality::Standard => &self.standard_pages,
            Quality::Reduced => &self.reduced_pages,
        }
    }

    /// Returns `{base_url}/{data|data-saver}/{hash}/{page}`
    ///
    /// ## Errors
    ///
    /// Fails if the mirror sent an invalid base url
    pub fn page_url(&self, quality: Quality, page: &str) -> Result<Url> {
        let url = format!(
            "{}/{}/{}/{page}",
            self.base_url.trim_end_matches('/'),
            quality.path_segment(),
            self.content_hash
        );
        Url::parse(&url).map_err(Into::into)
    }
}

/// Fetches a fresh mirror descriptor for `chapter_id`. Never retried here, a caller
/// retrying must call this again rather than reuse a stale descriptor.
///
/// ## Errors
///
/// Returns `Error::Upstream` on a non-success status or an unexpected payload
pub async fn fetch_mirror(client: &Client, chapter_id: &str) -> Result<MirrorDescriptor> {
    GetMirror::new(chapter_id).request(client).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> MirrorDescriptor {
        MirrorDescriptor {
            base_url: "https://uploads.example.org/token/".to_string(),
            content_hash: "abc123".to_string(),
            standard_pages: vec!["1-full.png".to_string(), "2-full.png".to_string()],
            reduced_pages: vec!["1-small.jpg".to_string()],
        }
    }

    #[test]
    fn page_urls_use_the_quality_segment() {
        let mirror = descriptor();
        assert_eq!(
            mirror
                .page_url(Quality::Standard, "1-full.png")
                .unwrap()
                .as_str(),
            "https://uploads.example.org/token/data/abc123/1-full.png"
        );
        assert_eq!(
            mirror
                .page_url(Quality::Reduced, "1-small.jpg")
                .unwrap()
                .as_str(),
            "https://uploads.example.org/token/data-saver/abc123/1-small.jpg"
        );
    }

    #[test]
    fn pages_follow_quality() {
        let mirror = descriptor();
        assert_eq!(mirror.pages(Quality::Standard).len(), 2);
        assert_eq!(mirror.pages(Quality::Reduced), ["1-small.jpg"]);
        assert_eq!(Quality::from_data_saver(true), Quality::Reduced);
    }
}
