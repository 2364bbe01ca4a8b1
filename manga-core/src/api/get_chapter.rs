use async_trait::async_trait;

use crate::{Request, Result};

use super::{get_chapters::Response, Client};

pub static DEFAULT_CHAPTER_LIMIT: u32 = 100;

/// Get the chapters of a manga whose number is exactly one of the given numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GetChapter {
    manga_id: String,
    chapter_numbers: Vec<String>,
    language: Option<String>,
    limit: u32,
    offset: u32,
}

impl GetChapter {
    pub fn new(manga_id: impl Into<String>, chapter_number: impl Into<String>) -> Self {
        Self::with_numbers(manga_id, [chapter_number])
    }

    pub fn with_numbers(
        manga_id: impl Into<String>,
        chapter_numbers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            manga_id: manga_id.into(),
            chapter_numbers: chapter_numbers.into_iter().map(Into::into).collect(),
            language: None,
            limit: DEFAULT_CHAPTER_LIMIT,
            offset: 0,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn set_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn set_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

#[async_trait]
impl Request for GetChapter {
    type Response = Response;

    async fn request(self, client: &Client) -> Result<Self::Response> {
        let mut url = client.endpoint("chapter")?;
        url.query_pairs_mut()
            .append_pair("manga", &self.manga_id)
            .append_pair("limit", &self.limit.to_string())
            .append_pair("offset", &self.offset.to_string())
            .append_pair("order[chapter]", "asc");
        for chapter_number in &self.chapter_numbers {
            url.query_pairs_mut()
                .append_pair("chapter[]", chapter_number);
        }
        if let Some(language) = &self.language {
            url.query_pairs_mut()
                .append_pair("translatedLanguage[]", language);
        };
        client.get_json(url, "get_chapter").await
    }
}
