use async_trait::async_trait;
use serde::Deserialize;

use crate::{Request, Result};

use super::Client;

pub static DEFAULT_CHAPTERS_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct Attributes {
    pub volume: Option<String>,
    pub chapter: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "translatedLanguage")]
    pub translated_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct Data {
    pub id: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct Response {
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
    pub data: Vec<Data>,
}

/// Get one page of the chapter feed of the given manga id, ordered by volume then chapter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GetChapters {
    manga_id: String,
    limit: u32,
    offset: u32,
    languages: Option<Vec<String>>,
}

impl GetChapters {
    pub fn new(manga_id: impl Into<String>) -> Self {
        Self {
            manga_id: manga_id.into(),
            limit: DEFAULT_CHAPTERS_LIMIT,
            offset: 0,
            languages: None,
        }
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

    #[must_use]
    pub fn push_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        match &mut self.languages {
            Some(languages) => languages.push(language),
            None => self.languages = Some(vec![language]),
        };
        self
    }
}

#[async_trait]
impl Request for GetChapters {
    type Response = Response;

    async fn request(self, client: &Client) -> Result<Self::Response> {
        let mut url = client.endpoint(&format!("manga/{}/feed", self.manga_id))?;
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.to_string())
            .append_pair("offset", &self.offset.to_string())
            .append_pair("order[volume]", "asc")
            .append_pair("order[chapter]", "asc");
        if let Some(languages) = &self.languages {
            for language in languages {
                url.query_pairs_mut()
                    .append_pair("translatedLanguage[]", language);
            }
        }
        client.get_json(url, "get_chapters").await
    }
}
