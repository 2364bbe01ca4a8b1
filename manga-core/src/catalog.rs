use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{
    api::{get_chapters, Client, GetChapter, GetChapters, Search},
    ChapterNumber, Error, Request, Result,
};

pub static DEFAULT_LANGUAGE: &str = "en";
pub static SEARCH_LIMIT: u32 = 10;
/// Page size used when walking the whole feed, a shorter page marks the end of the list
pub static FETCH_ALL_PAGE_SIZE: u32 = 100;
/// Maximum amount of chapter numbers sent in a single query
pub static CHAPTER_BATCH_SIZE: usize = 100;
/// Longest range of chapters that can be asked for at once
pub static MAX_RANGE_LEN: u32 = 10_000;

/// A work found in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    pub id: String,
    /// Display name by locale
    pub titles: BTreeMap<String, String>,
}

impl CatalogEntry {
    /// Title in `locale`, falling back to english, then to any title, then to the id
    pub fn title(&self, locale: &str) -> &str {
        self.titles
            .get(locale)
            .or_else(|| self.titles.get(DEFAULT_LANGUAGE))
            .or_else(|| self.titles.values().next())
            .unwrap_or(&self.id)
    }
}

impl From<crate::api::search::Data> for CatalogEntry {
    fn from(data: crate::api::search::Data) -> Self {
        Self {
            id: data.id,
            titles: data.attributes.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterDescriptor {
    pub id: String,
    pub volume: Option<String>,
    pub number: ChapterNumber,
    pub display_title: Option<String>,
    pub language: String,
}

impl From<get_chapters::Data> for ChapterDescriptor {
    fn from(get_chapters::Data { id, attributes }: get_chapters::Data) -> Self {
        Self {
            id,
            volume: attributes.volume,
            number: attributes.chapter.into(),
            display_title: attributes.title.filter(|title| !title.trim().is_empty()),
            language: attributes.translated_language.unwrap_or_default(),
        }
    }
}

/// One page of a chapter listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPage {
    pub chapters: Vec<ChapterDescriptor>,
    pub total: u32,
}

/// How the user asked for chapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterSelection {
    Single(u32),
    List(Vec<u32>),
    Range { from: u32, to: u32 },
}

impl ChapterSelection {
    /// Builds a selection from the three mutually exclusive ways of asking for chapters
    ///
    /// ## Errors
    ///
    /// Fails unless exactly one of the forms is provided and is valid
    pub fn from_parts(
        chapter: Option<u32>,
        chapters: Option<&str>,
        range: (Option<u32>, Option<u32>),
    ) -> Result<Self> {
        match (chapter, chapters, range) {
            (Some(chapter), None, (None, None)) if chapter > 0 => Ok(Self::Single(chapter)),
            (None, Some(list), (None, None)) => Self::parse_list(list),
            (None, None, (Some(from), Some(to))) if from > 0 => {
                check_range(from, to)?;
                Ok(Self::Range { from, to })
            }
            (None, None, (Some(from), Some(to))) => Err(Error::InvalidChapterSelection(format!(
                "range {from}..{to} is invalid, chapters start at 1"
            ))),
            _ => Err(Error::InvalidChapterSelection(
                "provide either a chapter, a list of chapters, or both ends of a range"
                    .to_string(),
            )),
        }
    }

    /// Parses a comma separated list of chapter numbers, e.g. `1, 4,7`
    ///
    /// ## Errors
    ///
    /// Fails on any entry that isn't a positive integer, or on an empty list
    pub fn parse_list(list: &str) -> Result<Self> {
        let numbers = list
            .split(',')
            .map(|entry| {
                entry
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|number| *number > 0)
                    .ok_or_else(|| {
                        Error::InvalidChapterSelection(format!("invalid chapter number: {entry}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        if numbers.is_empty() {
            return Err(Error::InvalidChapterSelection("empty list".to_string()));
        }
        Ok(Self::List(numbers))
    }

    pub fn numbers(&self) -> Vec<u32> {
        match self {
            Self::Single(number) => vec![*number],
            Self::List(numbers) => numbers.clone(),
            Self::Range { from, to } => (*from..=*to).collect(),
        }
    }
}

fn check_range(from: u32, to: u32) -> Result<()> {
    if from > to {
        return Err(Error::InvalidChapterSelection(format!(
            "range {from}..{to} is empty"
        )));
    }
    if to - from >= MAX_RANGE_LEN {
        return Err(Error::InvalidChapterSelection(format!(
            "range {from}..{to} is longer than {MAX_RANGE_LEN} chapters"
        )));
    }
    Ok(())
}

/// Resolves titles and chapter numbers against the remote catalog.
/// Nothing is cached, every call goes to the catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: Client,
    language: String,
}

impl Catalog {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    #[must_use]
    pub fn set_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Returns every work whose title matches `title`, most relevant first
    ///
    /// ## Errors
    ///
    /// `Error::NotFound` if nothing matches
    pub async fn resolve_title(&self, title: &str) -> Result<Vec<CatalogEntry>> {
        let response = Search::new(title)
            .with_limit(SEARCH_LIMIT)
            .request(&self.client)
            .await?;
        if response.data.is_empty() {
            return Err(Error::NotFound(format!("no manga found with title '{title}'")));
        }
        Ok(response.data.into_iter().map(Into::into).collect())
    }

    /// One page of chapters, ordered by volume then chapter, in the catalog language
    ///
    /// ## Errors
    ///
    /// Fails on transport errors or an upstream error
    pub async fn list_chapters(
        &self,
        catalog_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ChapterPage> {
        let response = GetChapters::new(catalog_id)
            .set_limit(limit)
            .set_offset(offset)
            .push_language(&self.language)
            .request(&self.client)
            .await?;
        Ok(ChapterPage {
            chapters: response.data.into_iter().map(Into::into).collect(),
            total: response.total,
        })
    }

    /// Walks the whole feed until a page shorter than the page size is returned
    ///
    /// ## Errors
    ///
    /// Fails as soon as one page fails
    pub async fn fetch_all_chapters(&self, catalog_id: &str) -> Result<Vec<ChapterDescriptor>> {
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .list_chapters(catalog_id, FETCH_ALL_PAGE_SIZE, offset)
                .await?;
            let len = page.chapters.len();
            all.extend(page.chapters);
            if len < FETCH_ALL_PAGE_SIZE as usize {
                break;
            }
            offset += FETCH_ALL_PAGE_SIZE;
        }
        debug!("fetched {} chapters for {catalog_id}", all.len());
        Ok(all)
    }

    /// Finds the chapter numbered `number`
    ///
    /// ## Errors
    ///
    /// `Error::NotFound` if the work has no such chapter in the catalog language
    pub async fn resolve_chapter_by_number(
        &self,
        catalog_id: &str,
        number: &ChapterNumber,
    ) -> Result<ChapterDescriptor> {
        let response = GetChapter::new(catalog_id, number.to_string())
            .with_language(&self.language)
            .request(&self.client)
            .await?;
        response
            .data
            .into_iter()
            .map(ChapterDescriptor::from)
            .find(|chapter| &chapter.number == number)
            .ok_or_else(|| Error::NotFound(format!("chapter {number} not found")))
    }

    /// Maps each requested number that exists remotely to its chapter id.
    /// Missing numbers are simply absent from the map.
    ///
    /// ## Errors
    ///
    /// Fails on transport errors or an upstream error, never because a number is missing
    pub async fn resolve_chapters(
        &self,
        catalog_id: &str,
        numbers: &[u32],
    ) -> Result<BTreeMap<u32, String>> {
        let mut found = BTreeMap::new();
        for batch in numbers.chunks(CHAPTER_BATCH_SIZE) {
            let mut offset = 0;
            loop {
                let numbers = batch.iter().map(u32::to_string);
                let response = GetChapter::with_numbers(catalog_id, numbers)
                    .with_language(&self.language)
                    .set_limit(FETCH_ALL_PAGE_SIZE)
                    .set_offset(offset)
                    .request(&self.client)
                    .await?;
                let len = response.data.len();
                for chapter in response.data.into_iter().map(ChapterDescriptor::from) {
                    match chapter.number.as_integer() {
                        Some(number) if batch.contains(&number) => {
                            found.entry(number).or_insert(chapter.id);
                        }
                        _ => debug!(
                            "skipping chapter {} ({}), not a requested whole number",
                            chapter.number.raw(),
                            chapter.id
                        ),
                    }
                }
                if len < FETCH_ALL_PAGE_SIZE as usize {
                    break;
                }
                offset += FETCH_ALL_PAGE_SIZE;
            }
        }
        info!("resolved {} of {} chapters", found.len(), numbers.len());
        Ok(found)
    }

    /// [`Catalog::resolve_chapters`] for every number in `from..=to`
    ///
    /// ## Errors
    ///
    /// `Error::InvalidChapterSelection` if `from > to` or the range is longer than
    /// [`MAX_RANGE_LEN`], otherwise as `resolve_chapters`
    pub async fn resolve_chapter_range(
        &self,
        catalog_id: &str,
        from: u32,
        to: u32,
    ) -> Result<BTreeMap<u32, String>> {
        check_range(from, to)?;
        let numbers = (from..=to).collect::<Vec<_>>();
        self.resolve_chapters(catalog_id, &numbers).await
    }
}
