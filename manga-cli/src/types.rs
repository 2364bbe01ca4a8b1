use std::fmt::Display;

use cli_table::{format::Justify, Table};
use manga_core::{CatalogEntry, ChapterDescriptor, ConfigKey};

fn display_optional_value<Value>(value: &Option<Value>) -> impl Display
where
    Value: Display,
{
    match value {
        None => String::from("-"),
        Some(value) => format!("{value}"),
    }
}

#[derive(Debug, Clone, Table)]
pub struct Manga {
    #[table(title = "#", justify = "Justify::Right")]
    index: usize,
    #[table(title = "Title")]
    pub title: String,
    #[table(title = "ID")]
    pub id: String,
}

impl Manga {
    pub fn new(index: usize, entry: &CatalogEntry, language: &str) -> Self {
        Self {
            index,
            title: entry.title(language).to_string(),
            id: entry.id.clone(),
        }
    }
}

impl Display for Manga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, Table)]
pub struct Chapter {
    #[table(title = "#", justify = "Justify::Right")]
    index: usize,
    #[table(title = "Volume", display_fn = "display_optional_value")]
    volume: Option<String>,
    #[table(title = "Chapter", justify = "Justify::Right")]
    chapter: String,
    #[table(title = "Title")]
    title: String,
    #[table(title = "Language")]
    language: String,
}

impl Chapter {
    pub fn new(index: usize, descriptor: &ChapterDescriptor) -> Self {
        Self {
            index,
            volume: descriptor.volume.clone(),
            chapter: descriptor.number.to_string(),
            title: descriptor
                .display_title
                .clone()
                .unwrap_or_else(|| "Untitled Chapter".to_string()),
            language: descriptor.language.clone(),
        }
    }
}

#[derive(Debug, Clone, Table)]
pub struct ConfigOption {
    #[table(title = "Key")]
    key: &'static str,
    #[table(title = "Value")]
    value: String,
    #[table(title = "Description")]
    description: &'static str,
}

impl ConfigOption {
    pub fn new(key: ConfigKey, value: String) -> Self {
        Self {
            key: key.name(),
            value,
            description: key.description(),
        }
    }
}
