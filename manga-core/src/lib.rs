#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub use api::{Client, Request};
pub use catalog::{Catalog, CatalogEntry, ChapterDescriptor, ChapterPage, ChapterSelection};
pub use chapter_number::ChapterNumber;
pub use config::{Config, ConfigKey, ConfigStore, JsonConfigStore};
pub use download::{Downloader, Event, HttpPageFetcher, PageFetcher};
pub use errors::{Error, Result};
pub use library::Library;
pub use mirror::{fetch_mirror, MirrorDescriptor, Quality};

pub mod api;
pub mod catalog;
pub mod chapter_number;
pub mod config;
pub mod download;
pub mod errors;
pub mod library;
pub mod mirror;
pub mod viewer;
