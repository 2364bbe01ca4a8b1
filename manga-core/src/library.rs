use std::{fs, io};

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::{ChapterNumber, Error, Result};

/// Local layout of downloaded chapters: `{root}/{title}/{chapter label}/{page}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Library {
    root: Utf8PathBuf,
}

impl Library {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn title_dir(&self, title: &str) -> Utf8PathBuf {
        let segment = sanitize_filename::sanitize(title.trim());
        if segment.is_empty() {
            self.root.join("untitled")
        } else {
            self.root.join(segment)
        }
    }

    pub fn chapter_dir(&self, title: &str, label: &str) -> Utf8PathBuf {
        self.title_dir(title).join(label)
    }

    /// Creates the chapter directory, succeeds if it already exists
    ///
    /// ## Errors
    ///
    /// `Error::InvalidLabel` if `label` isn't a single path segment,
    /// or fails if the directory can't be created
    pub fn ensure_chapter_dir(&self, title: &str, label: &str) -> Result<Utf8PathBuf> {
        check_label(label)?;
        let dir = self.chapter_dir(title, label);
        fs::create_dir_all(&dir)?;
        debug!("chapter directory ready at {dir}");
        Ok(dir)
    }

    /// A chapter counts as downloaded once its directory holds at least one file
    pub fn is_downloaded(&self, title: &str, label: &str) -> bool {
        check_label(label).is_ok()
            && fs::read_dir(self.chapter_dir(title, label))
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false)
    }

    /// Returns the directory of a chapter that has already been downloaded
    ///
    /// ## Errors
    ///
    /// `Error::InvalidLabel` if `label` isn't a single path segment,
    /// `Error::MissingLocalChapter` if the directory doesn't exist
    pub fn local_chapter(&self, title: &str, label: &str) -> Result<Utf8PathBuf> {
        check_label(label)?;
        let dir = self.chapter_dir(title, label);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::MissingLocalChapter(dir))
        }
    }

    /// Downloaded titles, sorted
    ///
    /// ## Errors
    ///
    /// Fails if the root exists but can't be read
    pub fn titles(&self) -> Result<Vec<String>> {
        let mut titles = list_dir(&self.root, true)?;
        titles.sort();
        Ok(titles)
    }

    /// Downloaded chapters of `title`, in chapter order
    ///
    /// ## Errors
    ///
    /// Fails if the title directory exists but can't be read
    pub fn chapters(&self, title: &str) -> Result<Vec<String>> {
        let mut chapters = list_dir(&self.title_dir(title), true)?;
        chapters.sort_by_cached_key(|label| ChapterNumber::parse(label.as_str()));
        Ok(chapters)
    }

    /// Files of a downloaded chapter, sorted
    ///
    /// ## Errors
    ///
    /// Fails if the chapter directory exists but can't be read
    pub fn files(&self, title: &str, label: &str) -> Result<Vec<String>> {
        let mut files = list_dir(&self.chapter_dir(title, label), false)?;
        files.sort();
        Ok(files)
    }
}

/// A label must name a directory strictly inside the title directory
fn check_label(label: &str) -> Result<()> {
    let mut components = Utf8Path::new(label).components();
    match (components.next(), components.next()) {
        (Some(Utf8Component::Normal(segment)), None) if segment == label => Ok(()),
        _ => Err(Error::InvalidLabel(label.to_string())),
    }
}

/// Names of the directories (or files) directly under `dir`, empty if `dir` doesn't exist
fn list_dir(dir: &Utf8Path, directories: bool) -> Result<Vec<String>> {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() == directories {
            names.push(entry.file_name().to_string());
        }
    }
    Ok(names)
}
