use std::{
    fmt::{self, Display},
    fs,
    str::FromStr,
};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{catalog::DEFAULT_LANGUAGE, Error, Result};

pub static CONFIG_DIR_NAME: &str = ".manga-cli";
pub static CONFIG_FILE_NAME: &str = "config.json";
pub static DEFAULT_PATH: &str = "~/Pictures/manga-cli";
pub static DEFAULT_VIEWER: &str = "viu";
pub static DEFAULT_WIDTH: u32 = 60;
pub static DEFAULT_HEIGHT: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Path,
    Viewer,
    Language,
    Width,
    Height,
}

impl ConfigKey {
    pub const ALL: [Self; 5] = [
        Self::Path,
        Self::Viewer,
        Self::Language,
        Self::Width,
        Self::Height,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Viewer => "viewer",
            Self::Language => "language",
            Self::Width => "width",
            Self::Height => "height",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Path => "Path where downloaded manga is stored",
            Self::Viewer => "External image viewer (e.g., viu, chafa, timg)",
            Self::Language => "Preferred language for manga chapters",
            Self::Width => "Image width passed to the viewer, 0 to omit",
            Self::Height => "Image height passed to the viewer, 0 to omit",
        }
    }
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| Error::InvalidConfigKey(s.to_string()))
    }
}

/// User settings, passed explicitly to whatever needs them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download root, may start with `~/`
    pub path: String,
    pub viewer: String,
    pub language: String,
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            viewer: DEFAULT_VIEWER.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Config {
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::Path => self.path.clone(),
            ConfigKey::Viewer => self.viewer.clone(),
            ConfigKey::Language => self.language.clone(),
            ConfigKey::Width => self.width.to_string(),
            ConfigKey::Height => self.height.to_string(),
        }
    }

    /// Updates `key`. Paths are made absolute, and stored as `~/...` when under the home
    /// directory.
    ///
    /// ## Errors
    ///
    /// `Error::InvalidConfigValue` if a dimension isn't a number or the path is empty
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let invalid = || Error::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let parse_dimension = |value: &str| value.trim().parse::<u32>().map_err(|_| invalid());
        match key {
            ConfigKey::Path => {
                let path = absolute_path(value.trim()).map_err(|err| match err {
                    Error::Io(_) => invalid(),
                    err => err,
                })?;
                let home = home_dir().ok();
                self.path = collapse_home(path.as_str(), home.as_deref());
            }
            ConfigKey::Viewer => self.viewer = value.trim().to_string(),
            ConfigKey::Language => self.language = value.trim().to_string(),
            ConfigKey::Width => self.width = parse_dimension(value)?,
            ConfigKey::Height => self.height = parse_dimension(value)?,
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .collect()
    }

    /// The download root with `~` expanded
    ///
    /// ## Errors
    ///
    /// Fails if the path starts with `~/` and the home directory is unknown
    pub fn download_root(&self) -> Result<Utf8PathBuf> {
        if is_home_relative(&self.path) {
            Ok(expand_home(&self.path, Some(&home_dir()?)))
        } else {
            Ok(Utf8PathBuf::from(&self.path))
        }
    }
}

fn home_dir() -> Result<Utf8PathBuf> {
    let home = home::home_dir().ok_or(Error::NoHomeDir)?;
    Utf8PathBuf::from_path_buf(home).map_err(|path| Error::NonUtf8Path(path.display().to_string()))
}

fn is_home_relative(path: &str) -> bool {
    path == "~" || path.starts_with("~/")
}

fn expand_home(path: &str, home: Option<&Utf8Path>) -> Utf8PathBuf {
    match home {
        Some(home) if path == "~" => home.to_path_buf(),
        Some(home) => path
            .strip_prefix("~/")
            .map_or_else(|| Utf8PathBuf::from(path), |rest| home.join(rest)),
        None => Utf8PathBuf::from(path),
    }
}

/// Resolves `path` against the current directory, `~` paths are kept as is
fn absolute_path(path: &str) -> Result<Utf8PathBuf> {
    if is_home_relative(path) {
        return Ok(Utf8PathBuf::from(path));
    }
    let absolute = std::path::absolute(path)?;
    Utf8PathBuf::from_path_buf(absolute)
        .map_err(|path| Error::NonUtf8Path(path.display().to_string()))
}

fn collapse_home(path: &str, home: Option<&Utf8Path>) -> String {
    let path = path.trim();
    let Some(home) = home else {
        return path.to_string();
    };
    match expand_home(path, Some(home)).strip_prefix(home) {
        Ok(rest) if rest.as_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{rest}"),
        Err(_) => path.to_string(),
    }
}

/// Where the configuration lives between runs
pub trait ConfigStore {
    /// ## Errors
    ///
    /// Fails if the stored configuration can't be read or decoded
    fn load(&self) -> Result<Config>;

    /// ## Errors
    ///
    /// Fails if the configuration can't be written
    fn save(&self, config: &Config) -> Result<()>;
}

/// Configuration stored as pretty json, `~/.manga-cli/config.json` by default
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonConfigStore {
    path: Utf8PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ## Errors
    ///
    /// Fails if the home directory is unknown
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(
            home_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        ))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            info!("no config found, writing defaults to {}", self.path);
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(config)?)?;
        debug!("config saved to {}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn keys_round_trip_through_names() {
        for key in ConfigKey::ALL {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), key);
        }
        assert!(matches!(
            "colour".parse::<ConfigKey>(),
            Err(Error::InvalidConfigKey(key)) if key == "colour"
        ));
    }

    #[test]
    fn set_validates_dimensions() {
        let mut config = Config::default();
        config.set(ConfigKey::Width, "80").unwrap();
        config.set(ConfigKey::Viewer, " chafa ").unwrap();
        assert_eq!(config.width, 80);
        assert_eq!(config.get(ConfigKey::Viewer), "chafa");
        assert!(config.set(ConfigKey::Height, "tall").is_err());
        assert_eq!(config.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn home_paths_are_collapsed_and_expanded() {
        let home = Utf8Path::new("/home/reader");
        assert_eq!(
            collapse_home("/home/reader/manga", Some(home)),
            "~/manga"
        );
        assert_eq!(collapse_home("/srv/manga", Some(home)), "/srv/manga");
        assert_eq!(collapse_home("~/manga", Some(home)), "~/manga");
        assert_eq!(
            expand_home("~/manga", Some(home)),
            Utf8PathBuf::from("/home/reader/manga")
        );
        assert_eq!(expand_home("~/manga", None), Utf8PathBuf::from("~/manga"));
        assert_eq!(expand_home("~", Some(home)), Utf8PathBuf::from("/home/reader"));
        assert_eq!(collapse_home("/home/reader", Some(home)), "~");
    }

    #[test]
    fn relative_paths_are_made_absolute() {
        let mut config = Config::default();
        config.set(ConfigKey::Path, "./relative/manga").unwrap();
        let root = config.download_root().unwrap();
        let expected = std::env::current_dir().unwrap().join("relative/manga");
        assert_eq!(root.as_std_path(), expected);

        config.set(ConfigKey::Path, "~/manga").unwrap();
        assert_eq!(config.path, "~/manga");

        assert!(matches!(
            config.set(ConfigKey::Path, "  "),
            Err(Error::InvalidConfigValue { .. })
        ));
        assert_eq!(config.path, "~/manga");
    }

    #[test]
    fn store_writes_defaults_then_persists_changes() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/config.json")).unwrap();
        let store = JsonConfigStore::new(&path);

        let mut config = store.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        config.viewer = "timg".to_string();
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap().viewer, "timg");
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"viewer": "chafa", "width": 100}"#).unwrap();
        assert_eq!(config.viewer, "chafa");
        assert_eq!(config.width, 100);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.path, DEFAULT_PATH);
    }
}
