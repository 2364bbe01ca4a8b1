use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct Search {
    /// Title of the manga to look for
    #[clap(short, long)]
    pub title: String,
}

#[derive(Parser, Debug)]
pub struct Download {
    /// Title of the manga to download
    #[clap(short, long)]
    pub title: String,
    /// A single chapter number
    #[clap(short, long, conflicts_with_all = ["chapters", "from", "to"])]
    pub chapter: Option<u32>,
    /// A comma separated list of chapter numbers, e.g. `1,4,7`
    #[clap(long, conflicts_with_all = ["from", "to"])]
    pub chapters: Option<String>,
    /// Start of a chapter range
    #[clap(long, requires = "to")]
    pub from: Option<u32>,
    /// End of a chapter range (inclusive)
    #[clap(long, requires = "from")]
    pub to: Option<u32>,
    /// Download the lower quality images
    #[clap(long)]
    pub data_saver: bool,
    /// Take the first search result instead of asking
    #[clap(long)]
    pub first: bool,
}

#[derive(Parser, Debug)]
pub struct Read {
    /// Title of a downloaded manga
    #[clap(short, long)]
    pub title: String,
    /// Chapter number, e.g. `12` or `12.5`
    #[clap(short, long)]
    pub chapter: String,
    /// Image width, overrides the configured width
    #[clap(long)]
    pub width: Option<u32>,
    /// Image height, overrides the configured height
    #[clap(long)]
    pub height: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct List {
    /// List the chapters of this title
    #[clap(short, long)]
    pub title: Option<String>,
    /// List the images of this chapter
    #[clap(short, long, requires = "title")]
    pub chapter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print one option
    Get { key: String },
    /// Set one option
    Set { key: String, value: String },
    /// Print every option
    List,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Search a manga, pick a chapter, download it and read it
    #[clap(alias = "s")]
    Search(Search),
    /// Download one or several chapters
    #[clap(alias = "d")]
    Download(Download),
    /// Read a downloaded chapter
    #[clap(alias = "r")]
    Read(Read),
    /// List downloaded manga, chapters, or images
    #[clap(alias = "l")]
    List(List),
    /// Get or set configuration options (download path, viewer, language...)
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// Configuration file, defaults to ~/.manga-cli/config.json
    #[clap(long, global = true)]
    pub config_path: Option<Utf8PathBuf>,
    #[clap(subcommand)]
    pub command: Subcommands,
}
