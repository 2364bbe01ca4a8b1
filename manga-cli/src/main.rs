#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use camino::Utf8Path;
use clap::Parser;
use cli_table::{print_stdout, WithTitle};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use manga_core::{
    viewer::{self, ExternalRenderer, Session},
    Catalog, CatalogEntry, ChapterDescriptor, ChapterNumber, ChapterSelection, Client, Config,
    ConfigKey, ConfigStore, Downloader, Error, Event, JsonConfigStore, Library, Quality,
};
use tokio::{io::BufReader, sync::mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ConfigCommand, Download, List, Read, Search, Subcommands};
use crate::types::{Chapter, ConfigOption, Manga};

mod args;
mod types;

static CHAPTERS_PAGE_SIZE: u32 = 10;

/// Asks the user to pick one of `entries`, `None` if they cancel
fn select_manga(entries: &[CatalogEntry], language: &str) -> Result<Option<CatalogEntry>> {
    let mangas = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| Manga::new(index + 1, entry, language))
        .collect::<Vec<_>>();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a manga")
        .items(&mangas)
        .default(0)
        .interact_opt()?;

    Ok(selection.and_then(|selection| entries.get(selection).cloned()))
}

/// Pages through the chapter feed until the user picks a chapter, `None` if they quit
async fn browse_chapters(catalog: &Catalog, manga_id: &str) -> Result<Option<ChapterDescriptor>> {
    let mut offset = 0;
    let mut all_chapters = None;

    loop {
        let page = catalog
            .list_chapters(manga_id, CHAPTERS_PAGE_SIZE, offset)
            .await?;
        println!(
            "\nPage {} ({} chapters)",
            offset / CHAPTERS_PAGE_SIZE + 1,
            page.total
        );
        let rows = page
            .chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| Chapter::new(index + 1, chapter))
            .collect::<Vec<_>>();
        print_stdout(rows.with_title())?;

        let input: String = Input::new()
            .with_prompt("[n] next  [p] prev  [q] quit  [number] select chapter")
            .interact_text()?;

        match input.trim() {
            "n" if offset + CHAPTERS_PAGE_SIZE < page.total => offset += CHAPTERS_PAGE_SIZE,
            "n" => println!("Already on the last page"),
            "p" => offset = offset.saturating_sub(CHAPTERS_PAGE_SIZE),
            "q" => return Ok(None),
            other => {
                if let Some(chapter) = other
                    .parse::<usize>()
                    .ok()
                    .and_then(|number| number.checked_sub(1))
                    .and_then(|index| page.chapters.get(index))
                {
                    return Ok(Some(chapter.clone()));
                }

                let wanted = ChapterNumber::parse(other);
                if !wanted.is_numeric() {
                    println!("Invalid input");
                    continue;
                }

                // Not an index on this page, look the number up in the whole feed
                if all_chapters.is_none() {
                    all_chapters = Some(catalog.fetch_all_chapters(manga_id).await?);
                }
                match all_chapters
                    .iter()
                    .flatten()
                    .find(|chapter| chapter.number == wanted)
                {
                    Some(chapter) => return Ok(Some(chapter.clone())),
                    None => println!("Chapter {wanted} not found"),
                }
            }
        }
    }
}

/// Downloads one chapter while drawing a progress bar
async fn download_with_progress(
    downloader: &Downloader,
    title: &str,
    chapter_id: &str,
    label: &str,
    quality: Quality,
) -> manga_core::Result<camino::Utf8PathBuf> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{wide_bar}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let label_message = format!("chapter {label}");

    let progress = tokio::spawn(async move {
        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_message(label_message);

        while let Some(event) = rx.recv().await {
            match event {
                Event::Init(len) => bar.set_length(len as u64),
                Event::Skipped { .. } | Event::Downloaded { .. } => bar.inc(1),
                Event::Failed { index, page } => {
                    bar.println(format!("page {index} ({page}) failed"));
                    bar.inc(1);
                }
                Event::Done => bar.finish(),
            }
        }
    });

    let result = downloader
        .clone()
        .set_sender(tx)
        .download_chapter(title, chapter_id, label, quality)
        .await;
    if let Err(err) = progress.await {
        warn!("progress bar task failed: {err}");
    }
    result
}

async fn search(
    Search { title }: Search,
    config: &mut Config,
    store: &JsonConfigStore,
) -> Result<()> {
    let client = Client::new()?;
    let catalog = Catalog::new(client.clone()).set_language(&config.language);

    println!("Searching for manga: {title}");
    let entries = catalog.resolve_title(&title).await?;
    let Some(manga) = select_manga(&entries, &config.language)? else {
        println!("No manga selected, exiting.");
        return Ok(());
    };

    let Some(chapter) = browse_chapters(&catalog, &manga.id).await? else {
        println!("No chapter selected, exiting.");
        return Ok(());
    };

    let title = manga.title(&config.language).to_string();
    let label = chapter.number.label();
    let library = Library::new(config.download_root()?);
    let dir = if library.is_downloaded(&title, &label) {
        println!("Chapter {label} already downloaded, skipping download.");
        library.chapter_dir(&title, &label)
    } else {
        let downloader = Downloader::new(client, library.clone());
        match download_with_progress(&downloader, &title, &chapter.id, &label, Quality::Standard)
            .await
        {
            Ok(dir) => dir,
            Err(err @ Error::PartialDownload { .. }) => {
                eprintln!("{err}, reading what was downloaded");
                library.chapter_dir(&title, &label)
            }
            Err(err) => return Err(err.into()),
        }
    };

    open_viewer(&dir, config, store, None, None).await
}

async fn download(args: Download, config: &Config) -> Result<()> {
    let selection = ChapterSelection::from_parts(
        args.chapter,
        args.chapters.as_deref(),
        (args.from, args.to),
    )?;
    let client = Client::new()?;
    let catalog = Catalog::new(client.clone()).set_language(&config.language);

    let entries = catalog.resolve_title(&args.title).await?;
    let manga = if args.first || entries.len() == 1 {
        entries.into_iter().next()
    } else {
        select_manga(&entries, &config.language)?
    };
    let Some(manga) = manga else {
        println!("No manga selected, exiting.");
        return Ok(());
    };
    let title = manga.title(&config.language).to_string();

    let found = match &selection {
        ChapterSelection::Range { from, to } => {
            catalog.resolve_chapter_range(&manga.id, *from, *to).await?
        }
        selection => {
            catalog
                .resolve_chapters(&manga.id, &selection.numbers())
                .await?
        }
    };

    let library = Library::new(config.download_root()?);
    let downloader = Downloader::new(client, library.clone());
    let quality = Quality::from_data_saver(args.data_saver);
    let mut missing = 0;
    let mut failed = 0;

    for number in selection.numbers() {
        let Some(chapter_id) = found.get(&number) else {
            println!("Chapter {number} not found");
            missing += 1;
            continue;
        };
        let label = ChapterNumber::from(number).label();
        if library.is_downloaded(&title, &label) {
            println!("Chapter {label} already downloaded, skipping.");
            continue;
        }

        println!("Downloading chapter {label}...");
        match download_with_progress(&downloader, &title, chapter_id, &label, quality).await {
            Ok(dir) => println!("Chapter {label} of '{title}' downloaded to: {dir}"),
            Err(err) => {
                eprintln!("Failed to download chapter {label}: {err}");
                failed += 1;
            }
        }
    }

    if missing + failed > 0 {
        bail!("{missing} chapters not found, {failed} chapters failed");
    }
    Ok(())
}

async fn open_viewer(
    dir: &Utf8Path,
    config: &mut Config,
    store: &JsonConfigStore,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    let mut session = Session::open(dir)?;
    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = io::stdout();
    let program = viewer::resolve_program(config, store, &mut input, &mut output).await?;
    let renderer = ExternalRenderer::new(program).set_size(
        width.unwrap_or(config.width),
        height.unwrap_or(config.height),
    );
    info!("reading {dir}");
    viewer::run(&mut session, &renderer, &mut input, &mut output).await?;
    Ok(())
}

async fn read(
    Read {
        title,
        chapter,
        width,
        height,
    }: Read,
    config: &mut Config,
    store: &JsonConfigStore,
) -> Result<()> {
    let library = Library::new(config.download_root()?);
    let dir = library.local_chapter(&title, &ChapterNumber::parse(chapter).label())?;
    open_viewer(&dir, config, store, width, height)
        .await
        .context("failed to start reader")
}

fn list(List { title, chapter }: List, config: &Config) -> Result<()> {
    let library = Library::new(config.download_root()?);
    let mut stdout = io::stdout().lock();
    match (title, chapter) {
        (None, _) => {
            writeln!(stdout, "Available manga in {}:", library.root())?;
            for title in library.titles()? {
                writeln!(stdout, "  {title}")?;
            }
        }
        (Some(title), None) => {
            writeln!(stdout, "Chapters for manga '{title}':")?;
            for chapter in library.chapters(&title)? {
                writeln!(stdout, "  {chapter}")?;
            }
        }
        (Some(title), Some(chapter)) => {
            let label = ChapterNumber::parse(chapter).label();
            let dir = library.local_chapter(&title, &label)?;
            writeln!(stdout, "Images in {dir}:")?;
            for file in library.files(&title, &label)? {
                writeln!(stdout, "  {file}")?;
            }
        }
    }
    Ok(())
}

fn configure(command: ConfigCommand, config: &mut Config, store: &JsonConfigStore) -> Result<()> {
    match command {
        ConfigCommand::Get { key } => {
            let key = key.parse::<ConfigKey>()?;
            println!("{key} = {}", config.get(key));
        }
        ConfigCommand::Set { key, value } => {
            let key = key.parse::<ConfigKey>()?;
            config.set(key, &value)?;
            store.save(config)?;
            println!("Set {key} = {}", config.get(key));
        }
        ConfigCommand::List => {
            let options = config
                .entries()
                .into_iter()
                .map(|(key, value)| ConfigOption::new(key, value))
                .collect::<Vec<_>>();
            println!("Configuration file: {}", store.path());
            print_stdout(options.with_title())?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let store = match args.config_path {
        Some(path) => JsonConfigStore::new(path),
        None => JsonConfigStore::default_location()?,
    };
    let mut config = store
        .load()
        .map_err(|err| anyhow!("couldn't load {}: {err}", store.path()))?;

    match args.command {
        Subcommands::Search(args) => search(args, &mut config, &store).await?,
        Subcommands::Download(args) => download(args, &config).await?,
        Subcommands::Read(args) => read(args, &mut config, &store).await?,
        Subcommands::List(args) => list(args, &config)?,
        Subcommands::Config(command) => configure(command, &mut config, &store)?,
    }

    Ok(())
}
