use std::{
    env,
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    process::Command as ProcessCommand,
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::{Config, ConfigStore, Error, Result};

pub static IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
pub static DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(5);
static CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Lists the images of `dir`, sorted by path
///
/// ## Errors
///
/// `Error::MissingLocalChapter` if `dir` doesn't exist, `Error::EmptyDirectory` if it has no image
pub fn list_images(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingLocalChapter(dir.to_path_buf()));
    }
    let mut images = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_type()?.is_file() && is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    if images.is_empty() {
        return Err(Error::EmptyDirectory(dir.to_path_buf()));
    }
    images.sort();
    Ok(images)
}

fn is_image(path: &Utf8Path) -> bool {
    path.extension().is_some_and(|extension| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known))
    })
}

/// A line typed by the user in the viewer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Next,
    Previous,
    Quit,
    /// 1-based page number, not validated against the page count yet
    Jump(usize),
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "n" | "" => Self::Next,
            "p" => Self::Previous,
            "q" => Self::Quit,
            other => other
                .parse()
                .map_or_else(|_| Self::Invalid(other.to_string()), Self::Jump),
        }
    }
}

/// Position of the reader in a sorted set of images
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    images: Vec<Utf8PathBuf>,
    cursor: usize,
}

impl Session {
    /// ## Errors
    ///
    /// `Error::EmptyDirectory` if there is no image to show
    pub fn new(dir: &Utf8Path, images: Vec<Utf8PathBuf>) -> Result<Self> {
        if images.is_empty() {
            return Err(Error::EmptyDirectory(dir.to_path_buf()));
        }
        Ok(Self { images, cursor: 0 })
    }

    /// ## Errors
    ///
    /// Same as [`list_images`]
    pub fn open(dir: &Utf8Path) -> Result<Self> {
        Self::new(dir, list_images(dir)?)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &Utf8Path {
        &self.images[self.cursor]
    }

    /// Moves the cursor according to `command`. Returns `true` if the cursor now
    /// points to the page to show, `false` if the command was rejected.
    /// [`Command::Quit`] is accepted and leaves the cursor untouched.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::Next => self.cursor = (self.cursor + 1).min(self.len() - 1),
            Command::Previous => self.cursor = self.cursor.saturating_sub(1),
            Command::Jump(page) if (1..=self.len()).contains(page) => self.cursor = page - 1,
            Command::Jump(_) | Command::Invalid(_) => return false,
            Command::Quit => {}
        }
        true
    }
}

/// Draws an image in the terminal
#[async_trait]
pub trait Render {
    /// ## Errors
    ///
    /// Fails if the image couldn't be drawn, the session goes on regardless
    async fn render(&self, image: &Utf8Path) -> Result<()>;
}

/// Renders by running an external program, e.g. `viu -w 60 -h 40 page.png`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalRenderer {
    program: String,
    width: u32,
    height: u32,
    timeout: Duration,
}

impl ExternalRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            width: 0,
            height: 0,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Zero omits the flag
    #[must_use]
    pub fn set_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn args(&self, image: &Utf8Path) -> Vec<String> {
        let mut args = Vec::new();
        if self.width > 0 {
            args.extend(["-w".to_string(), self.width.to_string()]);
        }
        if self.height > 0 {
            args.extend(["-h".to_string(), self.height.to_string()]);
        }
        args.push(image.to_string());
        args
    }
}

#[async_trait]
impl Render for ExternalRenderer {
    async fn render(&self, image: &Utf8Path) -> Result<()> {
        debug!("rendering {image} with {}", self.program);
        let mut command = ProcessCommand::new(&self.program);
        command
            .args(self.args(image))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let status = timeout(self.timeout, command.status())
            .await
            .map_err(|_| Error::RenderTimeout(self.timeout))??;
        if status.success() {
            Ok(())
        } else {
            Err(Error::RenderFailed(status))
        }
    }
}

/// Looks `program` up the same way a shell would
pub fn find_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = Path::new(program);
        return path.is_file().then(|| path.to_path_buf());
    }
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    })
}

/// Returns the configured viewer program. If it can't be found, asks the user for another one
/// and saves it to `store` as the new configured viewer.
///
/// ## Errors
///
/// `Error::NoViewer` if the user gives nothing, or the store error if saving fails
pub async fn resolve_program(
    config: &mut Config,
    store: &impl ConfigStore,
    input: &mut (impl AsyncBufRead + Unpin),
    output: &mut impl Write,
) -> Result<String> {
    if find_program(&config.viewer).is_some() {
        return Ok(config.viewer.clone());
    }
    warn!("image viewer {} not found", config.viewer);
    write!(
        output,
        "No image viewer found. Please enter your preferred image viewer command (e.g., viu, chafa): "
    )?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).await?;
    let viewer = line.trim();
    if viewer.is_empty() {
        return Err(Error::NoViewer);
    }
    config.viewer = viewer.to_string();
    store.save(config)?;
    info!("image viewer set to {viewer}");
    Ok(config.viewer.clone())
}

/// Blocking page-by-page reader loop: renders the current page, then waits for a command.
/// Returns once the user quits or the input is closed.
///
/// ## Errors
///
/// Fails only if the terminal can't be read or written, render errors are reported and skipped
pub async fn run(
    session: &mut Session,
    renderer: &impl Render,
    input: &mut (impl AsyncBufRead + Unpin),
    output: &mut impl Write,
) -> Result<()> {
    loop {
        write!(output, "{CLEAR_SCREEN}")?;
        writeln!(output, "Page {} / {}", session.cursor() + 1, session.len())?;
        writeln!(output, "Commands: [n]ext, [p]rev, [q]uit, [number] jump to page")?;
        output.flush()?;

        if let Err(err) = renderer.render(session.current()).await {
            warn!("render error on {}: {err}", session.current());
            writeln!(output, "Error rendering image: {err}")?;
        }

        loop {
            write!(output, "Enter command: ")?;
            output.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                debug!("input closed, leaving viewer");
                return Ok(());
            }
            let command = Command::parse(&line);
            if command == Command::Quit {
                return Ok(());
            }
            if session.apply(&command) {
                break;
            }
            writeln!(
                output,
                "Invalid input, enter 'n', 'p', 'q' or a page number between 1 and {}.",
                session.len()
            )?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(len: usize) -> Session {
        let images = (0..len)
            .map(|i| Utf8PathBuf::from(format!("{i:03}.png")))
            .collect();
        Session::new(Utf8Path::new("."), images).unwrap()
    }

    #[test]
    fn commands_are_parsed() {
        assert_eq!(Command::parse("n\n"), Command::Next);
        assert_eq!(Command::parse("\n"), Command::Next);
        assert_eq!(Command::parse(" p "), Command::Previous);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("12"), Command::Jump(12));
        assert_eq!(Command::parse("-1"), Command::Invalid("-1".to_string()));
        assert_eq!(Command::parse("next"), Command::Invalid("next".to_string()));
    }

    #[test]
    fn cursor_is_clamped() {
        let mut session = session(3);
        assert!(session.apply(&Command::Previous));
        assert_eq!(session.cursor(), 0);
        session.apply(&Command::Next);
        session.apply(&Command::Next);
        session.apply(&Command::Next);
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn jumps_must_be_in_range() {
        let mut session = session(3);
        assert!(session.apply(&Command::Jump(3)));
        assert_eq!(session.cursor(), 2);
        assert!(!session.apply(&Command::Jump(0)));
        assert!(!session.apply(&Command::Jump(4)));
        assert!(!session.apply(&Command::Invalid("x".to_string())));
        assert_eq!(session.cursor(), 2);
        assert!(session.apply(&Command::Jump(1)));
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn empty_sessions_are_rejected() {
        assert!(matches!(
            Session::new(Utf8Path::new("chapter"), Vec::new()),
            Err(Error::EmptyDirectory(_))
        ));
    }

    #[test]
    fn renderer_args_skip_zero_dimensions() {
        let image = Utf8Path::new("1.png");
        assert_eq!(ExternalRenderer::new("viu").args(image), ["1.png"]);
        assert_eq!(
            ExternalRenderer::new("viu").set_size(60, 0).args(image),
            ["-w", "60", "1.png"]
        );
        assert_eq!(
            ExternalRenderer::new("viu").set_size(60, 40).args(image),
            ["-w", "60", "-h", "40", "1.png"]
        );
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image(Utf8Path::new("a.JPG")));
        assert!(is_image(Utf8Path::new("a.webp")));
        assert!(!is_image(Utf8Path::new("a.png.part")));
        assert!(!is_image(Utf8Path::new("notes")));
    }

    #[test]
    fn missing_programs_are_not_found() {
        assert!(find_program("").is_none());
        assert!(find_program("surely-not-an-image-viewer-on-this-machine").is_none());
    }
}
