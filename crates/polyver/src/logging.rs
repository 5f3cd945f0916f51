#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use polyver_platform::{AppPaths, write_atomic};

use crate::settings::AppSettings;

/// `debug.log` handle that reopens the file when it disappears, so deleting
/// the log from a file manager doesn't silence the rest of the session.
struct LogFile {
    path: PathBuf,
    file: Option<File>,
}

impl LogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = Some(append_to(&path)?);
        Ok(Self { path, file })
    }

    fn handle(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() || !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.file = Some(append_to(&self.path)?);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file not open"))
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Drop the older half of a log larger than `max_len`, cutting after a line
/// break. Returns whether the file was rewritten.
fn trim_oversized(log_path: &Path, max_len: u64) -> io::Result<bool> {
    let len = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    };
    if len <= max_len {
        return Ok(false);
    }

    let contents = std::fs::read(log_path)?;
    let half = contents.len() / 2;
    let keep_from = contents[half..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(half, |offset| half + offset + 1);
    write_atomic(log_path, &contents[keep_from..])?;
    Ok(true)
}

fn level_for(debug_enabled: bool) -> LevelFilter {
    if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the global logger: `debug.log` in the data directory, plus the
/// terminal in debug builds. Only `polyver*` targets are recorded.
pub fn init_logging(paths: &AppPaths, settings: &AppSettings) {
    if let Err(error) = paths.ensure_dirs() {
        eprintln!("polyver: cannot create app directories: {error}");
    }
    let log_path = paths.log_file();
    let trimmed = trim_oversized(&log_path, settings.max_log_size_bytes);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("polyver")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    match LogFile::open(log_path.clone()) {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
        Err(error) => eprintln!("polyver: cannot open {}: {error}", log_path.display()),
    }

    if loggers.is_empty() || CombinedLogger::init(loggers).is_err() {
        return;
    }
    set_logging_enabled(settings.debug_logging);

    match trimmed {
        Ok(true) => log::info!("Trimmed {} to half its size", log_path.display()),
        Ok(false) => {}
        Err(error) => log::warn!("Could not trim {}: {error}", log_path.display()),
    }
    log::debug!("Logging to {}", log_path.display());
}

/// Toggle scan diagnostics at runtime; warnings and errors always pass.
pub fn set_logging_enabled(enabled: bool) {
    log::set_max_level(level_for(enabled));
}
