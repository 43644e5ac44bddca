//! Redirectable diagnostic output stream.
//!
//! The tracing subscriber writes through a [`DiagnosticOutput`]. It starts on
//! stderr and is pointed at a file inside the session directory once that
//! directory exists.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use crate::{AppError, Result};

#[derive(Debug, Default)]
enum Sink {
    #[default]
    Stderr,
    File {
        path: PathBuf,
        file: File,
    },
}

/// Shared handle to the process-wide diagnostic stream.
///
/// Clones share the same sink, so redirecting one handle redirects every
/// writer produced by any clone.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticOutput {
    sink: Arc<Mutex<Sink>>,
}

impl DiagnosticOutput {
    /// A handle writing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send all further output to `<dir>/<prefix><name>`, appending if the
    /// file already exists. Returns the file path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened; the stream then
    /// keeps its previous target.
    pub fn redirect_to_dir(&self, dir: &Path, prefix: &str, name: &str) -> Result<PathBuf> {
        let path = dir.join(format!("{prefix}{name}"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| AppError::io(&format!("failed to open {}", path.display()), &err))?;

        let mut guard = self.lock();
        if let Sink::File { file: previous, .. } = &mut *guard {
            let _ = previous.flush();
        }
        *guard = Sink::File {
            path: path.clone(),
            file,
        };
        Ok(path)
    }

    /// Return the stream to stderr, closing the file. Returns the path that
    /// was in use, if any.
    pub fn reset(&self) -> Option<PathBuf> {
        let mut guard = self.lock();
        match std::mem::take(&mut *guard) {
            Sink::Stderr => None,
            Sink::File { path, mut file } => {
                let _ = file.flush();
                Some(path)
            }
        }
    }

    /// File currently receiving output, if redirected.
    #[must_use]
    pub fn current_file(&self) -> Option<PathBuf> {
        match &*self.lock() {
            Sink::Stderr => None,
            Sink::File { path, .. } => Some(path.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        lock_sink(&self.sink)
    }
}

fn lock_sink(sink: &Mutex<Sink>) -> MutexGuard<'_, Sink> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer handed to the tracing subscriber for each event.
#[derive(Debug)]
pub struct DiagnosticWriter {
    sink: Arc<Mutex<Sink>>,
}

impl Write for DiagnosticWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *lock_sink(&self.sink) {
            Sink::Stderr => io::stderr().write(buf),
            Sink::File { file, .. } => file.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &mut *lock_sink(&self.sink) {
            Sink::Stderr => io::stderr().write_all(buf),
            Sink::File { file, .. } => file.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *lock_sink(&self.sink) {
            Sink::Stderr => io::stderr().flush(),
            Sink::File { file, .. } => file.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for DiagnosticOutput {
    type Writer = DiagnosticWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DiagnosticWriter {
            sink: Arc::clone(&self.sink),
        }
    }
}
