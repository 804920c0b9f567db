//! Session journal: durable transcript of every toolchain boundary call.
//!
//! The vendor IDE emits timestamped workspace journals replaying the API
//! calls of each scripting session. This module reproduces that record for
//! orchestrated runs and doubles as the process-wide logging sink.
//!
//! # Architecture
//!
//! ```text
//! Session calls / log::* macros
//!     |
//! [Journal] (non-blocking send)
//!     | (crossbeam unbounded channel - guaranteed delivery)
//!     v
//! [disk persister thread]
//!     |
//! logs/session_journal_<pid>_<ts>.log
//! ```
//!
//! The persister runs on a plain OS thread with a blocking `recv()`, so
//! journal entries are never lost to a congested caller, and a flush marker
//! lets shutdown wait until everything is durably on disk.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Log, Metadata, Record};

/// One journal entry.
#[derive(Clone, Debug)]
struct JournalLine {
    timestamp: String,
    message: String,
}

enum JournalMessage {
    Line(JournalLine),
    /// Flush marker with a channel sender to signal completion.
    Flush(std::sync::mpsc::Sender<()>),
}

/// Durable, non-blocking session journal.
///
/// Cloning is cheap and shares the same underlying file; the handle can be
/// registered as the global `log` sink via [`Journal::register_global`].
#[derive(Clone)]
pub struct Journal {
    tx: Sender<JournalMessage>,
    path: PathBuf,
}

impl Journal {
    /// Create a journal under `journal_dir`, spawning the disk persister.
    ///
    /// The file carries an ISO-8601 header line, matching the transcripts the
    /// vendor tool writes for its own sessions.
    pub fn new(journal_dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(journal_dir)?;

        let filename = format!(
            "session_journal_{}_{}.log",
            std::process::id(),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let path = journal_dir.join(filename);

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "# {}", Local::now().format("%Y-%m-%dT%H:%M:%S%.9f"))?;
        file.flush()?;

        // Unbounded so sends never block the sequential orchestration path.
        let (tx, rx) = unbounded::<JournalMessage>();

        std::thread::spawn(move || {
            persister_loop(rx, file);
        });

        Ok(Journal { tx, path })
    }

    /// Path of the journal file for this session.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a boundary call, transcript-style. Non-blocking, cannot fail.
    pub fn record_call(&self, call: impl Into<String>) {
        self.send_line(call.into());
    }

    /// Record a free-form note.
    pub fn note(&self, message: impl Into<String>) {
        self.send_line(message.into());
    }

    fn send_line(&self, message: String) {
        let line = JournalLine {
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            message,
        };
        let _ = self.tx.send(JournalMessage::Line(line));
    }

    /// Block until every entry sent so far is durably on disk.
    ///
    /// Call before process exit so the final entries (build results, close)
    /// reach the journal file.
    pub fn flush(&self) -> io::Result<()> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(JournalMessage::Flush(tx))
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))?;
        rx.recv()
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))
    }

    /// Install this journal as the global `log` sink.
    pub fn register_global(&self, max_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone())).map(|()| log::set_max_level(max_level))
    }
}

fn persister_loop(rx: crossbeam_channel::Receiver<JournalMessage>, mut file: File) {
    while let Ok(msg) = rx.recv() {
        match msg {
            JournalMessage::Line(line) => {
                let formatted = format!("[{}] {}\n", line.timestamp, line.message);
                let _ = file.write_all(formatted.as_bytes());
                let _ = file.flush();
            }
            JournalMessage::Flush(done) => {
                let _ = file.flush();
                let _ = done.send(());
            }
        }
    }
}

/// Wires all log::info!(), log::warn!(), log::error!() calls into the journal.
impl Log for Journal {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.send_line(format!("[{}] {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {
        let _ = Journal::flush(self);
    }
}
