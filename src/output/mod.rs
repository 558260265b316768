//! Console display and transcript file output

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::transcript::TranscriptEvent;

/// Live console renderer for transcript events.
///
/// Partial hypotheses are redrawn in place on one line; final segments get
/// their own line.
pub struct LiveDisplay {
    has_partial: bool,
}

impl LiveDisplay {
    pub fn new() -> Self {
        Self { has_partial: false }
    }

    pub fn render(&mut self, event: &TranscriptEvent) {
        match event {
            TranscriptEvent::PartialUpdate(text) => {
                print!("\r... {}\x1b[K", text);
                let _ = io::stdout().flush();
                self.has_partial = true;
            }
            TranscriptEvent::FinalSegment(text) => {
                if self.has_partial {
                    self.clear_line();
                    self.has_partial = false;
                }
                println!("{}", text);
            }
        }
    }

    /// Clear a lingering partial line (e.g. before the session summary)
    pub fn clear_line(&self) {
        print!("\r\x1b[K");
        let _ = io::stdout().flush();
    }
}

impl Default for LiveDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-mode writer for final transcript segments
pub struct TranscriptWriter {
    file: File,
    path: PathBuf,
}

impl TranscriptWriter {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn write_segment(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.file, "{}", text)?;
        self.file.flush()
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
