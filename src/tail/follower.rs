//! Incremental reader for one growing log file.

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

/// Where to start reading a freshly opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAt {
    /// Skip existing history (initial open).
    End,
    /// Read everything (after rotation or truncation).
    Beginning,
}

/// What happened to the path since it was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChange {
    Unchanged,
    /// Same file, now shorter than what was already read.
    Truncated,
    /// A different file now lives at the path.
    Replaced,
    /// Nothing at the path right now.
    Missing,
}

#[derive(Debug)]
pub struct LogFollower {
    path: PathBuf,
    reader: BufReader<File>,
    position: u64,
    identity: Option<(u64, u64)>,
    pending: Vec<u8>,
}

impl LogFollower {
    pub async fn open(path: &Path, start: StartAt) -> io::Result<Self> {
        let mut file = File::open(path).await?;
        let meta = file.metadata().await?;
        let position = match start {
            StartAt::End => file.seek(SeekFrom::End(0)).await?,
            StartAt::Beginning => 0,
        };

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            position,
            identity: file_identity(&meta),
            pending: Vec::new(),
        })
    }

    /// Read every complete line appended since the last call.
    ///
    /// A trailing line without a newline is held back until it is finished.
    pub async fn read_lines(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let n = self.reader.read_until(b'\n', &mut self.pending).await?;
            if n == 0 {
                break;
            }
            self.position += n as u64;

            if self.pending.last() == Some(&b'\n') {
                let line = String::from_utf8_lossy(&self.pending);
                lines.push(line.trim_end_matches(['\n', '\r']).to_string());
                self.pending.clear();
            }
        }
        Ok(lines)
    }

    /// Compare the path on disk with the open handle.
    pub async fn check_source(&self) -> io::Result<SourceChange> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SourceChange::Missing),
            Err(e) => return Err(e),
        };

        let identity = file_identity(&meta);
        if identity.is_some() && self.identity.is_some() && identity != self.identity {
            return Ok(SourceChange::Replaced);
        }
        if meta.len() < self.position {
            return Ok(SourceChange::Truncated);
        }
        Ok(SourceChange::Unchanged)
    }

    /// Bytes consumed from the current file.
    pub fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(unix)]
fn file_identity(meta: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_identity(_meta: &Metadata) -> Option<(u64, u64)> {
    None
}
