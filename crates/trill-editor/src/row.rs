//! Row buffer — the loaded file as an ordered list of lines.
//!
//! A [`Row`] holds the raw bytes of one line without its terminator. Bytes,
//! not `String`: the viewer displays whatever is in the file and slices rows
//! by byte column, so there is no UTF-8 requirement on input.
//!
//! [`RowBuffer`] is append-only. Rows are created once when the file is
//! loaded and live until the process exits.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to load a file into a [`RowBuffer`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("cannot open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the file failed part-way.
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One line of text, stored without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    chars: Vec<u8>,
}

impl Row {
    /// Create a row holding a copy of `bytes`.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            chars: bytes.to_vec(),
        }
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the row is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The row's content.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.chars
    }

    /// Up to `width` bytes starting at column `start`.
    ///
    /// Returns an empty slice when `start` is at or past the end.
    #[must_use]
    pub fn visible(&self, start: usize, width: usize) -> &[u8] {
        let len = self.chars.len();
        let from = start.min(len);
        let to = start.saturating_add(width).min(len);
        &self.chars[from..to]
    }
}

// ---------------------------------------------------------------------------
// RowBuffer
// ---------------------------------------------------------------------------

/// Every row of the loaded file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBuffer {
    rows: Vec<Row>,
}

impl RowBuffer {
    /// An empty buffer (no file loaded).
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Load `path`, one row per line.
    ///
    /// # Errors
    ///
    /// [`LoadError::Open`] if the file can't be opened, [`LoadError::Read`]
    /// if reading it fails.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let rows = Self::from_reader(BufReader::new(file)).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), rows = rows.len(), "file loaded");
        Ok(rows)
    }

    /// Read lines from `reader` until EOF.
    ///
    /// Every trailing `\n` and `\r` is stripped from each line, so LF, CRLF,
    /// and CR-before-LF files all load the same way. A final line without a
    /// terminator still becomes a row.
    ///
    /// # Errors
    ///
    /// Propagates any read error.
    pub fn from_reader(mut reader: impl BufRead) -> io::Result<Self> {
        let mut rows = Self::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let mut len = line.len();
            while len > 0 && matches!(line[len - 1], b'\n' | b'\r') {
                len -= 1;
            }
            rows.append_row(&line[..len]);
        }

        Ok(rows)
    }

    /// Append one row. The bytes are stored as given.
    pub fn append_row(&mut self, bytes: &[u8]) {
        self.rows.push(Row::new(bytes));
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Iterate rows in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl<T: AsRef<[u8]>> FromIterator<T> for RowBuffer {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut rows = Self::new();
        for line in iter {
            rows.append_row(line.as_ref());
        }
        rows
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
