//! Line-oriented file and reader source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{SizeHint, Source};
use crate::error::Result;

/// A source that yields the lines of a file or reader.
///
/// Line terminators (`\n` or `\r\n`) are stripped. Reads block the calling
/// lane; the source never splits.
///
/// # Example
///
/// ```rust,no_run
/// use rivulet::source::{LineSource, Source};
///
/// let mut src = LineSource::open("input.txt")?;
/// while let Some(line) = src.produce()? {
///     println!("{line}");
/// }
/// # Ok::<(), rivulet::Error>(())
/// ```
pub struct LineSource {
    name: String,
    path: Option<PathBuf>,
    reader: Option<Box<dyn BufRead + Send>>,
    lines_read: u64,
}

impl LineSource {
    /// Create a LineSource that will read from the given path.
    ///
    /// The file is not opened until the first call to `produce()`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("lines:{}", path.display());
        Self {
            name,
            path: Some(path),
            reader: None,
            lines_read: 0,
        }
    }

    /// Open the file immediately.
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut source = Self::new(path);
        source.ensure_open()?;
        Ok(source)
    }

    /// Read lines from an already-open reader.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self {
            name: "lines:reader".to_string(),
            path: None,
            reader: Some(Box::new(reader)),
            lines_read: 0,
        }
    }

    /// Get the path being read, if this source reads a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the number of lines produced so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    fn ensure_open(&mut self) -> Result<&mut Box<dyn BufRead + Send>> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => {
                // `new` and `from_reader` always leave one of the two set.
                let path = self.path.as_ref().ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "line source has no input")
                })?;
                Box::new(BufReader::new(File::open(path)?)) as Box<dyn BufRead + Send>
            }
        };
        Ok(self.reader.insert(reader))
    }
}

impl Source for LineSource {
    type Item = String;

    fn produce(&mut self) -> Result<Option<String>> {
        let reader = self.ensure_open()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        self.lines_read += 1;
        Ok(Some(line))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Unknown
    }

    fn name(&self) -> &str {
        &self.name
    }
}
