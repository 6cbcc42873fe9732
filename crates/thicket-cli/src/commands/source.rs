//! Loading source text from files, stdin or the command line.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::CliError;

/// Files at least this large are mapped rather than read.
const MMAP_THRESHOLD: u64 = 1 << 20;

/// Where the source comes from: a positional path (`-` for stdin) or `-s`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceInput {
    pub path: Option<PathBuf>,
    pub text: Option<String>,
}

impl SourceInput {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: Some(text.into()),
        }
    }

    /// The file path, unless the source is stdin or inline.
    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref().filter(|p| p.as_os_str() != "-")
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        match (&self.text, &self.path) {
            (Some(_), _) => "<inline>".to_owned(),
            (None, Some(path)) if path.as_os_str() == "-" => "<stdin>".to_owned(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => "<none>".to_owned(),
        }
    }

    pub fn load(&self) -> Result<SourceText, CliError> {
        match (&self.text, &self.path) {
            (Some(text), _) => Ok(SourceText::Owned(text.clone().into_bytes())),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut buf = Vec::new();
                io::stdin()
                    .read_to_end(&mut buf)
                    .map_err(|source| CliError::Read {
                        path: path.clone(),
                        source,
                    })?;
                Ok(SourceText::Owned(buf))
            }
            (None, Some(path)) => load_file(path),
            (None, None) => Err(CliError::SourceRequired),
        }
    }
}

fn load_file(path: &Path) -> Result<SourceText, CliError> {
    let read_error = |source| CliError::Read {
        path: path.to_owned(),
        source,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let len = file.metadata().map_err(read_error)?.len();
    if len >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and lives no longer than this
        // command; a file truncated underneath it is the caller's problem,
        // as with any tool reading a file that is being rewritten.
        let map = unsafe { Mmap::map(&file) }.map_err(read_error)?;
        tracing::debug!(bytes = len, "mapped {}", path.display());
        return Ok(SourceText::Mapped(map));
    }
    let mut buf = Vec::with_capacity(len as usize);
    file.read_to_end(&mut buf).map_err(read_error)?;
    Ok(SourceText::Owned(buf))
}

/// Source bytes. Parsing works on bytes; invalid UTF-8 only matters when
/// text is shown.
pub enum SourceText {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl SourceText {
    pub fn as_bytes(&self) -> &[u8] {
        self
    }

    /// The text for display, with invalid UTF-8 replaced.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self)
    }
}

impl Deref for SourceText {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            SourceText::Owned(bytes) => bytes,
            SourceText::Mapped(map) => map,
        }
    }
}
