//! Sandboxed page resolution.
//!
//! Maps logical page names onto files inside a fixed root directory.
//!
//! Containment is checked in two steps:
//! 1. Lexical: every name segment must be a plain file name. `..`, path
//!    prefixes, root components, `\` and NUL are rejected outright.
//! 2. Physical: the joined path is canonicalized (symlinks resolved) and must
//!    stay strictly inside the canonical root.
//!
//! Both failures are reported as [`ResolveError::Traversal`], never as
//! [`ResolveError::NotFound`].

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::PageName;

/// Page resolution failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("`{name}` escapes the wiki root")]
    Traversal { name: String },

    #[error("`{name}` not found")]
    NotFound { name: String },

    #[error("failed to read `{name}`")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Whether this error is a blocked escape attempt.
    pub const fn is_traversal(&self) -> bool {
        matches!(self, Self::Traversal { .. })
    }

    fn traversal(name: &str) -> Self {
        Self::Traversal {
            name: name.to_string(),
        }
    }

    fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }
}

/// The extension that satisfied a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileExt {
    /// `<name>.md`
    Markdown,
    /// `<name>.html`
    Html,
    /// `<name>` as given (static assets, explicit extensions).
    Verbatim,
}

impl FileExt {
    /// Fallback order for page lookups: Markdown wins over HTML.
    pub const FALLBACK: [Self; 3] = [Self::Markdown, Self::Html, Self::Verbatim];

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Markdown => ".md",
            Self::Html => ".html",
            Self::Verbatim => "",
        }
    }
}

/// A file read from inside the root.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub contents: Vec<u8>,
    pub ext: FileExt,
    /// Canonical path of the file (always inside the root).
    pub path: PathBuf,
}

/// What a name points at on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Resolves page names to files inside a canonical root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// Read `name` verbatim, without extension substitution.
    pub fn resolve(&self, name: &str) -> Result<ResolvedFile, ResolveError> {
        self.resolve_as(name, FileExt::Verbatim)
    }

    /// Read `name.md`, then `name.html`, then `name`.
    ///
    /// Directory names (empty or ending in `/`) resolve to their index.
    /// A traversal attempt stops the search immediately.
    pub fn resolve_with_fallback(&self, name: &PageName) -> Result<ResolvedFile, ResolveError> {
        self.with_fallback(name, |candidate, ext| self.resolve_as(candidate, ext))
    }

    /// Resolve the `index` page of directory `dir`.
    pub fn resolve_index(&self, dir: &PageName) -> Result<ResolvedFile, ResolveError> {
        self.resolve_with_fallback(&dir.index())
    }

    /// Whether `name` resolves as a page or as a directory with an index,
    /// without reading any contents.
    pub fn page_exists(&self, name: &PageName) -> bool {
        let probe = |candidate: &str, _: FileExt| self.probe(candidate);
        self.with_fallback(name, probe).is_ok() || self.with_fallback(&name.index(), probe).is_ok()
    }

    /// Run `open` over the fallback candidates of `name`, first success wins.
    fn with_fallback<T>(
        &self,
        name: &PageName,
        open: impl Fn(&str, FileExt) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        if name.segments().any(|s| !is_plain_segment(s)) {
            return Err(ResolveError::traversal(name.as_str()));
        }
        if name.is_dir() {
            return self.with_fallback(&name.index(), open);
        }

        let mut io_error = None;
        for ext in FileExt::FALLBACK {
            match open(&name.with_suffix(ext.suffix()), ext) {
                Ok(found) => return Ok(found),
                Err(e @ ResolveError::Traversal { .. }) => return Err(e),
                Err(e @ ResolveError::Io { .. }) => {
                    io_error.get_or_insert(e);
                }
                Err(ResolveError::NotFound { .. }) => {}
            }
        }

        Err(io_error.unwrap_or_else(|| ResolveError::not_found(name.as_str())))
    }

    /// Sandboxed stat: is `name` a file or a directory?
    pub fn kind(&self, name: &str) -> Result<EntryKind, ResolveError> {
        let path = self.locate(name)?;
        if path.is_dir() {
            Ok(EntryKind::Directory)
        } else {
            Ok(EntryKind::File)
        }
    }

    fn resolve_as(&self, name: &str, ext: FileExt) -> Result<ResolvedFile, ResolveError> {
        let path = self.probe(name)?;

        let contents = fs::read(&path).map_err(|source| ResolveError::Io {
            name: name.to_string(),
            source,
        })?;

        Ok(ResolvedFile {
            contents,
            ext,
            path,
        })
    }

    /// Locate `name` and require it to be a regular file.
    fn probe(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let path = self.locate(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResolveError::not_found(name))
        }
    }

    /// Join `name` onto the root and prove the result stays inside it.
    fn locate(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let mut path = self.root.clone();
        for segment in name.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if !is_plain_segment(segment) {
                return Err(ResolveError::traversal(name));
            }
            path.push(segment);
        }

        let canonical = match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) =>
            {
                return Err(ResolveError::not_found(name));
            }
            Err(source) => {
                return Err(ResolveError::Io {
                    name: name.to_string(),
                    source,
                });
            }
        };

        // Component-wise prefix: `/wiki2` is not inside `/wiki`.
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(ResolveError::traversal(name))
        }
    }
}

/// A segment is plain when it is exactly one normal path component.
fn is_plain_segment(segment: &str) -> bool {
    if segment.contains(['\\', '\0']) {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
