//! Logical page names.
//!
//! A [`PageName`] is the slash-delimited identifier of a page relative to the
//! wiki root. It never carries a leading slash; a trailing slash marks a
//! directory request (whose content is the directory's `index` page).

use std::fmt;
use std::sync::Arc;

/// Normalized, root-relative page name.
///
/// Invariants:
/// - no leading `/`, no empty or `.` segments
/// - trailing `/` only for directory names
/// - the root directory is the empty name
///
/// `..` segments are preserved verbatim so the resolver can reject them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageName(Arc<str>);

impl PageName {
    /// Normalize a raw (already percent-decoded) path into a page name.
    pub fn new(raw: &str) -> Self {
        let is_dir = raw.ends_with('/');
        let segments: Vec<&str> = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        if segments.is_empty() {
            return Self::root();
        }

        let mut name = segments.join("/");
        if is_dir {
            name.push('/');
        }
        Self(Arc::from(name))
    }

    /// The root directory.
    pub fn root() -> Self {
        Self(Arc::from(""))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name addresses a directory (root included).
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.0.is_empty() || self.0.ends_with('/')
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments, without the directory marker.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Whether any segment is a dotfile (`.auth`, `notes/.draft`).
    ///
    /// `..` is not hidden; the resolver rejects it as traversal.
    pub fn is_hidden(&self) -> bool {
        self.segments().any(|s| s.starts_with('.') && s != "..")
    }

    /// The name with its directory marker removed (`notes/` → `notes`).
    pub fn without_trailing_slash(&self) -> Self {
        match self.0.strip_suffix('/') {
            Some(stripped) => Self(Arc::from(stripped)),
            None => self.clone(),
        }
    }

    /// Treat this name as a directory and return `<dir>/index`.
    pub fn index(&self) -> Self {
        let base = self.0.trim_end_matches('/');
        if base.is_empty() {
            Self(Arc::from("index"))
        } else {
            Self(Arc::from(format!("{base}/index")))
        }
    }

    /// Append a literal suffix to the last segment (`notes/todo` + `.md`).
    pub fn with_suffix(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }

    /// Absolute URL path for this page (`notes/todo` → `/notes/todo`).
    pub fn to_url(&self) -> String {
        format!("/{}", self.0)
    }

    /// URL of the directory containing this page.
    ///
    /// `a/b` and `a/b/` both live in `/a/`; the root has no parent.
    pub fn parent_url(&self) -> Option<String> {
        if self.is_root() {
            return None;
        }
        let trimmed = self.0.trim_end_matches('/');
        Some(match trimmed.rsplit_once('/') {
            Some((parent, _)) => format!("/{parent}/"),
            None => "/".to_string(),
        })
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(PageName::new("/notes/todo").as_str(), "notes/todo");
        assert_eq!(PageName::new("notes//todo").as_str(), "notes/todo");
        assert_eq!(PageName::new("/./notes/./todo").as_str(), "notes/todo");
        assert_eq!(PageName::new("/notes/").as_str(), "notes/");
        assert_eq!(PageName::new("/").as_str(), "");
        assert_eq!(PageName::new("").as_str(), "");
    }

    #[test]
    fn test_parent_segments_are_kept() {
        assert_eq!(PageName::new("/a/../b").as_str(), "a/../b");
    }

    #[test]
    fn test_is_dir() {
        assert!(PageName::root().is_dir());
        assert!(PageName::new("/notes/").is_dir());
        assert!(!PageName::new("/notes").is_dir());
    }

    #[test]
    fn test_index() {
        assert_eq!(PageName::root().index().as_str(), "index");
        assert_eq!(PageName::new("notes/").index().as_str(), "notes/index");
        assert_eq!(PageName::new("notes").index().as_str(), "notes/index");
    }

    #[test]
    fn test_parent_url() {
        assert_eq!(PageName::root().parent_url(), None);
        assert_eq!(PageName::new("/todo").parent_url().as_deref(), Some("/"));
        assert_eq!(PageName::new("/a/b").parent_url().as_deref(), Some("/a/"));
        assert_eq!(PageName::new("/a/b/").parent_url().as_deref(), Some("/a/"));
    }

    #[test]
    fn test_is_hidden() {
        assert!(PageName::new("/.auth").is_hidden());
        assert!(PageName::new("/notes/.header").is_hidden());
        assert!(PageName::new("/.git/").is_hidden());
        assert!(!PageName::new("/notes/todo.md").is_hidden());
        assert!(!PageName::new("/../x").is_hidden());
        assert!(!PageName::new("/./x").is_hidden());
        assert!(!PageName::root().is_hidden());
    }

    #[test]
    fn test_without_trailing_slash() {
        assert_eq!(
            PageName::new("/notes/").without_trailing_slash().as_str(),
            "notes"
        );
        assert_eq!(PageName::new("/notes").without_trailing_slash().as_str(), "notes");
    }
}
