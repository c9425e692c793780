//! Pages: logical names and their sandboxed resolution to files.
//!
//! - [`name`]: `PageName` (normalized, root-relative)
//! - [`resolve`]: `PathResolver` (extension fallback, traversal protection)

mod name;
mod resolve;

pub use name::PageName;
pub use resolve::{EntryKind, FileExt, PathResolver, ResolveError, ResolvedFile};
