//! In-place rewrites of rendered page documents.

mod link;

pub use link::LinkAnnotator;
