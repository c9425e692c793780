//! Page rendering pipeline.
//!
//! ```text
//! source (.md / .html)
//!   ─► markdown::to_html      (Markdown only)
//!   ─► Document::parse        (owned tree)
//!   ─► LinkAnnotator          (broken / external classes)
//!   ─► Document::render       (optionally minified)
//! ```

pub mod dom;
pub mod markdown;
pub mod minify;
pub mod render;
pub mod transform;
pub mod visit;

pub use dom::{Document, ParseError};
pub use markdown::MarkdownOptions;
pub use render::RenderOptions;
pub use transform::LinkAnnotator;
