//! `[site]` section configuration.
//!
//! ```toml
//! [site]
//! title = "wiki"    # <title> of every page ("wiki: notes/todo" below the root)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "wiki".to_string(),
        }
    }
}
