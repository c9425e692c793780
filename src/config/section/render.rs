//! `[render]` section configuration.
//!
//! ```toml
//! [render]
//! minify = true    # Minify pages, CSS and JS before sending
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub minify: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { minify: true }
    }
}
