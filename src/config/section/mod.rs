//! Configuration sections of `quire.toml`.

mod auth;
mod lock;
mod render;
mod serve;
mod site;

pub use auth::AuthConfig;
pub use lock::LockConfig;
pub use render::RenderConfig;
pub use serve::ServeConfig;
pub use site::SiteConfig;
