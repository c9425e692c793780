//! Cross-cutting types shared by the server and its components.

pub mod error;
mod state;

pub use error::{MAX_LOCK_TOKEN, MalformedRequest, RenderError, WikiError};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
