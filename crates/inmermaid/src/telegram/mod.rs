//! Telegram layer: bot construction, dispatcher handlers and the inline
//! file id cache.

pub mod bot;
pub mod cache;
pub mod handlers;

pub use bot::{create_bot, setup_bot_commands, Bot, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
