//! InMermaid - Telegram bot that renders Mermaid diagram source into PNG
//! images.
//!
//! Diagrams are rendered by loading Mermaid.js into a headless Chrome page
//! and screenshotting the resulting SVG. The bot answers direct messages
//! with the image and serves inline queries via cached Telegram file ids.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging and the inline throttle
//! - `render`: page template, headless Chrome pipeline and result cache
//! - `telegram`: bot construction, dispatcher handlers and file id cache

pub mod cli;
pub mod core;
pub mod render;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use render::{ChromeRenderer, DiagramRenderer, RenderError, Rendered};
pub use telegram::{create_bot, schema, Bot, HandlerDeps};
