//! Diagram rendering engine, the core feature of InMermaid.
//!
//! Turns Mermaid source text into a PNG through a headless browser:
//! the source is embedded into a self-contained HTML page that loads
//! Mermaid.js, the page is opened in Chrome, and the rendered SVG is
//! screenshotted and post-processed.
//!
//! Outcomes (success and failure alike) are cached so repeated requests
//! for the same source never touch the browser twice.

pub mod cache;
pub mod chrome;
pub mod image;
pub mod page;

pub use chrome::ChromeRenderer;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config;

/// Errors that can occur while rendering a diagram.
///
/// Display strings are user-facing: handlers forward them verbatim in
/// error replies and inline error articles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Mermaid.js rejected the diagram source
    #[error("Mermaid error: {0}")]
    Mermaid(String),

    /// The page never signalled completion within the render timeout
    #[error("Failed to render diagram: timeout")]
    Timeout,

    /// The page signalled success but no SVG element was found
    #[error("Failed to find rendered diagram")]
    MissingDiagram,

    /// The SVG element exists but its bounding box could not be read
    #[error("Failed to get diagram dimensions")]
    MissingDimensions,

    /// Browser-side failure: launch, tab creation, navigation, protocol
    #[error("Rendering error: {0}")]
    Browser(String),
}

/// A validated rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// PNG bytes, already flattened onto a white background
    pub png: Vec<u8>,
}

/// The result of one render attempt. Failures are first-class values
/// because they are cached and replayed just like successes.
pub type RenderOutcome = Result<Rendered, RenderError>;

/// Rendering backend used by the Telegram handlers.
///
/// The production implementation is [`chrome::ChromeRenderer`]; tests
/// substitute stubs that return canned outcomes.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    /// Render Mermaid source to a PNG, or explain why it failed.
    async fn render(&self, code: &str) -> RenderOutcome;
}

/// Check if a Chrome/Chromium binary is available
pub fn check_chrome() -> bool {
    if let Some(path) = config::CHROME_PATH.as_deref() {
        return std::path::Path::new(path).exists();
    }
    headless_chrome::browser::default_executable().is_ok()
}

/// Generate a temporary path for a render page
pub fn temp_page_path() -> std::path::PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let rand: u32 = rand::random();
    std::path::PathBuf::from(format!(
        "{}/mermaid_page_{:x}_{:x}.html",
        &*config::TEMP_FILES_DIR,
        timestamp,
        rand
    ))
}
