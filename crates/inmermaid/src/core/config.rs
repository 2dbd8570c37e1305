use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: bot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "bot.log".to_string()));

/// Explicit Chrome/Chromium binary path for the renderer
/// Read from CHROME_PATH environment variable
/// If unset, the browser is located through the usual lookup paths
pub static CHROME_PATH: Lazy<Option<String>> = Lazy::new(|| {
    env::var("CHROME_PATH")
        .ok()
        .and_then(|s| if s.trim().is_empty() { None } else { Some(s) })
});

/// Temporary files directory for generated render pages
/// Read from TEMP_FILES_DIR environment variable
/// Default: /tmp
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "/tmp".to_string()));

/// Rendering configuration
pub mod render {
    use super::Duration;

    /// Browser viewport width in pixels
    pub const VIEWPORT_WIDTH: u32 = 1200;

    /// Browser viewport height in pixels
    pub const VIEWPORT_HEIGHT: u32 = 800;

    /// How long to wait for Mermaid to signal success or failure (in seconds)
    pub const TIMEOUT_SECS: u64 = 10;

    /// Interval between readiness checks on the page (in milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// Whitespace kept around the diagram in the screenshot (in pixels)
    pub const PADDING_PX: f64 = 20.0;

    /// Maximum number of browser tabs rendering at the same time
    pub const MAX_CONCURRENT_RENDERS: usize = 2;

    /// Mermaid.js bundle loaded by the render page
    /// Pinned to a known-good version; bumping it changes diagram output
    pub const MERMAID_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@10.6.1/dist/mermaid.min.js";

    /// Render timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }

    /// Readiness poll interval duration
    pub fn poll_interval() -> Duration {
        Duration::from_millis(POLL_INTERVAL_MS)
    }
}

/// Cache configuration
pub mod cache {
    use super::Duration;

    /// How long a render outcome (success or failure) stays cached (in seconds)
    pub const RENDER_TTL_SECS: u64 = 3600;

    /// How long an uploaded Telegram file_id stays cached (in seconds)
    /// file_ids remain valid on Telegram's side far longer than this
    pub const FILE_ID_TTL_SECS: u64 = 86_400;

    /// Interval between expired-entry sweeps (in seconds)
    pub const CLEANUP_INTERVAL_SECS: u64 = 600;

    /// Render cache TTL duration
    pub fn render_ttl() -> Duration {
        Duration::from_secs(RENDER_TTL_SECS)
    }

    /// file_id cache TTL duration
    pub fn file_id_ttl() -> Duration {
        Duration::from_secs(FILE_ID_TTL_SECS)
    }

    /// Cleanup sweep interval duration
    pub fn cleanup_interval() -> Duration {
        Duration::from_secs(CLEANUP_INTERVAL_SECS)
    }
}

/// Inline mode configuration
pub mod inline {
    use super::Duration;

    /// Maximum inline renders started per throttle window
    pub const THROTTLE_MAX_CALLS: usize = 2;

    /// Throttle window length (in seconds)
    pub const THROTTLE_WINDOW_SECS: u64 = 1;

    /// Telegram-side cache_time for the empty-query help answer (in seconds)
    pub const HELP_CACHE_SECS: u32 = 300;

    /// Telegram-side cache_time for rendered results and syntax errors (in seconds)
    pub const RESULT_CACHE_SECS: u32 = 60;

    /// Telegram-side cache_time for internal-error answers (in seconds)
    /// Kept short so a transient failure clears quickly
    pub const SYSTEM_ERROR_CACHE_SECS: u32 = 10;

    /// Throttle window duration
    pub fn throttle_window() -> Duration {
        Duration::from_secs(THROTTLE_WINDOW_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    /// Generous enough for photo uploads over slow links
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration for startup and dispatcher recovery
pub mod retry {
    use super::Duration;

    /// Maximum get_me attempts while waiting for Telegram to become reachable
    pub const MAX_STARTUP_ATTEMPTS: u32 = 60;

    /// Delay between startup attempts (in seconds)
    pub const STARTUP_RETRY_DELAY_SECS: u64 = 5;

    /// Maximum number of dispatcher restarts after a panic
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Base for exponential backoff between dispatcher restarts
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

    /// Startup retry delay duration
    pub fn startup_delay() -> Duration {
        Duration::from_secs(STARTUP_RETRY_DELAY_SECS)
    }
}
