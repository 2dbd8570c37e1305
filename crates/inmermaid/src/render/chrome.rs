//! Headless-Chrome rendering pipeline.
//!
//! One browser process serves the whole bot. Every render writes the
//! generated page to a temp file, opens it in a fresh tab, polls the
//! completion flags the page sets, screenshots the SVG region, and closes
//! the tab. The `headless_chrome` API is synchronous, so the tab work runs
//! on the blocking pool with an async timeout around it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::sync::Semaphore;

use crate::core::config;
use crate::render::cache;
use crate::render::image::flatten_onto_white;
use crate::render::page::render_page;
use crate::render::{DiagramRenderer, RenderError, RenderOutcome, Rendered, temp_page_path};

/// Production renderer backed by one long-lived headless Chrome.
pub struct ChromeRenderer {
    browser: Browser,
    permits: Arc<Semaphore>,
}

impl ChromeRenderer {
    /// Launch the browser process.
    ///
    /// Honors `CHROME_PATH` when set, otherwise lets `headless_chrome`
    /// locate a system Chrome/Chromium.
    pub fn launch() -> Result<Self, RenderError> {
        let mut builder = LaunchOptions::default_builder();
        builder
            .headless(true)
            .sandbox(false)
            .args(vec![std::ffi::OsStr::new("--disable-setuid-sandbox")])
            .window_size(Some((
                config::render::VIEWPORT_WIDTH,
                config::render::VIEWPORT_HEIGHT,
            )))
            // The crate's watchdog kills an idle browser after 30s by
            // default, which would take the renderer down between requests.
            .idle_browser_timeout(Duration::MAX);

        if let Some(path) = config::CHROME_PATH.as_deref() {
            builder.path(Some(path.into()));
        }

        let options = builder.build().map_err(|e| RenderError::Browser(e.to_string()))?;
        let browser = Browser::new(options).map_err(|e| RenderError::Browser(e.to_string()))?;

        log::info!("Mermaid renderer started");
        Ok(Self {
            browser,
            permits: Arc::new(Semaphore::new(config::render::MAX_CONCURRENT_RENDERS)),
        })
    }

    async fn render_uncached(&self, code: &str) -> Result<Rendered, RenderError> {
        let html = render_page(code);
        let path = temp_page_path();
        tokio::fs::write(&path, &html)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        let url = format!("file://{}", path.display());
        let browser = self.browser.clone();
        let task = tokio::task::spawn_blocking(move || render_in_tab(&browser, &url));

        // Grace on top of the in-page deadline so the page-side timeout is
        // the one that normally fires and gets reported.
        let overall = config::render::timeout() + Duration::from_secs(5);
        let result = match tokio::time::timeout(overall, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(RenderError::Browser(join_error.to_string())),
            Err(_) => Err(RenderError::Timeout),
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to remove render page {}: {}", path.display(), e);
        }

        let png = result?;
        Ok(Rendered {
            png: flatten_onto_white(&png),
        })
    }
}

#[async_trait]
impl DiagramRenderer for ChromeRenderer {
    async fn render(&self, code: &str) -> RenderOutcome {
        let key = cache::cache_key(code);
        if let Some(outcome) = cache::get_cached_outcome(&key).await {
            log::info!("Returning cached result");
            return outcome;
        }

        let permit = self.permits.clone().acquire_owned().await;
        if permit.is_err() {
            return Err(RenderError::Browser("render semaphore closed".to_string()));
        }

        let outcome = self.render_uncached(code).await;
        if let Err(ref e) = outcome {
            log::error!("Error rendering Mermaid diagram: {}", e);
        }
        cache::cache_outcome(key, outcome.clone()).await;
        outcome
    }
}

/// Everything that happens inside one tab, on the blocking pool.
fn render_in_tab(browser: &Browser, url: &str) -> Result<Vec<u8>, RenderError> {
    let tab = browser.new_tab().map_err(|e| RenderError::Browser(e.to_string()))?;
    let result = drive_page(&tab, url);
    if let Err(e) = tab.close(true) {
        log::warn!("Failed to close render tab: {}", e);
    }
    result
}

fn drive_page(tab: &Tab, url: &str) -> Result<Vec<u8>, RenderError> {
    tab.navigate_to(url).map_err(|e| RenderError::Browser(e.to_string()))?;
    tab.wait_until_navigated()
        .map_err(|e| RenderError::Browser(e.to_string()))?;

    wait_for_completion(tab)?;

    if let Some(message) = mermaid_error(tab)? {
        return Err(RenderError::Mermaid(message));
    }

    let rect = diagram_rect(tab)?;
    tab.capture_screenshot(
        Page::CaptureScreenshotFormatOption::Png,
        None,
        Some(clip_with_padding(&rect)),
        true,
    )
    .map_err(|e| RenderError::Browser(e.to_string()))
}

/// Poll until the page signals success or failure, or the deadline passes.
fn wait_for_completion(tab: &Tab) -> Result<(), RenderError> {
    let deadline = std::time::Instant::now() + config::render::timeout();
    loop {
        let done = tab
            .evaluate(
                "window.mermaidReady === true || window.mermaidError !== undefined",
                false,
            )
            .map_err(|e| RenderError::Browser(e.to_string()))?
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if done {
            return Ok(());
        }
        if std::time::Instant::now() >= deadline {
            return Err(RenderError::Timeout);
        }
        std::thread::sleep(config::render::poll_interval());
    }
}

/// Read `window.mermaidError`, treating undefined, null, and the empty
/// string as "no error".
fn mermaid_error(tab: &Tab) -> Result<Option<String>, RenderError> {
    let value = tab
        .evaluate("window.mermaidError", false)
        .map_err(|e| RenderError::Browser(e.to_string()))?
        .value;

    let message = match value {
        None => None,
        Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    };
    Ok(message.filter(|m| !m.is_empty()))
}

struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Measure the rendered SVG in page coordinates.
fn diagram_rect(tab: &Tab) -> Result<Rect, RenderError> {
    let expression = r#"(() => {
        const el = document.querySelector('#mermaid-container svg');
        if (!el) return '';
        const r = el.getBoundingClientRect();
        return JSON.stringify({x: r.x, y: r.y, width: r.width, height: r.height});
    })()"#;

    let value = tab
        .evaluate(expression, false)
        .map_err(|e| RenderError::Browser(e.to_string()))?
        .value;

    let json = value
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or(RenderError::MissingDiagram)?;
    parse_rect(&json)
}

fn parse_rect(json: &str) -> Result<Rect, RenderError> {
    if json.is_empty() {
        return Err(RenderError::MissingDiagram);
    }
    let value: serde_json::Value = serde_json::from_str(json).map_err(|_| RenderError::MissingDimensions)?;
    let field = |name: &str| value.get(name).and_then(serde_json::Value::as_f64);

    match (field("x"), field("y"), field("width"), field("height")) {
        (Some(x), Some(y), Some(width), Some(height)) if width > 0.0 && height > 0.0 => Ok(Rect {
            x,
            y,
            width,
            height,
        }),
        _ => Err(RenderError::MissingDimensions),
    }
}

/// Screenshot clip: the SVG box plus padding, clamped to the page origin.
fn clip_with_padding(rect: &Rect) -> Page::Viewport {
    let padding = config::render::PADDING_PX;
    Page::Viewport {
        x: (rect.x - padding).max(0.0),
        y: (rect.y - padding).max(0.0),
        width: rect.width + 2.0 * padding,
        height: rect.height + 2.0 * padding,
        scale: 1.0,
    }
}
