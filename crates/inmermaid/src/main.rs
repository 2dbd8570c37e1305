use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::{interval, sleep};

use inmermaid::cli::{Cli, Commands};
use inmermaid::core::{config, init_logger, log_renderer_configuration};
use inmermaid::render::{self, cache as render_cache, ChromeRenderer, DiagramRenderer};
use inmermaid::telegram::{cache as file_id_cache, create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the bot or the one-shot renderer.
///
/// # Errors
/// Returns an error if initialization fails (logging, browser launch, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler to catch panics in dispatcher
    // This allows us to log the panic and continue working instead of terminating
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    // Load environment variables from .env if present
    let _ = dotenv();

    match cli.command {
        Some(Commands::Render { input, output }) => run_render(input, output).await,
        None => run_bot().await,
    }
}

/// Render one diagram from a file or stdin and write the PNG
async fn run_render(input: String, output: PathBuf) -> Result<()> {
    use std::io::Read;

    let source = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        tokio::fs::read_to_string(&input).await?
    };

    let code = source.trim();
    if code.is_empty() {
        return Err(anyhow::anyhow!("no diagram source provided"));
    }

    if !render::check_chrome() {
        return Err(anyhow::anyhow!(
            "no Chrome executable found; install Chrome/Chromium or set CHROME_PATH"
        ));
    }

    let renderer = ChromeRenderer::launch()?;
    let rendered = renderer.render(code).await?;
    tokio::fs::write(&output, &rendered.png).await?;
    println!("Wrote {} ({} bytes)", output.display(), rendered.png.len());

    Ok(())
}

/// Run the Telegram bot
async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();

    if config::BOT_TOKEN.is_empty() {
        log::error!("BOT_TOKEN not found in environment variables!");
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }

    log::info!("Starting Mermaid renderer...");
    log_renderer_configuration();

    let renderer: Arc<dyn DiagramRenderer> = Arc::new(ChromeRenderer::launch()?);

    // Periodic cleanup of expired render results and file ids
    tokio::spawn(async {
        let mut interval = interval(config::cache::cleanup_interval());
        loop {
            interval.tick().await;
            let removed = render_cache::cleanup_render_cache().await + file_id_cache::cleanup_file_id_cache();
            if removed > 0 {
                log::info!("Cache cleanup removed {} expired entries", removed);
            }
            let stats = render_cache::render_cache_stats().await;
            log::debug!(
                "Render cache: {} entries, {} hits, {} misses ({:.1}% hit rate)",
                stats.size,
                stats.hits,
                stats.misses,
                stats.hit_rate
            );
        }
    });

    // Create bot instance
    let bot = create_bot()?;

    // Get bot information for help texts
    // Retry if Bot API is still initializing (returns "restart" error)
    let bot_info = {
        let mut startup_retry = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    let err_str = e.to_string();
                    let is_retryable = err_str.contains("restart")
                        || err_str.contains("network")
                        || err_str.contains("connection")
                        || err_str.contains("timed out")
                        || err_str.contains("Connection refused");

                    startup_retry += 1;
                    if startup_retry >= config::retry::MAX_STARTUP_ATTEMPTS || !is_retryable {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} retries: {}",
                            startup_retry,
                            e
                        ));
                    }

                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in {} seconds...",
                        startup_retry,
                        config::retry::MAX_STARTUP_ATTEMPTS,
                        err_str,
                        config::retry::STARTUP_RETRY_DELAY_SECS
                    );
                    sleep(config::retry::startup_delay()).await;
                }
            }
        }
    };
    let bot_username = bot_info.username().to_string();
    log::info!("Bot started: @{}", bot_username);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let handler_deps = HandlerDeps::new(renderer, bot_username);
    let handler = schema(handler_deps);

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    let init_elapsed = bot_init_start.elapsed();
    log::info!("Bot initialization complete in {:.2}s", init_elapsed.as_secs_f64());
    log::info!("Starting bot polling...");

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Create a new dispatcher in a separate task to isolate panics
        // "TX is dead" panics will be caught via the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            // Create polling listener that drops pending updates on start
            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    let panic_msg = join_err.to_string();
                    log::error!("Dispatcher panicked: {}", panic_msg);

                    if panic_msg.contains("TX is dead") || panic_msg.contains("SendError") {
                        log::warn!("Detected TX is dead panic - will reconnect...");
                    }

                    if retry_count < max_retries {
                        retry_count += 1;
                        log::info!(
                            "Retrying dispatcher connection after panic (attempt {}/{})...",
                            retry_count,
                            max_retries
                        );
                        exponential_backoff(retry_count).await;
                    } else {
                        log::error!("Max retries reached after panic. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }
    }

    log::info!("Shutting down...");
    Ok(())
}

/// Exponential backoff delay for retries
async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
