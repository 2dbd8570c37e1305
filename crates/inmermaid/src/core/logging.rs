//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Renderer configuration validation and logging

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the renderer configuration at application startup
///
/// Validates and logs:
/// - CHROME_PATH existence when set
/// - Fallback to automatic browser discovery otherwise
pub fn log_renderer_configuration() {
    match *config::CHROME_PATH {
        Some(ref chrome_path) => {
            if std::path::Path::new(chrome_path).exists() {
                log::info!("✅ CHROME_PATH: {}", chrome_path);
            } else {
                log::error!("❌ CHROME_PATH: {} (FILE NOT FOUND!)", chrome_path);
                log::error!("   Rendering will fail until a Chrome/Chromium binary is available");
            }
        }
        None => {
            log::info!("CHROME_PATH not set, the renderer will look for a system Chrome/Chromium");
        }
    }
}
