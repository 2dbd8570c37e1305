//! Bot construction and command definitions

use teloxide::adaptors::DefaultParseMode;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode};
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::core::error::AppResult;

/// Every outgoing message uses HTML markup, so the parse mode is applied
/// once at construction instead of per request.
pub type Bot = DefaultParseMode<teloxide::Bot>;

/// Commands the bot understands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show usage instructions")]
    Start,
    #[command(description = "show usage instructions")]
    Help,
}

/// Create the bot instance with a custom HTTP client.
///
/// `BOT_API_URL` switches the bot to a self-hosted Bot API server when set.
pub fn create_bot() -> AppResult<Bot> {
    let client = reqwest::ClientBuilder::new()
        .timeout(config::network::timeout())
        .build()?;

    let bot = teloxide::Bot::with_client(config::BOT_TOKEN.clone(), client);

    let bot = match std::env::var("BOT_API_URL") {
        Ok(api_url) if !api_url.is_empty() => {
            log::info!("Using custom Bot API URL: {}", api_url);
            let url = url::Url::parse(&api_url)?;
            bot.set_api_url(url)
        }
        _ => bot,
    };

    Ok(bot.parse_mode(ParseMode::Html))
}

/// Register the command list shown in the Telegram client menu
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands = vec![
        BotCommand::new("start", "Show usage instructions"),
        BotCommand::new("help", "Show usage instructions"),
    ];

    bot.set_my_commands(commands).await?;
    Ok(())
}
