//! Command handler implementations (/start, /help)

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::html;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::Bot;

const EXAMPLE_DIAGRAM: &str = "graph TD\n    A[Start] --> B{Decision}\n    B -->|Yes| C[Action 1]\n    B -->|No| D[Action 2]\n    C --> E[End]\n    D --> E";

/// Usage instructions sent for /start and /help
pub(super) fn welcome_text(bot_username: &str) -> String {
    format!(
        "<b>Direct Mode:</b>\n\
         Send me Mermaid diagram code and I'll render it as an image\n\n\
         <b>Inline Mode:</b>\n\
         Use <code>@{username} your_code</code> in any chat to render and share diagrams\n\n\
         <b>Example diagram code:</b>\n\
         <code>{example}</code>\n\n\
         Learn more: https://mermaid.js.org/\n\
         Test syntax: https://mermaid.live/",
        username = bot_username,
        example = html::escape(EXAMPLE_DIAGRAM),
    )
}

/// Handle /start and /help
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, welcome_text(&deps.bot_username)).await?;
    Ok(())
}
