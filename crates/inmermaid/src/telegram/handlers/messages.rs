//! Direct mode: text messages are treated as Mermaid source and answered
//! with a rendered PNG.

use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, Message};
use teloxide::utils::html;

use super::types::{HandlerDeps, HandlerError};
use crate::render::RenderError;
use crate::telegram::Bot;

/// Handle a plain text message containing diagram source
pub(super) async fn handle_mermaid_code(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let code = text.trim();
    // Slash lines are commands, not diagram source
    if code.is_empty() || code.starts_with('/') {
        return Ok(());
    }

    if let Err(e) = render_and_reply(bot, msg, deps, code).await {
        log::error!("Error handling message: {}", e);
        let fallback = format!(
            "❌ <b>System error:</b> {}\n\nPlease try again or contact support.",
            html::escape(&e.to_string()),
        );
        bot.send_message(msg.chat.id, fallback).await.ok();
    }

    Ok(())
}

async fn render_and_reply(bot: &Bot, msg: &Message, deps: &HandlerDeps, code: &str) -> Result<(), HandlerError> {
    bot.send_chat_action(msg.chat.id, ChatAction::UploadPhoto).await?;

    let user_id = msg.from.as_ref().map(|user| user.id.0).unwrap_or_default();
    log::info!("Rendering diagram for user {}", user_id);

    match deps.renderer.render(code).await {
        Ok(rendered) => {
            let photo = InputFile::memory(rendered.png).file_name("mermaid_diagram.png");
            bot.send_photo(msg.chat.id, photo).await?;
            log::info!("Successfully sent diagram to user {}", user_id);
        }
        Err(error) => {
            bot.send_message(msg.chat.id, render_error_text(&error, code)).await?;
        }
    }

    Ok(())
}

/// Error reply shown when the diagram source fails to render
pub(super) fn render_error_text(error: &RenderError, code: &str) -> String {
    format!(
        "❌ <b>Error rendering diagram:</b>\n\n{error}\n\n<b>Your code:</b>\n<code>{code}</code>\n\n💡 <i>Check your syntax at https://mermaid.live/</i>",
        error = html::escape(&error.to_string()),
        code = html::escape(code),
    )
}
