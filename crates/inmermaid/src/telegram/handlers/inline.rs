//! Inline mode: `@bot <code>` in any chat renders the diagram and offers it
//! as an inline result.
//!
//! Inline photo results must reference an already uploaded `file_id`, so the
//! rendered image is first sent to the querying user's own chat (silently,
//! then deleted) to obtain one. The file id is cached per diagram hash; when
//! the upload fails the result degrades to a text article with the source.

use teloxide::prelude::*;
use teloxide::types::{
    ChatId, FileId, InlineQuery, InlineQueryResult, InlineQueryResultArticle, InlineQueryResultCachedPhoto, InputFile,
    InputMessageContent, InputMessageContentText, ParseMode, Seconds, UserId,
};
use teloxide::utils::html;

use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::core::throttle::INLINE_THROTTLE;
use crate::render::RenderError;
use crate::telegram::cache::{self, diagram_hash};
use crate::telegram::Bot;

const INLINE_EXAMPLE: &str = "graph TD\n    A[Start] --> B[Process]\n    B --> C[End]";

/// Handle an inline query, falling back to a system error article when the
/// Telegram round trips themselves fail
pub(super) async fn handle_inline_query(bot: &Bot, query: &InlineQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    if let Err(e) = answer_inline(bot, query, deps).await {
        log::error!("Error in inline query handler: {}", e);
        bot.answer_inline_query(query.id.clone(), vec![system_error_article(&e.to_string())])
            .cache_time(Seconds::from_seconds(config::inline::SYSTEM_ERROR_CACHE_SECS))
            .await
            .ok();
    }

    Ok(())
}

async fn answer_inline(bot: &Bot, query: &InlineQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let code = query.query.trim();

    if code.is_empty() {
        bot.answer_inline_query(query.id.clone(), vec![help_article(&deps.bot_username)])
            .cache_time(Seconds::from_seconds(config::inline::HELP_CACHE_SECS))
            .await?;
        return Ok(());
    }

    INLINE_THROTTLE.acquire().await;

    let result = match deps.renderer.render(code).await {
        Ok(rendered) => {
            let hash = diagram_hash(code);
            match upload_for_inline(bot, rendered.png, hash, query.from.id).await {
                Some(file_id) => cached_photo_result(hash, file_id),
                None => code_fallback_article(hash, code, &deps.bot_username),
            }
        }
        Err(error) => syntax_error_article(&error, code),
    };

    bot.answer_inline_query(query.id.clone(), vec![result])
        .cache_time(Seconds::from_seconds(config::inline::RESULT_CACHE_SECS))
        .await?;

    Ok(())
}

/// Obtain a `file_id` for the rendered image, uploading it to the user's own
/// chat if the cache has no live entry. Returns `None` when the upload fails,
/// e.g. because the user never started a private chat with the bot.
async fn upload_for_inline(bot: &Bot, png: Vec<u8>, hash: u64, user_id: UserId) -> Option<FileId> {
    if let Some(file_id) = cache::get_cached_file_id(hash) {
        return Some(file_id);
    }

    let chat = ChatId(user_id.0 as i64);
    let photo = InputFile::memory(png).file_name(format!("mermaid_{}.png", hash % 1_000_000));

    let upload = async {
        let sent = bot
            .send_photo(chat, photo)
            .caption("🔄 Preparing image for inline mode...")
            .disable_notification(true)
            .await?;
        let file_id = sent
            .photo()
            .and_then(|sizes| sizes.iter().max_by_key(|size| size.width * size.height))
            .map(|size| size.file.id.clone());
        bot.delete_message(chat, sent.id).await.ok();
        Ok::<_, teloxide::RequestError>(file_id)
    };

    match upload.await {
        Ok(Some(file_id)) => {
            cache::cache_file_id(hash, file_id.clone());
            Some(file_id)
        }
        Ok(None) => {
            log::warn!("Failed to upload image to user {}: no photo in response", user_id);
            None
        }
        Err(e) => {
            log::warn!("Failed to upload image to user {}: {}", user_id, e);
            None
        }
    }
}

fn result_id(hash: u64) -> String {
    format!("mermaid_{}", hash % 1_000_000)
}

fn html_text(content: String) -> InputMessageContent {
    InputMessageContent::Text(InputMessageContentText::new(content).parse_mode(ParseMode::Html))
}

fn cached_photo_result(hash: u64, file_id: FileId) -> InlineQueryResult {
    InlineQueryResult::CachedPhoto(InlineQueryResultCachedPhoto::new(result_id(hash), file_id))
}

fn help_article(bot_username: &str) -> InlineQueryResult {
    let content = format!(
        "ℹ️ <b>How to use InMermaid Bot:</b>\n\n\
         1. Type <code>@{username}</code> followed by your Mermaid code\n\
         2. Select the rendered image to send\n\
         3. Or send code directly to @{username} for higher quality\n\n\
         <b>Example:</b>\n\
         <code>@{username} {example}</code>",
        username = bot_username,
        example = html::escape(INLINE_EXAMPLE),
    );

    InlineQueryResult::Article(
        InlineQueryResultArticle::new("help", "📝 Enter Mermaid diagram code", html_text(content))
            .description("Type your Mermaid diagram syntax to render it"),
    )
}

fn code_fallback_article(hash: u64, code: &str, bot_username: &str) -> InlineQueryResult {
    let content = format!(
        "🎨 <b>Mermaid Diagram</b>\n\n<code>{code}</code>\n\n💡 <i>Send this code to @{username} to get the rendered image!</i>",
        code = html::escape(code),
        username = bot_username,
    );

    InlineQueryResult::Article(
        InlineQueryResultArticle::new(result_id(hash), "✅ Valid Mermaid Diagram", html_text(content))
            .description(format!("Share this diagram code ({} chars)", code.chars().count())),
    )
}

fn syntax_error_article(error: &RenderError, code: &str) -> InlineQueryResult {
    let error_text = error.to_string();
    let content = format!(
        "❌ <b>Mermaid Syntax Error:</b>\n\n{error}\n\n<b>Your code:</b>\n<code>{code}</code>\n\n💡 <i>Check your syntax at https://mermaid.live/</i>",
        error = html::escape(&error_text),
        code = html::escape(code),
    );
    let description: String = error_text.chars().take(100).collect();

    InlineQueryResult::Article(
        InlineQueryResultArticle::new("error", "❌ Syntax Error", html_text(content)).description(description),
    )
}

fn system_error_article(detail: &str) -> InlineQueryResult {
    let content = format!(
        "❌ <b>System Error:</b>\n\n{}\n\nPlease try again or contact support.",
        html::escape(detail),
    );

    InlineQueryResult::Article(
        InlineQueryResultArticle::new("system_error", "❌ System Error", html_text(content))
            .description("Internal error occurred"),
    )
}
