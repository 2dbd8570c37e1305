//! Dispatcher schema wiring updates to handler functions.
//!
//! Branch order matters: commands are matched first so `/start` never
//! reaches the diagram handler, then plain text messages, then inline
//! queries.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{InlineQuery, Message};

use super::commands;
use super::inline;
use super::messages;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::{Bot, Command};

/// Build the full update handler tree
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_inline = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(inline_query_handler(deps_inline))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                match cmd {
                    Command::Start | Command::Help => commands::handle_start_command(&bot, &msg, &deps).await,
                }
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move { messages::handle_mermaid_code(&bot, &msg, &deps).await }
        })
}

fn inline_query_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_inline_query().endpoint(move |bot: Bot, query: InlineQuery| {
        let deps = deps.clone();
        async move { inline::handle_inline_query(&bot, &query, &deps).await }
    })
}
