//! Update handlers for the dispatcher

mod commands;
mod inline;
mod messages;
mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
