//! Shared handler types

use std::sync::Arc;

use crate::render::DiagramRenderer;

/// Error type produced by dispatcher endpoints
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies shared by all handlers, cloned into each endpoint closure
#[derive(Clone)]
pub struct HandlerDeps {
    pub renderer: Arc<dyn DiagramRenderer>,
    /// Username without the leading `@`, used in help texts
    pub bot_username: String,
}

impl HandlerDeps {
    pub fn new(renderer: Arc<dyn DiagramRenderer>, bot_username: String) -> Self {
        Self { renderer, bot_username }
    }
}
