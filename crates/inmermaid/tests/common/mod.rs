//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Update};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inmermaid::render::{DiagramRenderer, RenderError, RenderOutcome, Rendered};
use inmermaid::telegram::{schema, Bot, HandlerDeps, HandlerError};

pub const TEST_CHAT_ID: i64 = 123456789;
pub const TEST_USER_ID: u64 = 123456789;

/// Renderer stub that always succeeds with the given PNG bytes
pub struct OkRenderer {
    pub png: Vec<u8>,
}

impl OkRenderer {
    pub fn new() -> Self {
        // ASCII payload keeps multipart bodies readable in assertions
        Self {
            png: b"fake png bytes".to_vec(),
        }
    }
}

#[async_trait]
impl DiagramRenderer for OkRenderer {
    async fn render(&self, _code: &str) -> RenderOutcome {
        Ok(Rendered { png: self.png.clone() })
    }
}

/// Renderer stub that always fails with the given error
pub struct FailRenderer {
    pub error: RenderError,
}

#[async_trait]
impl DiagramRenderer for FailRenderer {
    async fn render(&self, _code: &str) -> RenderOutcome {
        Err(self.error.clone())
    }
}

/// Test harness wiring the real handler schema to a wiremock Telegram API
pub struct BotHarness {
    pub server: MockServer,
    pub bot: Bot,
    pub deps: HandlerDeps,
}

impl BotHarness {
    pub async fn new(renderer: Arc<dyn DiagramRenderer>) -> Self {
        let server = MockServer::start().await;

        let api_url = server.uri().parse().expect("mock server uri should parse");
        let bot = teloxide::Bot::new("test_token_12345:ABCDEF")
            .set_api_url(api_url)
            .parse_mode(ParseMode::Html);

        let deps = HandlerDeps::new(renderer, "inmermaidbot".to_string());

        Self { server, bot, deps }
    }

    /// Run one update through the real schema
    pub async fn dispatch(&self, update: Update) {
        let handler = schema(self.deps.clone());
        let result = handler.dispatch(dptree::deps![self.bot.clone(), update]).await;
        assert!(
            matches!(result, std::ops::ControlFlow::Break(Ok(()))),
            "update should reach an endpoint and succeed"
        );
    }

    /// Mount success responses for every API method the handlers use.
    ///
    /// Mount failure mocks for individual methods before calling this;
    /// wiremock prefers earlier mounts when several mocks match.
    pub async fn mount_telegram_api(&self) {
        let message_result = serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 42,
                "from": { "id": 987654321, "is_bot": true, "first_name": "TestBot", "username": "inmermaidbot" },
                "chat": { "id": TEST_CHAT_ID, "type": "private", "first_name": "Test" },
                "date": 1735992000,
                "text": "Response"
            }
        });
        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_result.clone()))
            .mount(&self.server)
            .await;

        let true_result = serde_json::json!({ "ok": true, "result": true });
        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/sendChatAction"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true_result.clone()))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/deleteMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true_result.clone()))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/answerInlineQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(true_result.clone()))
            .mount(&self.server)
            .await;

        // Two sizes so the largest-size pick is observable
        let photo_result = serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 43,
                "from": { "id": 987654321, "is_bot": true, "first_name": "TestBot", "username": "inmermaidbot" },
                "chat": { "id": TEST_CHAT_ID, "type": "private", "first_name": "Test" },
                "date": 1735992000,
                "photo": [
                    { "file_id": "small_file_id", "file_unique_id": "u1", "file_size": 1000, "width": 90, "height": 60 },
                    { "file_id": "large_file_id", "file_unique_id": "u2", "file_size": 9000, "width": 1200, "height": 800 }
                ]
            }
        });
        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/sendPhoto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(photo_result))
            .mount(&self.server)
            .await;

        // Catch-all for any unhandled POST requests
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_result))
            .mount(&self.server)
            .await;
    }

    /// Make sendPhoto fail the way Telegram does for users who never
    /// started a chat with the bot
    pub async fn mount_send_photo_failure(&self) {
        let error = serde_json::json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot can't initiate conversation with a user"
        });
        Mock::given(method("POST"))
            .and(path_regex("/bot[^/]+/sendPhoto"))
            .respond_with(ResponseTemplate::new(403).set_body_json(error))
            .mount(&self.server)
            .await;
    }

    /// Received requests to a given API method, in call order
    pub async fn requests_to(&self, api_method: &str) -> Vec<wiremock::Request> {
        let suffix = format!("/{}", api_method.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().to_lowercase().ends_with(&suffix))
            .collect()
    }

    /// JSON body of the nth request to a method
    pub async fn json_body(&self, api_method: &str, index: usize) -> serde_json::Value {
        let requests = self.requests_to(api_method).await;
        let request = requests
            .get(index)
            .unwrap_or_else(|| panic!("expected at least {} {} request(s)", index + 1, api_method));
        serde_json::from_slice(&request.body).expect("request body should be JSON")
    }

    /// Lossy string body of the nth request to a method (for multipart)
    pub async fn raw_body(&self, api_method: &str, index: usize) -> String {
        let requests = self.requests_to(api_method).await;
        let request = requests
            .get(index)
            .unwrap_or_else(|| panic!("expected at least {} {} request(s)", index + 1, api_method));
        String::from_utf8_lossy(&request.body).into_owned()
    }
}

/// Build an Update for an incoming private text message
pub fn text_message_update(text: &str) -> Update {
    let json = serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 1,
            "date": 1735992000,
            "chat": {
                "id": TEST_CHAT_ID,
                "type": "private",
                "first_name": "Test",
                "username": "testuser"
            },
            "from": {
                "id": TEST_USER_ID,
                "is_bot": false,
                "first_name": "Test",
                "username": "testuser"
            },
            "text": text
        }
    });

    serde_json::from_value(json).expect("update json should deserialize")
}

/// Build an Update for an inline query
pub fn inline_query_update(query: &str) -> Update {
    let json = serde_json::json!({
        "update_id": 2,
        "inline_query": {
            "id": "query_1",
            "from": {
                "id": TEST_USER_ID,
                "is_bot": false,
                "first_name": "Test",
                "username": "testuser"
            },
            "query": query,
            "offset": ""
        }
    });

    serde_json::from_value(json).expect("update json should deserialize")
}

// Keep the HandlerError name exported for tests that spell out types
pub type DispatchError = HandlerError;
