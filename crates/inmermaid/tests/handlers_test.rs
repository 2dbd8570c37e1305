//! Integration tests running real handlers against a mocked Telegram API
//!
//! Updates are fed through the production dispatch schema, so these tests
//! cover routing, rendering, upload and reply flows end to end. Only the
//! renderer is stubbed.

mod common;

use std::sync::Arc;

use serial_test::serial;

use common::{
    inline_query_update, text_message_update, BotHarness, FailRenderer, OkRenderer, TEST_CHAT_ID,
    TEST_USER_ID,
};
use inmermaid::render::RenderError;

#[tokio::test]
async fn test_start_command_sends_welcome() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    harness.dispatch(text_message_update("/start")).await;

    let requests = harness.requests_to("sendMessage").await;
    assert_eq!(requests.len(), 1, "should send exactly one welcome message");

    let body = harness.json_body("sendMessage", 0).await;
    assert_eq!(body["chat_id"].as_i64(), Some(TEST_CHAT_ID));
    assert_eq!(body["parse_mode"].as_str(), Some("HTML"));

    let text = body["text"].as_str().unwrap_or_default();
    assert!(text.contains("<b>Direct Mode:</b>"));
    assert!(text.contains("<b>Inline Mode:</b>"));
    assert!(text.contains("@inmermaidbot"));
    assert!(text.contains("https://mermaid.live/"));
    // The example diagram must be escaped for HTML parse mode
    assert!(text.contains("--&gt;"));
    assert!(!text.contains("A[Start] -->"));

    println!("✅ /start welcome message verified");
}

#[tokio::test]
async fn test_help_command_sends_welcome() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    harness.dispatch(text_message_update("/help")).await;

    let body = harness.json_body("sendMessage", 0).await;
    let text = body["text"].as_str().unwrap_or_default();
    assert!(text.contains("<b>Direct Mode:</b>"));

    println!("✅ /help welcome message verified");
}

#[tokio::test]
async fn test_direct_message_renders_and_sends_photo() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    harness
        .dispatch(text_message_update("graph TD\n    A[Start] --> B[End]"))
        .await;

    let action = harness.json_body("sendChatAction", 0).await;
    assert_eq!(action["action"].as_str(), Some("upload_photo"));

    let photos = harness.requests_to("sendPhoto").await;
    assert_eq!(photos.len(), 1, "should upload exactly one photo");

    // sendPhoto with in-memory bytes goes out as multipart
    let photo_body = harness.raw_body("sendPhoto", 0).await;
    assert!(photo_body.contains("mermaid_diagram.png"));
    assert!(photo_body.contains("fake png bytes"));

    let messages = harness.requests_to("sendMessage").await;
    assert!(messages.is_empty(), "success path should not send text replies");

    println!("✅ direct mode render and photo upload verified");
}

#[tokio::test]
async fn test_direct_message_render_failure_reports_error() {
    let renderer = FailRenderer {
        error: RenderError::Mermaid("Parse error on line 2".to_string()),
    };
    let harness = BotHarness::new(Arc::new(renderer)).await;
    harness.mount_telegram_api().await;

    harness
        .dispatch(text_message_update("graph TD\n    A -->"))
        .await;

    let photos = harness.requests_to("sendPhoto").await;
    assert!(photos.is_empty(), "failed render must not upload a photo");

    let body = harness.json_body("sendMessage", 0).await;
    let text = body["text"].as_str().unwrap_or_default();
    assert!(text.contains("Error rendering diagram"));
    assert!(text.contains("Parse error on line 2"));
    // User code is echoed back escaped
    assert!(text.contains("A --&gt;"));
    assert!(text.contains("https://mermaid.live/"));

    println!("✅ direct mode render error reply verified");
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    harness.dispatch(text_message_update("/frobnicate")).await;

    let requests = harness.server.received_requests().await.unwrap_or_default();
    assert!(
        requests.is_empty(),
        "unknown slash commands should produce no API calls"
    );

    println!("✅ unknown command ignored");
}

#[tokio::test]
#[serial]
async fn test_empty_inline_query_returns_help() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    harness.dispatch(inline_query_update("")).await;

    let body = harness.json_body("answerInlineQuery", 0).await;
    assert_eq!(body["inline_query_id"].as_str(), Some("query_1"));
    assert_eq!(body["cache_time"].as_u64(), Some(300));

    let result = &body["results"][0];
    assert_eq!(result["type"].as_str(), Some("article"));
    assert_eq!(result["id"].as_str(), Some("help"));
    assert_eq!(
        result["input_message_content"]["parse_mode"].as_str(),
        Some("HTML")
    );
    let content = result["input_message_content"]["message_text"]
        .as_str()
        .unwrap_or_default();
    assert!(content.contains("How to use InMermaid Bot"));
    assert!(content.contains("@inmermaidbot"));

    println!("✅ empty inline query help article verified");
}

#[tokio::test]
#[serial]
async fn test_inline_query_uploads_and_answers_with_cached_photo() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    harness
        .dispatch(inline_query_update("sequenceDiagram\n    Alice->>Bob: Hello"))
        .await;

    // Upload happens through the user's private chat, then gets cleaned up
    let photo_body = harness.raw_body("sendPhoto", 0).await;
    assert!(photo_body.contains("Preparing image for inline mode"));
    assert!(photo_body.contains("disable_notification"));

    let delete = harness.json_body("deleteMessage", 0).await;
    assert_eq!(delete["chat_id"].as_i64(), Some(TEST_USER_ID as i64));
    assert_eq!(delete["message_id"].as_i64(), Some(43));

    let answer = harness.json_body("answerInlineQuery", 0).await;
    assert_eq!(answer["cache_time"].as_u64(), Some(60));
    let result = &answer["results"][0];
    assert_eq!(result["type"].as_str(), Some("photo"));
    assert_eq!(result["photo_file_id"].as_str(), Some("large_file_id"));
    assert!(result["id"].as_str().unwrap_or_default().starts_with("mermaid_"));

    // Upload precedes cleanup, cleanup precedes the inline answer
    let order: Vec<String> = harness
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_lowercase())
        .collect();
    let photo_at = order.iter().position(|p| p.ends_with("/sendphoto"));
    let delete_at = order.iter().position(|p| p.ends_with("/deletemessage"));
    let answer_at = order.iter().position(|p| p.ends_with("/answerinlinequery"));
    assert!(photo_at < delete_at && delete_at < answer_at);

    println!("✅ inline query photo result verified");
}

#[tokio::test]
#[serial]
async fn test_inline_query_reuses_cached_file_id() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    harness.mount_telegram_api().await;

    let update = || inline_query_update("flowchart LR\n    X --> Y");
    harness.dispatch(update()).await;
    harness.dispatch(update()).await;

    let photos = harness.requests_to("sendPhoto").await;
    assert_eq!(photos.len(), 1, "second query should hit the file_id cache");

    let answers = harness.requests_to("answerInlineQuery").await;
    assert_eq!(answers.len(), 2);
    let second = harness.json_body("answerInlineQuery", 1).await;
    assert_eq!(
        second["results"][0]["photo_file_id"].as_str(),
        Some("large_file_id")
    );

    println!("✅ file_id cache reuse verified");
}

#[tokio::test]
#[serial]
async fn test_inline_query_render_failure_returns_syntax_error_article() {
    let renderer = FailRenderer {
        error: RenderError::Mermaid("Expected arrow after node".to_string()),
    };
    let harness = BotHarness::new(Arc::new(renderer)).await;
    harness.mount_telegram_api().await;

    harness.dispatch(inline_query_update("graph TD\n    oops")).await;

    let photos = harness.requests_to("sendPhoto").await;
    assert!(photos.is_empty());

    let answer = harness.json_body("answerInlineQuery", 0).await;
    let result = &answer["results"][0];
    assert_eq!(result["type"].as_str(), Some("article"));
    assert_eq!(result["id"].as_str(), Some("error"));
    assert_eq!(result["title"].as_str(), Some("❌ Syntax Error"));
    let content = result["input_message_content"]["message_text"]
        .as_str()
        .unwrap_or_default();
    assert!(content.contains("Expected arrow after node"));

    println!("✅ inline syntax error article verified");
}

#[tokio::test]
#[serial]
async fn test_inline_query_upload_failure_falls_back_to_code_article() {
    let harness = BotHarness::new(Arc::new(OkRenderer::new())).await;
    // Mounted first, so it wins over the success mock for sendPhoto
    harness.mount_send_photo_failure().await;
    harness.mount_telegram_api().await;

    harness
        .dispatch(inline_query_update("pie\n    \"Cats\" : 40\n    \"Dogs\" : 60"))
        .await;

    let deletes = harness.requests_to("deleteMessage").await;
    assert!(deletes.is_empty(), "nothing to clean up when upload fails");

    let answer = harness.json_body("answerInlineQuery", 0).await;
    let result = &answer["results"][0];
    assert_eq!(result["type"].as_str(), Some("article"));
    assert_eq!(result["title"].as_str(), Some("✅ Valid Mermaid Diagram"));
    assert!(result["id"].as_str().unwrap_or_default().starts_with("mermaid_"));
    let content = result["input_message_content"]["message_text"]
        .as_str()
        .unwrap_or_default();
    assert!(content.contains("pie"));
    assert!(content.contains("Send this code to @inmermaidbot"));

    println!("✅ inline upload fallback article verified");
}
