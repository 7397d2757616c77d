/*!
 * Tests for provider clients and their wire types
 */

use codex_translator::providers::Provider;
use codex_translator::providers::mock::{MockErrorType, MockProvider, MockReply};
use codex_translator::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use codex_translator::errors::ProviderError;
use serde_json::json;

#[test]
fn test_openai_request_shouldSerializeChatShape() {
    let request = OpenAIRequest::new("deepseek-chat")
        .add_message("system", "sys")
        .add_message("user", "hello")
        .temperature(0.5)
        .top_p(0.9)
        .max_tokens(512);

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["model"], "deepseek-chat");
    assert_eq!(value["messages"][0], json!({ "role": "system", "content": "sys" }));
    assert_eq!(value["messages"][1], json!({ "role": "user", "content": "hello" }));
    assert_eq!(value["max_tokens"], 512);
    assert_eq!(value["stream"], false);
    assert!((value["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
}

#[test]
fn test_openai_extract_text_shouldReturnFirstChoice() {
    let response: OpenAIResponse = serde_json::from_value(json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "```你好```" } },
            { "index": 1, "message": { "role": "assistant", "content": "second" } }
        ],
        "usage": { "prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13 }
    }))
    .unwrap();

    assert_eq!(OpenAI::extract_text(&response), "```你好```");
    assert_eq!(response.usage.unwrap().total_tokens, 13);
}

#[test]
fn test_openai_new_with_config_withInvalidProxy_shouldFail() {
    let result = OpenAI::new_with_config("key", "https://api.deepseek.com", Some("http://[::1"), None);
    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

#[test]
fn test_openai_debug_shouldRedactApiKey() {
    let client = OpenAI::new("sk-secret", "https://api.deepseek.com");
    let debug = format!("{:?}", client);
    assert!(!debug.contains("sk-secret"));
    assert!(debug.contains("https://api.deepseek.com"));
}

#[tokio::test]
async fn test_mock_provider_shouldPlayBackScriptThenFallback() {
    let mock = MockProvider::scripted(vec![MockReply::fenced("你好"), MockReply::Error(MockErrorType::Auth)]);

    let first = mock.complete(OpenAIRequest::new("a")).await.unwrap();
    assert_eq!(MockProvider::extract_text(&first), "```\n你好\n```");

    let second = mock.complete(OpenAIRequest::new("b")).await;
    assert!(matches!(second, Err(ProviderError::AuthenticationError(_))));

    let third = mock.complete(OpenAIRequest::new("c")).await;
    assert!(matches!(third, Err(ProviderError::ApiError { status_code: 500, .. })));

    assert_eq!(mock.requested_models(), vec!["a", "b", "c"]);
    assert!(mock.test_connection().await.is_ok());
}
