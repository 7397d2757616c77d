/*!
 * Tests for error types and conversions
 */

use codex_translator::errors::{AppError, ProviderError, TranslationError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "Service unavailable".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("503"));
    assert!(display.contains("Service unavailable"));
}

#[test]
fn test_providerError_rateLimitExceeded_shouldDisplayCorrectly() {
    let error = ProviderError::RateLimitExceeded("Retry after 60s".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Rate limit exceeded"));
    assert!(display.contains("Retry after 60s"));
}

#[test]
fn test_providerError_authenticationError_shouldDisplayCorrectly() {
    let error = ProviderError::AuthenticationError("Invalid API key".to_string());
    assert!(error.to_string().contains("Authentication error"));
}

#[test]
fn test_translationError_fromProviderError_shouldWrapCorrectly() {
    let provider_error = ProviderError::ConnectionError("Host unreachable".to_string());
    let error: TranslationError = provider_error.into();

    assert!(matches!(error, TranslationError::Provider(_)));
    assert!(error.to_string().contains("Host unreachable"));
}

#[test]
fn test_translationError_extraction_shouldMentionMissingFence() {
    let error = TranslationError::Extraction;
    assert!(error.to_string().contains("Failed to get answer data"));
    assert!(error.to_string().contains("no fenced block"));
}

#[test]
fn test_translationError_exhausted_shouldNameCharacterAndText() {
    let error = TranslationError::Exhausted {
        character: "Alana".to_string(),
        text: "Alana is a main character.".to_string(),
        attempts: 5,
    };
    assert_eq!(error.to_string(), "Failed to translate Alana: Alana is a main character.");
}

#[test]
fn test_appError_fromJsonError_shouldWrapCorrectly() {
    let json_error = serde_json::from_str::<serde_json::Value>("{ broken").unwrap_err();
    let error: AppError = json_error.into();
    assert!(matches!(error, AppError::Json(_)));
    assert!(error.to_string().starts_with("JSON error"));
}

#[test]
fn test_appError_config_shouldDisplayReason() {
    let error = AppError::Config("Endpoint pool cannot be empty".to_string());
    assert_eq!(error.to_string(), "Configuration error: Endpoint pool cannot be empty");
}
