//! Tests for the Resend delivery channel

use mg_core::errors::DeliveryError;
use mg_core::services::email::DeliveryChannel;

use super::spawn_server;
use crate::email::resend::{error_message, is_retryable_status};
use crate::email::{ResendConfig, ResendDeliveryChannel};

fn config(base_url: &str) -> ResendConfig {
    ResendConfig {
        api_key: "re_test_key".to_string(),
        from_address: "MailGate <noreply@example.com>".to_string(),
        api_base_url: base_url.to_string(),
        max_retries: 3,
        retry_delay_ms: 1,
        request_timeout_secs: 5,
    }
}

#[test]
fn test_error_message_parsing() {
    assert_eq!(
        error_message(422, r#"{"statusCode":422,"name":"validation_error","message":"Invalid `to` field"}"#),
        "validation_error: Invalid `to` field"
    );
    assert_eq!(error_message(500, ""), "HTTP 500");
    assert_eq!(error_message(502, "bad gateway"), "bad gateway");
}

#[test]
fn test_retryable_statuses() {
    assert!(is_retryable_status(429));
    assert!(is_retryable_status(503));
    assert!(!is_retryable_status(400));
    assert!(!is_retryable_status(422));
}

#[tokio::test]
async fn test_send_success_returns_message_id() {
    let (base_url, requests) = spawn_server(vec![(200, r#"{"id":"49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#)]).await;
    let channel = ResendDeliveryChannel::new(config(&base_url)).unwrap();

    let id = channel
        .send("user@example.com", "Sign in to your account", "<p>123456</p>")
        .await
        .unwrap();

    assert_eq!(id, "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.starts_with("POST /emails"));
    assert!(request.to_lowercase().contains("authorization: bearer re_test_key"));
    assert!(request.contains(r#""to":["user@example.com"]"#));
    assert!(request.contains(r#""subject":"Sign in to your account""#));
    assert!(request.contains(r#""from":"MailGate <noreply@example.com>""#));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (base_url, requests) = spawn_server(vec![
        (422, r#"{"statusCode":422,"name":"validation_error","message":"Invalid from"}"#),
        (200, r#"{"id":"never"}"#),
    ])
    .await;
    let channel = ResendDeliveryChannel::new(config(&base_url)).unwrap();

    let err = channel
        .send("user@example.com", "subject", "<p>body</p>")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DeliveryError::Rejected {
            status: 422,
            message: "validation_error: Invalid from".to_string()
        }
    );
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let (base_url, requests) = spawn_server(vec![
        (503, ""),
        (429, r#"{"message":"Too many requests"}"#),
        (200, r#"{"id":"msg_3"}"#),
    ])
    .await;
    let channel = ResendDeliveryChannel::new(config(&base_url)).unwrap();

    let id = channel
        .send("user@example.com", "subject", "<p>body</p>")
        .await
        .unwrap();

    assert_eq!(id, "msg_3");
    assert_eq!(requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (base_url, requests) = spawn_server(vec![(500, ""), (500, ""), (500, ""), (200, r#"{"id":"late"}"#)]).await;
    let channel = ResendDeliveryChannel::new(config(&base_url)).unwrap();

    let err = channel
        .send("user@example.com", "subject", "<p>body</p>")
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Rejected { status: 500, .. }));
    assert_eq!(requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    let mut config = config("http://127.0.0.1:9");
    config.max_retries = 1;
    let channel = ResendDeliveryChannel::new(config).unwrap();

    let err = channel
        .send("user@example.com", "subject", "<p>body</p>")
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Transport { .. }));
}
