//! Remote counting against mock Anthropic and Gemini endpoints.
#![cfg(any(feature = "anthropic", feature = "gemini"))]

use mockito::{Matcher, Server};
use serde_json::json;
use token_check::{Error, ErrorKind, Provider, TokenCounter};

const TEXT: &str = "Hello, world! How many tokens is this message?";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(feature = "anthropic")]
mod anthropic {
    use super::*;

    #[test]
    fn test_count_tokens_reads_input_tokens() {
        init_tracing();
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/messages/count_tokens")
            .match_header("x-api-key", "sk-ant-test")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::Json(json!({
                "model": "claude-sonnet-4-20250514",
                "messages": [{ "role": "user", "content": TEXT }],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"input_tokens":19}"#)
            .create();

        let counter = TokenCounter::builder()
            .anthropic_api_key("sk-ant-test")
            .anthropic_base_url(server.url())
            .build();
        let result = counter
            .count_tokens(TEXT, Provider::Anthropic, "claude-sonnet-4-20250514", false)
            .unwrap();

        mock.assert();
        assert_eq!(result.tokens, 19);
        assert!(result.cost.is_none());
    }

    #[test]
    fn test_client_is_reused_across_calls() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/messages/count_tokens")
            .with_status(200)
            .with_body(r#"{"input_tokens":7}"#)
            .expect(3)
            .create();

        let counter = TokenCounter::builder()
            .anthropic_api_key("sk-ant-test")
            .anthropic_base_url(server.url())
            .build();
        for _ in 0..3 {
            let r = counter
                .count_tokens("short", Provider::Anthropic, "claude-3-5-haiku-latest", false)
                .unwrap();
            assert_eq!(r.tokens, 7);
        }
        mock.assert();
    }

    #[test]
    fn test_remote_error_is_passed_through() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/messages/count_tokens")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
            )
            .expect(1)
            .create();

        let counter = TokenCounter::builder()
            .anthropic_api_key("sk-ant-wrong")
            .anthropic_base_url(server.url())
            .build();
        let err = counter
            .count_tokens(TEXT, Provider::Anthropic, "claude-sonnet-4-20250514", true)
            .unwrap_err();

        mock.assert();
        match err {
            Error::Remote {
                status,
                class,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(class, "authentication_error");
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_reply_is_transport_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/v1/messages/count_tokens")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create();

        let counter = TokenCounter::builder()
            .anthropic_api_key("sk-ant-test")
            .anthropic_base_url(server.url())
            .build();
        let err = counter
            .count_tokens(TEXT, Provider::Anthropic, "claude-sonnet-4-20250514", false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_missing_key_makes_no_request() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create();

        let counter = TokenCounter::builder()
            .anthropic_base_url(server.url())
            .build();
        let err = counter
            .count_tokens(TEXT, Provider::Anthropic, "claude-sonnet-4-20250514", false)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        mock.assert();
    }

    #[cfg(feature = "pricing")]
    #[test]
    fn test_cost_estimate_matches_family_alias() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/v1/messages/count_tokens")
            .with_status(200)
            .with_body(r#"{"input_tokens":1000}"#)
            .create();

        let counter = TokenCounter::builder()
            .anthropic_api_key("sk-ant-test")
            .anthropic_base_url(server.url())
            .build();
        let result = counter
            .count_tokens(TEXT, Provider::Anthropic, "claude-sonnet-4-20250514", true)
            .unwrap();

        assert_eq!(result.tokens, 1000);
        assert_eq!(result.matched_model(), Some("claude-sonnet-4"));
        assert!((result.estimated_cost().unwrap() - 0.003).abs() < 1e-12);
    }
}

#[cfg(feature = "gemini")]
mod gemini {
    use super::*;

    const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash-001:countTokens";

    #[test]
    fn test_direct_api_reads_total_tokens() {
        init_tracing();
        let mut server = Server::new();
        let mock = server
            .mock("POST", MODEL_PATH)
            .match_header("x-goog-api-key", "AIza-test")
            .match_body(Matcher::Json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": TEXT }] }],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"totalTokens":12,"totalBillableCharacters":40}"#)
            .create();

        let counter = TokenCounter::builder()
            .gemini_api_key("AIza-test")
            .gemini_base_url(server.url())
            .build();
        let result = counter
            .count_tokens(TEXT, Provider::Gemini, "gemini-2.0-flash-001", false)
            .unwrap();

        mock.assert();
        assert_eq!(result.tokens, 12);
    }

    #[test]
    fn test_vertex_route_uses_project_location_and_bearer() {
        let mut server = Server::new();
        let mock = server
            .mock(
                "POST",
                "/v1/projects/my-project/locations/europe-west4/publishers/google/models/gemini-2.0-flash-001:countTokens",
            )
            .match_header("authorization", "Bearer ya29.test")
            .match_header("x-goog-api-key", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"totalTokens":12}"#)
            .expect(2)
            .create();

        let counter = TokenCounter::builder()
            .use_vertex_ai(true)
            .gemini_project_id("my-project")
            .gemini_location("europe-west4")
            .vertex_access_token("ya29.test")
            .gemini_api_key("ignored-in-vertex-mode")
            .vertex_base_url(server.url())
            .build();
        for _ in 0..2 {
            let r = counter
                .count_tokens(TEXT, Provider::Gemini, "gemini-2.0-flash-001", false)
                .unwrap();
            assert_eq!(r.tokens, 12);
        }
        mock.assert();
    }

    #[test]
    fn test_google_error_envelope() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(400)
            .with_body(
                r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
            )
            .create();

        let counter = TokenCounter::builder()
            .gemini_api_key("bad")
            .gemini_base_url(server.url())
            .build();
        let err = counter
            .count_tokens(TEXT, Provider::Gemini, "gemini-2.0-flash-001", false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert!(err.to_string().contains("INVALID_ARGUMENT"));
    }

    #[test]
    fn test_vertex_without_project_makes_no_request() {
        let mut server = Server::new();
        let mock = server.mock("POST", Matcher::Any).expect(0).create();

        let counter = TokenCounter::builder()
            .use_vertex_ai(true)
            .vertex_base_url(server.url())
            .build();
        let err = counter
            .count_tokens(TEXT, Provider::Gemini, "gemini-2.0-flash-001", false)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingCredential);
        mock.assert();
    }

    #[cfg(feature = "pricing")]
    #[test]
    fn test_cost_estimate_uses_google_prices() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"{"totalTokens":10000}"#)
            .create();

        let counter = TokenCounter::builder()
            .gemini_api_key("AIza-test")
            .gemini_base_url(server.url())
            .build();
        let result = counter
            .count_tokens(TEXT, Provider::Gemini, "gemini-2.0-flash-001", true)
            .unwrap();

        assert_eq!(result.matched_model(), Some("gemini-2.0-flash"));
        assert!((result.estimated_cost().unwrap() - 0.001).abs() < 1e-12);
    }
}
