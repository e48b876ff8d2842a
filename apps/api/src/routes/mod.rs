pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers::handle_generate;
use crate::import::handlers::handle_import_linkedin;
use crate::llm_client::handlers::{handle_list_models, handle_test_connection};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes());

    Router::new()
        .route("/health", get(health::health_handler))
        // CV generation
        .route("/api/generate", post(handle_generate))
        // PDF import
        .route("/api/import/linkedin", post(handle_import_linkedin))
        // Provider settings
        .route("/api/llm/test", post(handle_test_connection))
        .route("/api/llm/models", post(handle_list_models))
        .layer(body_limit)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOUNDARY: &str = "cvforge-test-boundary";

    fn router() -> Router {
        build_router(AppState::new(Config::default()).unwrap())
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            if *name == "pdf" {
                body.extend_from_slice(
                    b"Content-Disposition: form-data; name=\"pdf\"; filename=\"profile.pdf\"\r\n\
                      Content-Type: application/pdf\r\n\r\n",
                );
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/import/linkedin")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn read(response: axum::response::Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "cvforge-api");
    }

    #[tokio::test]
    async fn test_generate_end_to_end_over_openai_compatible_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{\"personalInfo\":{\"name\":\"Ada\"}}"}}]
            })))
            .mount(&server)
            .await;

        let response = router()
            .oneshot(json_request(
                "/api/generate",
                json!({
                    "cvData": {"personalInfo": {"name": "Ada"}},
                    "context": "Platform engineer",
                    "outputLanguage": "French",
                    "llmConfig": {
                        "provider": "groq",
                        "baseUrl": server.uri(),
                        "model": "llama-3.3-70b-versatile",
                        "apiKey": "gsk"
                    }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "data: {\"status\":\"generating\"}\n\n\
             data: {\"status\":\"done\",\"content\":\"{\\\"personalInfo\\\":{\\\"name\\\":\\\"Ada\\\"}}\"}\n\n"
        );
    }

    #[tokio::test]
    async fn test_generate_with_unknown_provider_is_400() {
        let response = router()
            .oneshot(json_request(
                "/api/generate",
                json!({
                    "cvData": {},
                    "llmConfig": {"provider": "watsonx", "baseUrl": "http://x", "model": "m", "apiKey": "k"}
                }),
            ))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Unsupported provider: watsonx"));
    }

    #[tokio::test]
    async fn test_import_rejects_non_pdf_upload() {
        let response = router()
            .oneshot(multipart_request(&[
                ("pdf", "PK\x03\x04 not a pdf"),
                ("baseUrl", "http://localhost:11434"),
                ("model", "llama3.1"),
            ]))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("not a PDF"));
    }

    #[tokio::test]
    async fn test_import_requires_file() {
        let response = router()
            .oneshot(multipart_request(&[
                ("baseUrl", "http://localhost:11434"),
                ("model", "llama3.1"),
            ]))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("No PDF file uploaded"));
    }

    #[tokio::test]
    async fn test_import_requires_model() {
        let response = router()
            .oneshot(multipart_request(&[
                ("pdf", "%PDF-1.4\n"),
                ("baseUrl", "http://localhost:11434"),
            ]))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("model is required"));
    }

    #[tokio::test]
    async fn test_import_unreadable_pdf_is_422() {
        let response = router()
            .oneshot(multipart_request(&[
                ("pdf", "%PDF-1.4\ngarbage with no objects"),
                ("baseUrl", "http://localhost:11434"),
                ("model", "llama3.1"),
            ]))
            .await
            .unwrap();
        let (status, _) = read(response).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_probe_failure_is_reported_inline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached. Please retry in 1.5s."}
            })))
            .mount(&server)
            .await;

        let response = router()
            .oneshot(json_request(
                "/api/llm/test",
                json!({"provider": "openai", "baseUrl": server.uri(), "apiKey": "sk"}),
            ))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(
            json["error"],
            "Rate limit exceeded for OpenAI. Please retry in 2 seconds."
        );
    }

    #[tokio::test]
    async fn test_models_endpoint_requires_base_url() {
        let response = router()
            .oneshot(json_request("/api/llm/models", json!({"provider": "ollama"})))
            .await
            .unwrap();
        let (status, _) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
