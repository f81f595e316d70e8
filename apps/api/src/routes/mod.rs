pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::matching::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Matching API
        .route("/api/v1/match", post(handlers::handle_match))
        .route("/api/v1/match/upload", post(handlers::handle_upload))
        .route("/api/v1/entities", post(handlers::handle_entities))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::matching::backends::LoadedBackends;
    use crate::matching::embedders::HashedEmbedder;
    use crate::matching::engine::MatchEngine;
    use crate::matching::lexicon::LexiconNer;
    use crate::matching::pdf::{ExtractionError, PdfTextExtractor};
    use crate::matching::scoring::ScoreWeights;

    const BOUNDARY: &str = "matcher-test-boundary";

    /// Treats the upload bytes as UTF-8 text; "%ENCRYPTED" fails.
    struct FakePdf;

    impl PdfTextExtractor for FakePdf {
        fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
            if bytes.starts_with(b"%ENCRYPTED") {
                return Err(ExtractionError::Unreadable("encrypted".to_string()));
            }
            Ok(String::from_utf8_lossy(bytes).trim().to_string())
        }
    }

    fn test_router() -> Router {
        let backends = LoadedBackends {
            ner: Arc::new(LexiconNer::builtin().unwrap()),
            embedder: Arc::new(HashedEmbedder::new(64).unwrap()),
        };
        build_router(AppState {
            config: Config::default(),
            engine: Arc::new(MatchEngine::new(&backends, ScoreWeights::default()).unwrap()),
            pdf: Arc::new(FakePdf),
        })
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_post(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/match/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-matcher-api");
        assert_eq!(body["embedding_backend"], "hashed");
        assert_eq!(body["embedding_dim"], 64);
    }

    #[tokio::test]
    async fn test_match_returns_report() {
        let request = json_post(
            "/api/v1/match",
            json!({
                "resume_text": "Senior Python developer, 5 years of SQL experience.",
                "job_description": "Looking for a senior Python and Java engineer."
            }),
        );
        let (status, body) = send(test_router(), request).await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["breakdown"]["skill_overlap"], 0.333);
        assert_eq!(body["breakdown"]["experience_alignment"], 0.5);
        assert_eq!(body["resume_entities"]["SKILLS"], json!(["python", "sql"]));
        assert_eq!(body["breakdown_percent"][0]["label"], "Semantic Similarity");
        let overall = body["overall_score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&overall));
    }

    #[tokio::test]
    async fn test_match_missing_resume_is_400() {
        let request = json_post("/api/v1/match", json!({ "job_description": "python" }));
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Please upload a resume first.");
    }

    #[tokio::test]
    async fn test_match_non_string_job_is_400() {
        let request = json_post(
            "/api/v1/match",
            json!({ "resume_text": "python", "job_description": 17 }),
        );
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Please paste a job description first.");
    }

    #[tokio::test]
    async fn test_upload_scores_extracted_text() {
        let request = multipart_post(&[
            ("resume", Some("cv.pdf"), b"Rust and Docker engineer, MBA".as_slice()),
            ("job_description", None, b"Rust engineer with Kubernetes. MBA preferred.".as_slice()),
        ]);
        let (status, body) = send(test_router(), request).await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["resume_entities"]["SKILLS"], json!(["docker", "rust"]));
        assert_eq!(body["breakdown"]["qualification_overlap"], 1.0);
    }

    #[tokio::test]
    async fn test_upload_unreadable_pdf_is_422() {
        let request = multipart_post(&[
            ("resume", Some("cv.pdf"), b"%ENCRYPTED stuff".as_slice()),
            ("job_description", None, b"Rust engineer".as_slice()),
        ]);
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EXTRACTION_FAILED");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Could not extract text from resume."));
    }

    #[tokio::test]
    async fn test_upload_pdf_without_text_is_422() {
        let request = multipart_post(&[
            ("resume", Some("scan.pdf"), b"   ".as_slice()),
            ("job_description", None, b"Rust engineer".as_slice()),
        ]);
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EXTRACTION_FAILED");
    }

    #[tokio::test]
    async fn test_upload_missing_resume_is_400() {
        let request = multipart_post(&[("job_description", None, b"Rust engineer".as_slice())]);
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Please upload a resume first.");
    }

    #[tokio::test]
    async fn test_entities_preview() {
        let request = json_post(
            "/api/v1/entities",
            json!({ "text": "The 3 engineers know Python, SQL and PMP." }),
        );
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entities"]["SKILLS"], json!(["python", "sql"]));
        assert_eq!(body["entities"]["QUALIFICATION"], json!(["pmp"]));
        assert_eq!(body["normalized"], "engineer know python sql pmp");
    }

    #[tokio::test]
    async fn test_entities_absent_text_is_empty() {
        let request = json_post("/api/v1/entities", json!({}));
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entities"], json!({}));
        assert_eq!(body["normalized"], "");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let request = Request::get("/api/v1/nope").body(Body::empty()).unwrap();
        let (status, body) = send(test_router(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
