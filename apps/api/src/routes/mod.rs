pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/requirements",
            post(handlers::handle_extract_requirements),
        )
        .route("/api/v1/evaluations", post(handlers::handle_evaluate))
        .route(
            "/api/v1/evaluations/batch",
            post(handlers::handle_evaluate_batch),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::orchestrator::tests::{
        engine, ScenarioProvider, REFERENCE_JD, REFERENCE_RESUME,
    };
    use crate::analysis::pool::EvaluationPool;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn app() -> Router {
        let engine = engine(Arc::new(ScenarioProvider));
        let (_, shutdown) = watch::channel(false);
        let config = Config {
            port: 0,
            rust_log: "info".to_string(),
            skill_vocabulary_path: None,
            scoring_config_path: None,
            embedding_api_url: None,
            embedding_api_key: None,
            embedding_model: "test".to_string(),
            feedback_api_url: None,
            feedback_api_key: None,
            feedback_model: "test".to_string(),
            max_concurrent_evaluations: 2,
        };
        build_router(AppState {
            pool: EvaluationPool::new(engine.clone(), 2),
            engine,
            config,
            shutdown,
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "relevance-api");
        assert_eq!(body["similarity_provider"], "scenario");
        assert!(body["feedback_provider"].is_null());
    }

    #[tokio::test]
    async fn test_evaluate_returns_record() {
        let (status, body) = post_json(
            app(),
            "/api/v1/evaluations",
            json!({ "resume_id": "r-7", "resume_text": REFERENCE_RESUME, "jd_text": REFERENCE_JD }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume_id"], "r-7");
        assert_eq!(body["score"], 68);
        assert_eq!(body["verdict"], "Medium");
        assert_eq!(body["missing"][0]["skill"], "docker");
        assert_eq!(body["degraded"], false);
        // jd_id was generated
        assert!(uuid::Uuid::parse_str(body["jd_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_jd_without_requirements_is_unprocessable() {
        let (status, body) = post_json(
            app(),
            "/api/v1/evaluations",
            json!({ "resume_text": REFERENCE_RESUME, "jd_text": "Requirements\nTeam spirit." }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_REQUIREMENT_SET");
        assert_eq!(body["error"]["stage"], "extracting");
    }

    #[tokio::test]
    async fn test_blank_id_is_validation_error() {
        let (status, body) = post_json(
            app(),
            "/api/v1/evaluations",
            json!({ "resume_id": " ", "resume_text": REFERENCE_RESUME, "jd_text": REFERENCE_JD }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_requirements_preview() {
        let (status, body) =
            post_json(app(), "/api/v1/requirements", json!({ "jd_text": REFERENCE_JD })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role_title"], "Data Analyst");
        assert_eq!(body["requirements"][0]["skill_name"], "python");
        assert_eq!(body["requirements"][2]["kind"], "NiceToHave");
    }

    #[tokio::test]
    async fn test_requirements_preview_rejects_empty_jd() {
        let (status, body) =
            post_json(app(), "/api/v1/requirements", json!({ "jd_text": "   " })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "NORMALIZATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_reports_per_resume_outcomes() {
        let (status, body) = post_json(
            app(),
            "/api/v1/evaluations/batch",
            json!({
                "jd_id": "jd-42",
                "jd_text": REFERENCE_JD,
                "resumes": [
                    { "resume_id": "a", "resume_text": REFERENCE_RESUME },
                    { "resume_id": "b", "resume_text": "" },
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jd_id"], "jd-42");
        assert_eq!(body["results"][0]["resume_id"], "a");
        assert_eq!(body["results"][0]["result"]["score"], 68);
        assert_eq!(body["results"][1]["resume_id"], "b");
        assert_eq!(body["results"][1]["error"]["code"], "NORMALIZATION_ERROR");
        assert_eq!(body["results"][1]["error"]["stage"], "normalizing");
    }

    #[tokio::test]
    async fn test_empty_batch_is_validation_error() {
        let (status, _) = post_json(
            app(),
            "/api/v1/evaluations/batch",
            json!({ "jd_text": REFERENCE_JD, "resumes": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
