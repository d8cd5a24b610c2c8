//! HTTP Request Handlers
//!
//! Thin adapter over the scoring engine, organized by resource.

pub mod contests;
pub mod events;
pub mod health;
pub mod internal;
pub mod submissions;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest("/contests", contests::routes())
        .nest("/submissions", submissions::routes())
        .nest("/internal", internal::routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::ScoringSystem,
        realtime::RoomHub,
        test_utils::{TestEngine, contest_fixture, pending},
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(harness: &TestEngine) -> Router {
        let state = AppState::new(harness.engine.clone(), RoomHub::default());
        routes().with_state(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let harness = TestEngine::new();
        let response = app(&harness)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_standings_endpoint() {
        let harness = TestEngine::new();
        let contest = contest_fixture(ScoringSystem::Icpc, 2);
        let contest_id = contest.id;
        harness.store.insert_contest(contest);

        let response = app(&harness)
            .oneshot(
                Request::get(format!("/contests/{}/standings?page=1&limit=2", contest_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["pages"], 2);
        assert_eq!(body["rankings"].as_array().unwrap().len(), 2);
        assert_eq!(body["is_frozen"], false);
    }

    #[tokio::test]
    async fn test_standings_unknown_contest() {
        let harness = TestEngine::new();
        let response = app(&harness)
            .oneshot(
                Request::get(format!("/contests/{}/standings", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "CONTEST_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_contest_summary() {
        let harness = TestEngine::new();
        let contest = contest_fixture(ScoringSystem::AtCoder, 2);
        let contest_id = contest.id;
        harness.store.insert_contest(contest);

        let response = app(&harness)
            .oneshot(
                Request::get(format!("/contests/{}", contest_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["scoring_system"], "AtCoder");
        assert_eq!(body["status"], "running");
        assert_eq!(body["participant_count"], 3);
        assert_eq!(body["problem_count"], 2);
        assert_eq!(body["can_register"], true);
        assert_eq!(body["is_frozen"], false);
        assert!(body["time_left_seconds"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_standings_of_draft_contest_is_not_found() {
        let harness = TestEngine::new();
        let mut contest = contest_fixture(ScoringSystem::Icpc, 2);
        contest.is_published = false;
        let contest_id = contest.id;
        harness.store.insert_contest(contest);

        let response = app(&harness)
            .oneshot(
                Request::get(format!("/contests/{}/standings", contest_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "CONTEST_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_events_of_hidden_contest_is_not_found() {
        let harness = TestEngine::new();
        let mut contest = contest_fixture(ScoringSystem::Icpc, 2);
        contest.is_visible = false;
        let contest_id = contest.id;
        harness.store.insert_contest(contest);

        let response = app(&harness)
            .oneshot(
                Request::get(format!("/contests/{}/events", contest_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "CONTEST_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_events_of_public_contest_streams() {
        let harness = TestEngine::new();
        let contest = contest_fixture(ScoringSystem::Icpc, 2);
        let contest_id = contest.id;
        harness.store.insert_contest(contest);

        let response = app(&harness)
            .oneshot(
                Request::get(format!("/contests/{}/events", contest_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
    }

    #[tokio::test]
    async fn test_callback_requires_submission_id() {
        let harness = TestEngine::new();
        let response = app(&harness)
            .oneshot(post_json(
                "/internal/judge-callback",
                json!({ "result": { "status": "Accepted" } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_callback_ingests_in_background() {
        let harness = TestEngine::new();
        let contest = contest_fixture(ScoringSystem::Icpc, 1);
        harness.store.insert_contest(contest.clone());
        let row = pending(&contest, contest.participants[0], contest.problems[0].problem_id, 2, 33);
        let submission_id = row.submission_id;
        harness.store.insert_submission(row);

        let response = app(&harness)
            .oneshot(post_json(
                "/internal/judge-callback",
                json!({
                    "submissionId": submission_id,
                    "result": { "status": "Accepted", "executionTime": 0.12, "memoryUsed": 2048 }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);

        for _ in 0..200 {
            if harness.store.mutations() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let stored = harness.store.submission(&submission_id).unwrap();
        assert!(stored.is_processed);
        assert_eq!(stored.penalty, 53);
    }

    #[tokio::test]
    async fn test_dead_letters_rejects_bad_day() {
        let harness = TestEngine::new();
        let response = app(&harness)
            .oneshot(
                Request::get("/internal/dead-letters?day=yesterday")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dead_letters_lists_today() {
        let harness = TestEngine::new();
        let response = app(&harness)
            .oneshot(Request::get("/internal/dead-letters").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 0);
        assert!(body["day"].is_string());
    }
}
