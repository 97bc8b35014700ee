use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use shared::protocol::EventCategory;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

fn turn_result_json(game_id: &str, turn: u32) -> Value {
    json!({
        "game_id": game_id,
        "turn": turn,
        "max_turns": 20,
        "is_finished": false,
        "events": [
            {
                "id": "ev-1",
                "name": "Market Boom",
                "description": "Productivity surges across the economy.",
                "category": "economic"
            },
            {
                "id": "ev-2",
                "name": "Strange Weather",
                "description": "Nobody is sure what this means.",
                "category": "weather"
            }
        ],
        "state": {
            "gini": 0.42,
            "mean_wealth": 12.5,
            "mean_happiness": 0.6,
            "mean_productivity": 1.1,
            "tax_revenue": 3.0,
            "ubi_amount": 0.0,
            "total_income": 100.0,
            "population": 100,
            "agents_in_poverty": 12,
            "agents_bankrupt": 1,
            "wealth_distribution": [10, 25, 40, 20, 5]
        },
        "history": {
            "gini": [0.42],
            "mean_wealth": [12.5],
            "mean_happiness": [0.6],
            "mean_productivity": [1.1]
        },
        "scores": null,
        "policies": {
            "tax_enabled": false,
            "tax_brackets": [
                { "threshold": 0.0, "rate": 0.0 },
                { "threshold": 10.0, "rate": 0.1 },
                { "threshold": 30.0, "rate": 0.2 },
                { "threshold": 50.0, "rate": 0.3 }
            ],
            "ubi_enabled": false,
            "income_enabled": true,
            "base_income": 1.0,
            "education_enabled": false,
            "education_rate": 0.1
        }
    })
}

async fn spawn_backend(recorded: Recorded) -> String {
    let create_state = recorded.clone();
    let turn_state = recorded.clone();
    let delete_state = recorded;
    let router = Router::new()
        .route(
            "/api/v1/games",
            post(move |Json(body): Json<Value>| {
                let recorded = create_state.clone();
                async move {
                    recorded
                        .requests
                        .lock()
                        .await
                        .push(("/api/v1/games".to_string(), body));
                    Json(turn_result_json("g1", 1))
                }
            }),
        )
        .route(
            "/api/v1/games/:game_id/turn",
            post(
                move |Path(game_id): Path<String>, Json(body): Json<Value>| {
                    let recorded = turn_state.clone();
                    async move {
                        recorded
                            .requests
                            .lock()
                            .await
                            .push((format!("/api/v1/games/{game_id}/turn"), body));
                        Json(turn_result_json(&game_id, 2))
                    }
                },
            ),
        )
        .route(
            "/api/v1/games/:game_id",
            delete(move |Path(game_id): Path<String>| {
                let recorded = delete_state.clone();
                async move {
                    recorded
                        .requests
                        .lock()
                        .await
                        .push((format!("/api/v1/games/{game_id}"), Value::Null));
                    Json(json!({ "status": "deleted" }))
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

async fn spawn_failing_backend(status: StatusCode, body: &'static str) -> String {
    let router = Router::new()
        .route("/api/v1/games", post(move || async move { (status, body) }))
        .route(
            "/api/v1/games/:game_id/turn",
            post(move |_: Path<String>| async move { (status, body) }),
        );
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn create_session_posts_difficulty_and_seed() {
    let recorded = Recorded::default();
    let base = spawn_backend(recorded.clone()).await;
    let gateway = HttpBackendGateway::new(base);

    let result = gateway
        .create_session(Difficulty::Hard, Some(1234))
        .await
        .expect("create session");

    assert_eq!(result.game_id, SessionId::new("g1"));
    assert_eq!(result.turn, 1);
    // Unknown event categories decode generically instead of failing.
    assert_eq!(result.events[0].category, EventCategory::Economic);
    assert_eq!(result.events[1].category, EventCategory::Other);

    let requests = recorded.requests.lock().await;
    assert_eq!(
        requests[0],
        (
            "/api/v1/games".to_string(),
            json!({ "difficulty": "hard", "seed": 1234 })
        )
    );
}

#[tokio::test]
async fn advance_turn_submits_full_policy_set_to_session_path() {
    let recorded = Recorded::default();
    let base = spawn_backend(recorded.clone()).await;
    let gateway = HttpBackendGateway::new(base);
    let policies = PolicySet {
        tax_enabled: true,
        ..PolicySet::default()
    };

    let result = gateway
        .advance_turn(&SessionId::new("g1"), &policies)
        .await
        .expect("advance turn");
    assert_eq!(result.turn, 2);
    assert_eq!(result.scores, None);

    let requests = recorded.requests.lock().await;
    let (path, body) = &requests[0];
    assert_eq!(path, "/api/v1/games/g1/turn");
    assert_eq!(body["policies"]["tax_enabled"], json!(true));
    assert_eq!(body["policies"]["tax_brackets"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn abandon_session_deletes_session_resource() {
    let recorded = Recorded::default();
    let base = spawn_backend(recorded.clone()).await;
    let gateway = HttpBackendGateway::new(base);

    gateway
        .abandon_session(&SessionId::new("g1"))
        .await
        .expect("abandon session");

    let requests = recorded.requests.lock().await;
    assert_eq!(requests[0].0, "/api/v1/games/g1");
}

#[tokio::test]
async fn non_success_status_carries_status_and_body_text() {
    let base = spawn_failing_backend(StatusCode::BAD_REQUEST, "Game is already finished").await;
    let gateway = HttpBackendGateway::new(base);

    let err = gateway
        .advance_turn(&SessionId::new("g1"), &PolicySet::default())
        .await
        .expect_err("should fail");

    match err {
        GatewayError::Api { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "Game is already finished");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    // The normalized message is what lands in SessionState::error.
    let base = spawn_failing_backend(StatusCode::NOT_FOUND, "Game not found").await;
    let gateway = HttpBackendGateway::new(base);
    let err = gateway
        .create_session(Difficulty::Normal, None)
        .await
        .expect_err("should fail");
    assert_eq!(err.to_string(), "API error 404: Game not found");
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let recorded = Recorded::default();
    let base = spawn_backend(recorded.clone()).await;
    let gateway = HttpBackendGateway::new(format!("{base}/"));

    gateway
        .create_session(Difficulty::Easy, None)
        .await
        .expect("create session");
    assert_eq!(recorded.requests.lock().await[0].0, "/api/v1/games");
}
