// tests/api_tests.rs

use std::sync::Arc;
use std::time::Duration;

use daily_quiz::{
    config::Config,
    engine::{bridge::EventBridge, runtime::SessionRegistry},
    routes,
    state::AppState,
    store::MemoryStore,
};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Runs with a 20ms engine tick so one logical "second" of quiz time
/// passes every 20ms of wall clock.
async fn spawn_app() -> String {
    let config = Config {
        rust_log: "error".to_string(),
        question_seconds: 60,
        feedback_seconds: 1,
        questions_per_attempt: 10,
        tick_millis: 20,
        seed_questions: None,
    };

    let store = Arc::new(MemoryStore::new());
    let bridge = Arc::new(EventBridge::new());
    let registry = Arc::new(SessionRegistry::new(
        Arc::clone(&bridge),
        store.clone(),
        store.clone(),
        config.timer_settings(),
        Duration::from_millis(config.tick_millis),
    ));

    let state = AppState { store, registry, bridge, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_participant() -> String {
    format!("p_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Creates one bank question over options a/b and returns its id.
async fn seed_question(client: &reqwest::Client, address: &str, correct: &str) -> String {
    let response = client
        .post(&format!("{}/api/admin/questions", address))
        .json(&serde_json::json!({
            "prompt": format!("Which option is {}?", correct),
            "options": [
                { "id": "a", "text": "Option A" },
                { "id": "b", "text": "Option B" }
            ],
            "correct_option_id": correct
        }))
        .send()
        .await
        .expect("Failed to create question");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

/// Creates and publishes a quiz over the given question ids; returns its id.
async fn publish_quiz(client: &reqwest::Client, address: &str, question_ids: &[String]) -> String {
    let response = client
        .post(&format!("{}/api/admin/quizzes", address))
        .json(&serde_json::json!({
            "title": "Daily quiz",
            "duration_minutes": 10,
            "question_ids": question_ids
        }))
        .send()
        .await
        .expect("Failed to create quiz");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let quiz_id = body["id"].as_str().unwrap().to_string();

    let response = client
        .post(&format!("{}/api/admin/quizzes/{}/publish", address, quiz_id))
        .send()
        .await
        .expect("Failed to publish quiz");
    assert_eq!(response.status().as_u16(), 200);

    quiz_id
}

/// Polls the session projection until `predicate` accepts it.
async fn wait_for_session(
    client: &reqwest::Client,
    address: &str,
    participant: &str,
    predicate: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    for _ in 0..300 {
        let body: serde_json::Value = client
            .get(&format!("{}/api/session/{}", address, participant))
            .send()
            .await
            .expect("Failed to fetch session")
            .json()
            .await
            .expect("Failed to parse session json");
        if predicate(&body["session"]) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached the expected state");
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn no_active_quiz_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/quiz/active", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn question_validation_rejects_bad_payloads() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // A single option is not a multiple-choice question
    let response = client
        .post(&format!("{}/api/admin/questions", address))
        .json(&serde_json::json!({
            "prompt": "Only one way out?",
            "options": [{ "id": "a", "text": "Yes" }],
            "correct_option_id": "a"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    // Correct option must be one of the options
    let response = client
        .post(&format!("{}/api/admin/questions", address))
        .json(&serde_json::json!({
            "prompt": "Which one?",
            "options": [
                { "id": "a", "text": "A" },
                { "id": "b", "text": "B" }
            ],
            "correct_option_id": "z"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn publish_is_once_only_and_active_quiz_hides_answers() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let q = seed_question(&client, &address, "a").await;
    let quiz_id = publish_quiz(&client, &address, &[q]).await;

    // Second publish must not re-stamp the anchor
    let response = client
        .post(&format!("{}/api/admin/quizzes/{}/publish", address, quiz_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 409);

    let body: serde_json::Value = client
        .get(&format!("{}/api/quiz/active", address))
        .send()
        .await
        .expect("Failed to fetch active quiz")
        .json()
        .await
        .unwrap();

    assert_eq!(body["id"].as_str().unwrap(), quiz_id);
    assert_eq!(body["question_count"], 1);
    assert!(body["published_at"].is_string());
    assert!(body.get("correct_option_id").is_none());
    assert!(body.get("question_ids").is_none());
}

#[tokio::test]
async fn answering_before_any_quiz_is_not_ready() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let participant = unique_participant();

    let response = client
        .post(&format!("{}/api/session/join", address))
        .json(&serde_json::json!({ "participant_id": participant }))
        .send()
        .await
        .expect("Failed to join");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["session"]["phase"], "awaiting_quiz");

    let response = client
        .post(&format!("{}/api/session/{}/answer", address, participant))
        .json(&serde_json::json!({ "option_id": "a" }))
        .send()
        .await
        .expect("Failed to answer");
    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn join_is_idempotent_and_leave_tears_down() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let participant = unique_participant();

    let first = client
        .post(&format!("{}/api/session/join", address))
        .json(&serde_json::json!({ "participant_id": participant }))
        .send()
        .await
        .expect("Failed to join");
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(&format!("{}/api/session/join", address))
        .json(&serde_json::json!({ "participant_id": participant }))
        .send()
        .await
        .expect("Failed to rejoin");
    assert_eq!(second.status().as_u16(), 200);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["online"], 1);

    let response = client
        .delete(&format!("{}/api/session/{}", address, participant))
        .send()
        .await
        .expect("Failed to leave");
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(&format!("{}/api/session/{}", address, participant))
        .send()
        .await
        .expect("Failed to fetch session");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_full_attempt_flow() {
    // Arrange: quiz with two questions, correct options "b" then "a"
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let q1 = seed_question(&client, &address, "b").await;
    let q2 = seed_question(&client, &address, "a").await;
    let quiz_id = publish_quiz(&client, &address, &[q1, q2]).await;

    // 1. Join after publication: the session loads the active quiz
    let participant = unique_participant();
    let response = client
        .post(&format!("{}/api/session/join", address))
        .json(&serde_json::json!({ "participant_id": participant }))
        .send()
        .await
        .expect("Failed to join");
    assert_eq!(response.status().as_u16(), 201);

    let body = wait_for_session(&client, &address, &participant, |s| {
        s["phase"] == "in_progress"
    })
    .await;
    assert_eq!(body["session"]["total_questions"], 2);
    assert_eq!(body["session"]["question_index"], 0);
    // Participants never see the answer key
    assert!(body["session"]["question"].get("correct_option_id").is_none());

    // 2. First question: "b" is correct
    let response = client
        .post(&format!("{}/api/session/{}/answer", address, participant))
        .json(&serde_json::json!({ "option_id": "b" }))
        .send()
        .await
        .expect("Failed to answer");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["feedback"]["is_correct"], true);

    // 3. Feedback clears and the second question comes up with a full budget
    let body = wait_for_session(&client, &address, &participant, |s| {
        s["phase"] == "in_progress" && s["question_index"] == 1
    })
    .await;
    // Full budget minus a little polling slack
    assert!(body["session"]["question_remaining_secs"].as_u64().unwrap() >= 55);

    // 4. Second question: "a" is correct
    let response = client
        .post(&format!("{}/api/session/{}/answer", address, participant))
        .json(&serde_json::json!({ "option_id": "a" }))
        .send()
        .await
        .expect("Failed to answer");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["feedback"]["is_correct"], true);

    // 5. Falling off the last question finalizes the attempt
    let body = wait_for_session(&client, &address, &participant, |s| {
        s["submitted"] == true
    })
    .await;
    let result = &body["session"]["result"];
    assert_eq!(result["score"], 2);
    assert_eq!(result["total_questions"], 2);
    assert_eq!(result["display"], "2 / 2");
    assert_eq!(result["percent"], 100.0);

    // 6. Exactly one record reached the store
    let submissions: serde_json::Value = client
        .get(&format!("{}/api/admin/quizzes/{}/submissions", address, quiz_id))
        .send()
        .await
        .expect("Failed to list submissions")
        .json()
        .await
        .unwrap();
    let submissions = submissions.as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["participant_id"].as_str().unwrap(), participant);
    assert_eq!(submissions[0]["score"], 2);
    assert_eq!(submissions[0]["answers"].as_array().unwrap().len(), 2);

    // 7. And the leaderboard shows it
    let leaderboard: serde_json::Value = client
        .get(&format!("{}/api/quiz/{}/leaderboard", address, quiz_id))
        .send()
        .await
        .expect("Failed to fetch leaderboard")
        .json()
        .await
        .unwrap();
    assert_eq!(leaderboard.as_array().unwrap().len(), 1);
    assert_eq!(leaderboard[0]["score"], 2);
}

#[tokio::test]
async fn answer_during_feedback_is_dropped_silently() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let q1 = seed_question(&client, &address, "a").await;
    let q2 = seed_question(&client, &address, "a").await;
    publish_quiz(&client, &address, &[q1, q2]).await;

    let participant = unique_participant();
    client
        .post(&format!("{}/api/session/join", address))
        .json(&serde_json::json!({ "participant_id": participant }))
        .send()
        .await
        .expect("Failed to join");
    wait_for_session(&client, &address, &participant, |s| s["phase"] == "in_progress").await;

    let response = client
        .post(&format!("{}/api/session/{}/answer", address, participant))
        .json(&serde_json::json!({ "option_id": "a" }))
        .send()
        .await
        .expect("Failed to answer");
    let first: serde_json::Value = response.json().await.unwrap();

    // Immediately answer again; if feedback is still showing this is a
    // silent no-op, otherwise it records question 2. Either way only one
    // answer per question may exist.
    let response = client
        .post(&format!("{}/api/session/{}/answer", address, participant))
        .json(&serde_json::json!({ "option_id": "b" }))
        .send()
        .await
        .expect("Failed to answer again");
    assert_eq!(response.status().as_u16(), 200);
    let second: serde_json::Value = response.json().await.unwrap();

    assert_eq!(first["feedback"]["is_correct"], true);
    assert!(second["session"]["answered_count"].as_u64().unwrap() <= 2);
    if second["feedback"].is_null() {
        // Dropped: still one recorded answer
        assert_eq!(second["session"]["answered_count"], 1);
    }
}
