mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, empty_request, json_request, test_app, ROMANCE_TEMPLATE};

async fn import_romance(app: &axum::Router) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/challenges/import",
            json!({ "text": ROMANCE_TEMPLATE, "thread_id": 5000, "category": "genre" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn health_reports_forum_state() {
    let (app, _) = test_app();
    let response = app.oneshot(empty_request("GET", "/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true, "forum": false }));
}

#[tokio::test]
async fn import_is_idempotent_and_listed() {
    let (app, _) = test_app();
    let created = import_romance(&app).await;
    assert_eq!(created["created"], true);
    assert_eq!(created["requirements"], 3);
    assert_eq!(created["challenge"]["allows_up_to_date"], true);

    let again = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/challenges/import",
            json!({ "text": ROMANCE_TEMPLATE, "thread_id": 5000, "category": "genre" }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    let again = body_json(again).await;
    assert_eq!(again["created"], false);
    assert_eq!(again["challenge"]["id"], created["challenge"]["id"]);

    let list = body_json(app.oneshot(empty_request("GET", "/api/v1/challenges")).await.unwrap()).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["name"], "Romance Challenge");
}

#[tokio::test]
async fn import_without_title_is_rejected() {
    let (app, _) = test_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/challenges/import",
            json!({ "text": "no title here", "thread_id": 1, "category": "tier" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn render_then_parse_through_the_api() {
    let (app, _) = test_app();
    let id = import_romance(&app).await["challenge"]["id"].as_str().unwrap().to_string();

    let rendered = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/challenges/{}/render", id),
            json!({
                "dialect": "current",
                "fields": {
                    "start": "05/03/2020",
                    "requirements": [{ "number": 2, "completed": "completed", "finish": "2020-03-20" }]
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(rendered.status(), StatusCode::OK);
    let comment = body_json(rendered).await["comment"].as_str().unwrap().to_string();
    assert!(comment.contains("Challenge Start Date: 2020-03-05"));
    assert!(comment.contains("02) [X] __Watch Toradora__\n[Toradora!](https://anilist.co/anime/4224/) // any season"));

    let parsed = body_json(
        app.clone()
            .oneshot(json_request("POST", &format!("/api/v1/challenges/{}/parse", id), json!({ "comment": comment })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(parsed["failed"], false);
    assert_eq!(parsed["parsed"]["requirements"][1]["mode"], "hard");
    assert_eq!(parsed["parsed"]["requirements"][1]["progress"]["completed"], "completed");
    assert_eq!(parsed["parsed"]["requirements"][1]["progress"]["finish"], "2020-03-20");

    let broken = comment.replace("02) [X]", "07) [X]");
    let failed = body_json(
        app.oneshot(json_request("POST", &format!("/api/v1/challenges/{}/parse", id), json!({ "comment": broken })))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(failed["failed"], true);
    assert_eq!(failed["comment"], broken);
    assert_eq!(failed["error"]["kind"], "unknown_requirement");
}

#[tokio::test]
async fn unknown_challenge_is_not_found() {
    let (app, _) = test_app();
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/challenges/{}/parse", uuid::Uuid::new_v4()),
            json!({ "comment": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_feeds_the_profile_code() {
    let (app, _) = test_app();
    let id = import_romance(&app).await["challenge"]["id"].as_str().unwrap().to_string();

    let registered = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/challenges/{}/register", id),
            json!({ "user": "mika", "comment_id": 777 }),
        ))
        .await
        .unwrap();
    assert_eq!(registered.status(), StatusCode::CREATED);
    assert_eq!(body_json(registered).await["url"], "https://anilist.co/forum/thread/5000/comment/777");

    let profile = body_json(app.oneshot(empty_request("GET", "/api/v1/users/mika/profile_code")).await.unwrap()).await;
    assert_eq!(
        profile["code"],
        "__Current__\n\n[Romance Challenge](https://anilist.co/forum/thread/5000/comment/777)"
    );
}

#[tokio::test]
async fn forum_operations_need_token_and_client() {
    let (app, _) = test_app();
    let id = import_romance(&app).await["challenge"]["id"].as_str().unwrap().to_string();

    let join = app
        .clone()
        .oneshot(json_request("POST", &format!("/api/v1/challenges/{}/join", id), json!({ "user": "mika" })))
        .await
        .unwrap();
    assert_eq!(join.status(), StatusCode::UNAUTHORIZED);

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/challenges/{}/register", id),
            json!({ "user": "mika", "comment_id": 777 }),
        ))
        .await
        .unwrap();
    let fetch = app
        .oneshot(empty_request("GET", &format!("/api/v1/challenges/{}/submission?user=mika", id)))
        .await
        .unwrap();
    assert_eq!(fetch.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn scanned_comments_register_earliest_per_thread() {
    let (app, state) = test_app();
    import_romance(&app).await;

    let comments = [
        awc_backend::domain::CommentLocator { thread_id: 5000, comment_id: 900 },
        awc_backend::domain::CommentLocator { thread_id: 5000, comment_id: 800 },
        awc_backend::domain::CommentLocator { thread_id: 1234, comment_id: 1 },
    ];
    let registered = awc_backend::logic::register_scanned(&state, "mika", &comments).await;
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].url, "https://anilist.co/forum/thread/5000/comment/800");

    let again = awc_backend::logic::register_scanned(&state, "mika", &comments).await;
    assert!(again.is_empty());
}

#[tokio::test]
async fn scan_without_user_id_needs_the_token_owner() {
    let (offline, _) = test_app();
    let response = offline
        .oneshot(json_request("POST", "/api/v1/users/mika/scan", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let state = std::sync::Arc::new(awc_backend::AppState::with_config(awc_backend::config::AppConfig::default()));
    let app = awc_backend::build_router(state);
    let response = app
        .oneshot(json_request("POST", "/api/v1/users/mika/scan", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
