#![allow(dead_code)]

use std::sync::Arc;

use awc_backend::codec::RequirementSet;
use awc_backend::config::AppConfig;
use awc_backend::domain::{Category, Challenge, Mode, Requirement};
use awc_backend::{build_router, AppState};
use axum::body::Body;
use axum::http::Request;
use axum::Router;

/// State with the forum client switched off.
pub fn offline_state() -> Arc<AppState> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let mut config = AppConfig::default();
    config.forum.enabled = false;
    Arc::new(AppState::with_config(config))
}

pub fn test_app() -> (Router, Arc<AppState>) {
    let state = offline_state();
    (build_router(state.clone()), state)
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

/// Beginner's Challenge: a Tier challenge with two Default requirements.
pub fn tier_challenge() -> (Challenge, RequirementSet) {
    let challenge = Challenge::new("Beginner's Challenge", 4448, Category::Tier);
    let mut one = Requirement::new(challenge.id, 1, Mode::Default, false);
    one.text = "Watch an anime from the recently reviewed section".into();
    let mut two = Requirement::new(challenge.id, 2, Mode::Default, false);
    two.text = "Watch an anime with a female lead".into();
    two.extra_newline = true;
    two.extra = "Female lead:".into();
    (challenge, RequirementSet::Stored(vec![one, two]))
}

pub const ROMANCE_TEMPLATE: &str = "# __Romance Challenge__

Challenge Start Date: DD/MM/YYYY
Challenge Finish Date: DD/MM/YYYY
Legend: [X] = Completed [O] = Not Completed [U] = Up-to-date

<hr>

__Mode: Easy__

01) [O] __Watch a romance anime__
[Anime Title](https://anilist.co/anime/00000/)
Start: DD/MM/YYYY Finish: DD/MM/YYYY

__Mode: Hard__

02) [O] __Watch Toradora__
[Toradora!](https://anilist.co/anime/4224/) // any season
Start: DD/MM/YYYY Finish: DD/MM/YYYY

__Bonus__

B01) [O] __Watch a romance movie__
[Anime Title](https://anilist.co/anime/00000/)
Start: DD/MM/YYYY Finish: DD/MM/YYYY

<hr>

Have fun!";
