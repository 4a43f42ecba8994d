//! AWC challenge tracker backend.
//!
//! The `codec` module is the challenge code engine (tokenizer, section
//! classifier, field extractor, assembler, importer). Everything else wires it
//! to an in-memory store, the AniList forum and an axum HTTP API.

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod forum;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;

pub use routes::build_router;
pub use state::AppState;
