pub mod call_flow;
pub mod config;
pub mod error;
pub mod handlers;
pub mod provider;
pub mod relay;
pub mod twilio_types;
pub mod types;
pub mod utils;

use crate::types::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod consts {
    pub const VOICE: &str = "Polly.Joanna";
    pub const DEFAULT_COMPANY: &str = "Our Company";
    pub const DEFAULT_USER: &str = "Customer";
    pub const BANNED_WORDS: &[&str] = &["password", "otp", "pin", "card", "cvv"];
    pub const STATUS_CALLBACK_EVENTS: &[&str] = &["completed", "failed"];
    pub const CALL_INITIATED: &str = "initiated";
    pub const GATHER_TIMEOUT_SECS: u16 = 20;
    pub const GATHER_NUM_DIGITS: u16 = 1;
    pub const RECORD_SILENCE_TIMEOUT_SECS: u16 = 5;
    pub const RECORD_MAX_LENGTH_SECS: u16 = 60;
    pub const RELAY_TIMEOUT_SECS: u64 = 5;
}

/// Orchestrator routes: start-call, the three Twilio webhooks, and static voice assets.
pub fn app(app_state: Arc<AppState>, voice_dir: &Path) -> Router {
    Router::new()
        .route("/start-call", post(handlers::start_call))
        .route("/voice", post(handlers::voice))
        .route("/gather", post(handlers::gather))
        .route("/status", post(handlers::status))
        .nest_service("/voices", ServeDir::new(voice_dir))
        .route("/", get(|| async { "Hello, World!" }))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
