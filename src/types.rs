use crate::provider::CallProvider;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /start-call`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CallRequest {
    pub to_number: String,
    pub company_name: String,
    pub user_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro: Option<String>,
}

/// Reply to `POST /start-call`.  The outcome travels in the body, never in the status code.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum StartCallResponse {
    Initiated {
        status: String,
        sid: String,
        call_id: String,
    },
    Error {
        error: String,
    },
}

/// Everything the provider needs to place one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundCall {
    pub to: String,
    pub from: String,
    pub voice_url: String,
    pub status_callback_url: String,
}

#[derive(Clone, Debug)]
pub struct CreatedCall {
    pub sid: String,
}

pub struct AppState {
    pub provider: Arc<dyn CallProvider>,
    pub from_number: Option<String>,
    pub base_url: Option<String>,
}
