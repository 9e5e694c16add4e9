//! Telegram command relay: turns `/call` into one `POST /start-call` against the orchestrator.

use crate::consts::RELAY_TIMEOUT_SECS;
use crate::types::CallRequest;

use std::sync::Arc;
use std::time::Duration;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{error, info};

pub const WELCOME: &str = "Welcome! Use /call to initiate a system alert call.";
pub const NUMBER_PROMPT: &str = "Enter the phone number to call:";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome text.")]
    Start,
    #[command(description = "place a system alert call.")]
    Call,
}

/// The fixed request `/call` sends.
pub fn demo_call_request() -> CallRequest {
    CallRequest {
        to_number: "+1234567890".to_string(),
        company_name: "MyCompany".to_string(),
        user_name: "Client".to_string(),
        message: "This is a system update alert. Please confirm receipt.".to_string(),
        outro: Some("Thank you and goodbye.".to_string()),
    }
}

/// Raw result of one start-call request, as reported back to the chat.
#[derive(Debug)]
pub enum RelayOutcome {
    /// 2xx with a JSON body; the body may itself carry an `error`.
    Initiated(serde_json::Value),
    /// Non-2xx; the response text.
    Failed(String),
    /// Transport or decoding failure.
    Error(String),
}

impl RelayOutcome {
    pub fn reply_text(&self) -> String {
        match self {
            RelayOutcome::Initiated(body) => format!("Call initiated: {body}"),
            RelayOutcome::Failed(text) => format!("Failed: {text}"),
            RelayOutcome::Error(e) => format!("Error: {e}"),
        }
    }
}

pub struct StartCallClient {
    http_client: reqwest::Client,
    backend_url: String,
}

impl StartCallClient {
    pub fn new(backend_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RELAY_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http_client,
            backend_url: backend_url.into(),
        })
    }

    pub fn start_call_url(&self) -> String {
        format!("{}/start-call", self.backend_url.trim_end_matches('/'))
    }

    pub async fn start_call(&self, request: &CallRequest) -> RelayOutcome {
        let resp = match self
            .http_client
            .post(self.start_call_url())
            .json(request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!(error=%e, "failed to reach start-call endpoint");
                return RelayOutcome::Error(e.to_string());
            }
        };
        if resp.status().is_success() {
            match resp.json::<serde_json::Value>().await {
                Ok(body) => RelayOutcome::Initiated(body),
                Err(e) => RelayOutcome::Error(e.to_string()),
            }
        } else {
            match resp.text().await {
                Ok(text) => RelayOutcome::Failed(text),
                Err(e) => RelayOutcome::Error(e.to_string()),
            }
        }
    }
}

/// Command endpoint for the teloxide dispatcher.
pub async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    client: Arc<StartCallClient>,
) -> ResponseResult<()> {
    info!(chat_id=?msg.chat.id, command=?cmd, "relay command");
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, WELCOME).await?;
        }
        Command::Call => {
            bot.send_message(msg.chat.id, NUMBER_PROMPT).await?;
            let outcome = client.start_call(&demo_call_request()).await;
            bot.send_message(msg.chat.id, outcome.reply_text()).await?;
        }
    }
    Ok(())
}
