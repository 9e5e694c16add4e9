use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_VOICE_DIR: &str = "./voices";

fn optional_var(name: &'static str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => {
            warn!("{name} not set");
            None
        }
    }
}

/// Orchestrator settings.  Provider settings may be missing; start-call then reports the gap.
#[derive(Debug, Clone)]
pub struct Config {
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
    pub base_url: Option<String>,
    /// Speech synthesis key for pre-rendered prompts under `/voices`.
    pub openai_api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub voice_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()?;
        let voice_dir = env::var("VOICE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_VOICE_DIR));
        Ok(Self {
            twilio_account_sid: optional_var("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: optional_var("TWILIO_AUTH_TOKEN"),
            twilio_from_number: optional_var("TWILIO_FROM_NUMBER"),
            base_url: optional_var("BASE_URL"),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            bind_addr,
            voice_dir,
        })
    }
}

/// Command relay settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bot_token: String,
    /// Where the orchestrator's `/start-call` lives.
    pub backend_url: String,
}

impl RelayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN not set in .env"))?;
        let backend_url = env::var("BASE_URL").unwrap_or_default();
        Ok(Self {
            bot_token,
            backend_url,
        })
    }
}
