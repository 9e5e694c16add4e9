use crate::consts::STATUS_CALLBACK_EVENTS;
use crate::error::AppError;
use crate::twilio_types::{CallResource, RestError};
use crate::types::{CreatedCall, OutboundCall};

use async_trait::async_trait;
use tracing::{debug, error};

/// Call placement, as seen by the start-call handler.
#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn create_call(&self, call: &OutboundCall) -> Result<CreatedCall, AppError>;
}

/// Twilio REST client for the Calls resource.
pub struct TwilioClient {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub api_base: String,
    pub http_client: reqwest::Client,
}

impl TwilioClient {
    pub fn new(account_sid: Option<String>, auth_token: Option<String>) -> Self {
        Self {
            account_sid,
            auth_token,
            api_base: "https://api.twilio.com".to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    fn calls_url(&self, account_sid: &str) -> String {
        format!("{}/2010-04-01/Accounts/{account_sid}/Calls.json", self.api_base)
    }
}

/// Form fields for a Calls.json create request.  `StatusCallbackEvent` repeats once per event.
pub fn create_call_form(call: &OutboundCall) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("To", call.to.clone()),
        ("From", call.from.clone()),
        ("Url", call.voice_url.clone()),
        ("StatusCallback", call.status_callback_url.clone()),
        ("StatusCallbackMethod", "POST".to_string()),
    ];
    for event in STATUS_CALLBACK_EVENTS {
        form.push(("StatusCallbackEvent", event.to_string()));
    }
    form
}

#[async_trait]
impl CallProvider for TwilioClient {
    async fn create_call(&self, call: &OutboundCall) -> Result<CreatedCall, AppError> {
        let account_sid = self
            .account_sid
            .as_deref()
            .ok_or(AppError::Misconfigured("TWILIO_ACCOUNT_SID"))?;
        let auth_token = self
            .auth_token
            .as_deref()
            .ok_or(AppError::Misconfigured("TWILIO_AUTH_TOKEN"))?;

        let resp = self
            .http_client
            .post(self.calls_url(account_sid))
            .basic_auth(account_sid, Some(auth_token))
            .form(&create_call_form(call))
            .send()
            .await
            .map_err(|e| {
                error!(error=%e, "failed to send create call request to twilio");
                AppError::from(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            let message = match serde_json::from_str::<RestError>(&body) {
                Ok(rest_error) => {
                    debug!(code=?rest_error.code, status=?rest_error.status, more_info=?rest_error.more_info, "twilio error body");
                    rest_error.message
                }
                Err(_) => body,
            };
            return Err(AppError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let resource = resp.json::<CallResource>().await?;
        debug!(call_sid=%resource.sid, status=?resource.status, "twilio created call");
        Ok(CreatedCall { sid: resource.sid })
    }
}
