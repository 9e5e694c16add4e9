use crate::call_flow::{gather_result, technical_difficulties, voice_script, KeypadChoice};
use crate::consts::CALL_INITIATED;
use crate::error::{handle_error, AppError};
use crate::twilio_types::{GatherPayload, StatusCallbackPayload, VoiceQuery};
use crate::types::{AppState, CallRequest, OutboundCall, StartCallResponse};
use crate::utils::{find_banned, form_pairs, last_value, render, CallbackUrls};

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

fn twiml_response(twiml: String) -> impl IntoResponse {
    trace!("twiml: '{}'", twiml);
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    (StatusCode::OK, headers, twiml)
}

fn query_pairs(query: Option<&str>) -> Result<Vec<(String, String)>, AppError> {
    match query {
        Some(q) => form_pairs(q.as_bytes()),
        None => Ok(Vec::new()),
    }
}

/// Cid for log correlation; a malformed query just loses it.
fn call_id_of(query: Option<&str>) -> Option<String> {
    query_pairs(query)
        .ok()
        .and_then(|pairs| last_value(&pairs, "cid"))
}

/// Form pairs of a webhook body.  A body that could not be buffered (e.g. over the size limit)
/// is reported the same way as one that could not be decoded.
fn body_pairs(body: Result<Bytes, BytesRejection>) -> Result<Vec<(String, String)>, String> {
    let body = body.map_err(|e| e.to_string())?;
    form_pairs(&body).map_err(|e| e.to_string())
}

async fn place_call(app_state: &AppState, payload: CallRequest) -> Result<StartCallResponse, AppError> {
    if let Some(word) = find_banned(&payload.message) {
        warn!(to=%payload.to_number, word, "refusing call with restricted content");
        return Err(AppError::RestrictedContent);
    }
    let from = app_state
        .from_number
        .as_deref()
        .ok_or(AppError::Misconfigured("TWILIO_FROM_NUMBER"))?;
    let base_url = app_state
        .base_url
        .as_deref()
        .ok_or(AppError::Misconfigured("BASE_URL"))?;

    let call_id = Uuid::new_v4();
    let urls = CallbackUrls::new(base_url, &call_id, &payload.company_name, &payload.user_name);
    let outbound = OutboundCall {
        to: payload.to_number,
        from: from.to_string(),
        voice_url: urls.voice,
        status_callback_url: urls.status,
    };
    let created = app_state.provider.create_call(&outbound).await?;
    info!(call_id=%call_id, call_sid=%created.sid, to=%outbound.to, "call initiated");

    Ok(StartCallResponse::Initiated {
        status: CALL_INITIATED.to_string(),
        sid: created.sid,
        call_id: call_id.to_string(),
    })
}

pub async fn start_call(
    State(app_state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Json<StartCallResponse> {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!(error=%e, "failed to read start-call body");
            return Json(StartCallResponse::Error {
                error: format!("invalid call request: {e}"),
            });
        }
    };
    trace!(body=?body, "start-call request body");
    let result = match serde_json::from_slice::<CallRequest>(&body) {
        Ok(payload) => place_call(&app_state, payload).await,
        Err(e) => {
            error!(error=%e, "failed to deserialize start-call payload");
            Ok(StartCallResponse::Error {
                error: format!("invalid call request: {e}"),
            })
        }
    };
    match result {
        Ok(response) => Json(response),
        Err(e) => {
            // rejections were already logged where they were decided
            if !e.is_rejection() {
                error!(error=%e, "start call failed");
            }
            Json(StartCallResponse::Error {
                error: e.to_string(),
            })
        }
    }
}

pub async fn voice(RawQuery(query): RawQuery) -> impl IntoResponse {
    let twiml = match query_pairs(query.as_deref()) {
        Ok(pairs) => {
            let q = VoiceQuery::from_pairs(&pairs);
            debug!(call_id=?q.cid, company=?q.company, user=?q.user, "voice webhook");
            render(voice_script(
                q.company.as_deref(),
                q.user.as_deref(),
                q.cid.as_deref(),
            ))
        }
        Err(e) => {
            handle_error(e).await;
            render(technical_difficulties())
        }
    };
    twiml_response(twiml)
}

pub async fn gather(
    RawQuery(query): RawQuery,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let call_id = call_id_of(query.as_deref());
    let choice = match body_pairs(body) {
        Ok(pairs) => {
            let payload = GatherPayload::from_pairs(&pairs);
            let choice = KeypadChoice::from_digits(payload.digits.as_deref());
            info!(call_id=?call_id, call_sid=?payload.call_sid, digits=?payload.digits, choice=?choice, "keypad result");
            Some(choice)
        }
        Err(e) => {
            error!(call_id=?call_id, error=%e, "gather handler error");
            None
        }
    };
    twiml_response(render(gather_result(choice)))
}

pub async fn status(
    RawQuery(query): RawQuery,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let call_id = call_id_of(query.as_deref());
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!(call_id=?call_id, error=%e, "status callback error");
            return Json(serde_json::json!({ "ok": true }));
        }
    };
    match form_pairs(&body) {
        Ok(fields) => info!(call_id=?call_id, fields=?fields, "call status"),
        Err(e) => error!(call_id=?call_id, error=%e, "status callback error"),
    }
    match serde_urlencoded::from_bytes::<StatusCallbackPayload>(&body) {
        Ok(payload) => info!(
            call_id=?call_id,
            account_sid=?payload.account_sid,
            call_sid=?payload.call_sid,
            call_status=?payload.call_status,
            duration=?payload.call_duration,
            direction=?payload.direction,
            from=?payload.from,
            to=?payload.to,
            timestamp=?payload.timestamp,
            "call finished"
        ),
        Err(e) => warn!(call_id=?call_id, error=%e, "unrecognized status payload"),
    }
    Json(serde_json::json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::provider::CallProvider;
    use crate::types::{AppState, CreatedCall, OutboundCall};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeProvider {
        calls: Mutex<Vec<OutboundCall>>,
        reject: bool,
    }

    #[async_trait]
    impl CallProvider for FakeProvider {
        async fn create_call(&self, call: &OutboundCall) -> Result<CreatedCall, AppError> {
            self.calls.lock().unwrap().push(call.clone());
            if self.reject {
                return Err(AppError::Provider {
                    status: 400,
                    message: "The 'To' number +1555 is not a valid phone number.".to_string(),
                });
            }
            Ok(CreatedCall {
                sid: "CA0123456789abcdef".to_string(),
            })
        }
    }

    fn router(provider: Arc<FakeProvider>) -> Router {
        let app_state = Arc::new(AppState {
            provider,
            from_number: Some("+15550001111".to_string()),
            base_url: Some("https://cb.example.com".to_string()),
        });
        crate::app(app_state, &std::env::temp_dir())
    }

    async fn send(app: Router, uri: &str, content_type: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn start(app: Router, message: &str) -> serde_json::Value {
        let body = serde_json::json!({
            "to_number": "+1555",
            "company_name": "Acme",
            "user_name": "Jo",
            "message": message,
        });
        let (status, text) = send(app, "/start-call", "application/json", &body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_str(&text).unwrap()
    }

    fn query_value(url: &str, key: &str) -> Option<String> {
        let query = url.split_once('?')?.1;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[tokio::test]
    async fn banned_message_never_reaches_provider() {
        for message in ["your PIN is due", "Confirm your Password", "cvv check", "OTP"] {
            let provider = Arc::new(FakeProvider::default());
            let json = start(router(provider.clone()), message).await;
            assert_eq!(json["error"], "Message contains restricted words.");
            assert!(provider.calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn start_call_returns_sid_and_call_id() {
        let provider = Arc::new(FakeProvider::default());
        let json = start(router(provider.clone()), "hello").await;
        assert_eq!(json["status"], "initiated");
        assert_eq!(json["sid"], "CA0123456789abcdef");
        let call_id = json["call_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(call_id).is_ok());

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to, "+1555");
        assert_eq!(calls[0].from, "+15550001111");
        assert!(calls[0].voice_url.starts_with("https://cb.example.com/voice?"));
        assert!(calls[0]
            .status_callback_url
            .starts_with("https://cb.example.com/status?"));
        assert_eq!(query_value(&calls[0].voice_url, "cid").as_deref(), Some(call_id));
        assert_eq!(
            query_value(&calls[0].status_callback_url, "cid").as_deref(),
            Some(call_id)
        );
    }

    #[tokio::test]
    async fn call_id_flows_from_voice_url_into_gather_action() {
        let provider = Arc::new(FakeProvider::default());
        let json = start(router(provider.clone()), "hello").await;
        let call_id = json["call_id"].as_str().unwrap().to_string();
        let voice_url = provider.calls.lock().unwrap()[0].voice_url.clone();
        let path_and_query = voice_url.trim_start_matches("https://cb.example.com");

        let (status, twiml) = send(router(provider), path_and_query, "application/x-www-form-urlencoded", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(twiml.contains(&format!("action=\"/gather?cid={call_id}\"")));
        assert!(twiml.contains("Hello Jo. This is an automated call from Acme."));
    }

    #[tokio::test]
    async fn provider_rejection_is_reported_as_error() {
        let provider = Arc::new(FakeProvider {
            reject: true,
            ..Default::default()
        });
        let json = start(router(provider), "hello").await;
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("not a valid phone number"));
        assert!(json.get("sid").is_none());
    }

    #[tokio::test]
    async fn missing_origin_number_is_reported_as_error() {
        let provider = Arc::new(FakeProvider::default());
        let app_state = Arc::new(AppState {
            provider: provider.clone(),
            from_number: None,
            base_url: Some("https://cb.example.com".to_string()),
        });
        let json = start(crate::app(app_state, &std::env::temp_dir()), "hello").await;
        assert_eq!(json["error"], "TWILIO_FROM_NUMBER is not configured");
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_start_call_body_is_an_error_body() {
        let provider = Arc::new(FakeProvider::default());
        let (status, text) = send(router(provider), "/start-call", "application/json", "{").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("invalid call request"));
    }

    #[tokio::test]
    async fn voice_without_names_greets_customer() {
        let app = router(Arc::new(FakeProvider::default()));
        let (status, twiml) = send(app, "/voice", "application/x-www-form-urlencoded", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(twiml.contains("Hello Customer. This is an automated call from Our Company."));
        assert!(twiml.contains("<Gather"));
    }

    #[tokio::test]
    async fn voice_with_repeated_params_uses_the_last_value() {
        let app = router(Arc::new(FakeProvider::default()));
        let (status, twiml) = send(app, "/voice?c=A&c=B&u=Jo", "application/x-www-form-urlencoded", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(twiml.contains("Hello Jo. This is an automated call from B."));
        assert!(twiml.contains("<Gather"));
    }

    #[tokio::test]
    async fn voice_is_served_as_xml() {
        let app = router(Arc::new(FakeProvider::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/voice?c=Acme&u=Jo")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/xml"
        );
    }

    #[tokio::test]
    async fn gather_one_confirms_without_recording() {
        let app = router(Arc::new(FakeProvider::default()));
        let (_, twiml) = send(app, "/gather?cid=abc", "application/x-www-form-urlencoded", "Digits=1&CallSid=CA1").await;
        assert!(twiml.contains("Thank you. Your confirmation has been recorded."));
        assert!(twiml.contains("Thank you for your time. Goodbye."));
        assert!(twiml.contains("<Hangup"));
        assert!(!twiml.contains("<Record"));
    }

    #[tokio::test]
    async fn gather_two_opens_recording() {
        let app = router(Arc::new(FakeProvider::default()));
        let (_, twiml) = send(app, "/gather", "application/x-www-form-urlencoded", "Digits=2").await;
        assert!(twiml.contains("Please leave your message after the beep."));
        assert!(twiml.contains("<Record"));
        assert!(twiml.contains("maxLength=\"60\""));
        assert!(twiml.contains("playBeep=\"true\""));
        assert!(twiml.contains("<Hangup"));
    }

    #[tokio::test]
    async fn gather_other_input_is_invalid() {
        for body in ["", "Digits=", "Digits=9", "Digits=12", "CallSid=CA1"] {
            let app = router(Arc::new(FakeProvider::default()));
            let (status, twiml) = send(app, "/gather", "application/x-www-form-urlencoded", body).await;
            assert_eq!(status, StatusCode::OK);
            let invalid_at = twiml
                .find("Invalid input. No further action is required.")
                .unwrap();
            let hangup_at = twiml.find("<Hangup").unwrap();
            assert!(invalid_at < hangup_at);
            assert!(!twiml.contains("<Record"));
        }
    }

    #[tokio::test]
    async fn gather_with_repeated_digits_uses_the_last_press() {
        let app = router(Arc::new(FakeProvider::default()));
        let (status, twiml) = send(app, "/gather", "application/x-www-form-urlencoded", "Digits=1&Digits=2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(twiml.contains("Please leave your message after the beep."));
        assert!(twiml.contains("<Record"));
        assert!(twiml.contains("<Hangup"));
    }

    fn oversized_form() -> String {
        format!("CallSid=CA1&Pad={}", "x".repeat(3 * 1024 * 1024))
    }

    #[tokio::test]
    async fn gather_oversized_body_still_hangs_up() {
        let app = router(Arc::new(FakeProvider::default()));
        let (status, twiml) = send(app, "/gather?cid=a", "application/x-www-form-urlencoded", &oversized_form()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(twiml.contains("An error occurred. Goodbye."));
        assert!(twiml.contains("Thank you for your time. Goodbye."));
        assert!(twiml.contains("<Hangup"));
    }

    #[tokio::test]
    async fn status_oversized_body_is_acknowledged() {
        let app = router(Arc::new(FakeProvider::default()));
        let (status, text) = send(app, "/status?cid=a", "application/x-www-form-urlencoded", &oversized_form()).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn start_call_oversized_body_is_an_error_body() {
        let provider = Arc::new(FakeProvider::default());
        let (status, text) = send(router(provider.clone()), "/start-call", "application/json", &oversized_form()).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("invalid call request"));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_always_acknowledges() {
        for body in [
            "AccountSid=AC1&CallSid=CA1&CallStatus=completed&CallDuration=42&Direction=outbound-api&From=%2B1999&To=%2B1555&Timestamp=Sat",
            "CallStatus=failed",
            "CallStatus=exploded",
            "%%%&&&===",
            "",
        ] {
            let app = router(Arc::new(FakeProvider::default()));
            let (status, text) = send(app, "/status?cid=abc", "application/x-www-form-urlencoded", body).await;
            assert_eq!(status, StatusCode::OK);
            let json: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(json, serde_json::json!({ "ok": true }));
        }
    }
}
