use crate::consts::BANNED_WORDS;
use crate::error::AppError;
use crate::twilio_types::{wrap_twiml, Response};

use serde::Serialize;
use uuid::Uuid;

/// Returns the first restricted term found in `text`, ignoring case.
pub fn find_banned(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    BANNED_WORDS.iter().copied().find(|w| lowered.contains(w))
}

/// Callback URLs handed to Twilio for one call.  Both carry the same `cid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub voice: String,
    pub status: String,
}

#[derive(Serialize)]
struct VoiceParams<'a> {
    cid: &'a str,
    c: &'a str,
    u: &'a str,
}

#[derive(Serialize)]
struct CidParam<'a> {
    cid: &'a str,
}

impl CallbackUrls {
    pub fn new(base_url: &str, call_id: &Uuid, company: &str, user: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let cid = call_id.to_string();
        let voice_query = serde_urlencoded::to_string(VoiceParams {
            cid: &cid,
            c: company,
            u: user,
        })
        .unwrap_or_else(|_| format!("cid={cid}"));
        Self {
            voice: format!("{base}/voice?{voice_query}"),
            status: format!("{base}/status?{}", cid_query(&cid)),
        }
    }
}

pub fn cid_query(cid: &str) -> String {
    serde_urlencoded::to_string(CidParam { cid }).unwrap_or_default()
}

/// Relative action URL for the gather verb, keeping the call id when we have one.
pub fn gather_action(cid: Option<&str>) -> String {
    match cid {
        Some(cid) => format!("/gather?{}", cid_query(cid)),
        None => "/gather".to_string(),
    }
}

/// Decode a query string or form body into its raw pairs, in order.
pub fn form_pairs(input: &[u8]) -> Result<Vec<(String, String)>, AppError> {
    Ok(serde_urlencoded::from_bytes(input)?)
}

/// Value of the last occurrence of `key`; repeated keys resolve to the final one.
pub fn last_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

pub fn render(response: Response) -> String {
    wrap_twiml(xmlserde::xml_serialize(response))
}
