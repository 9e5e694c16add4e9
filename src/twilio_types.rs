pub fn wrap_twiml(twiml: String) -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{twiml}")
}

mod twiml {
    use xmlserde::xml_serde_enum;
    use xmlserde_derives::XmlSerialize;

    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    #[xmlserde(root = b"Response")]
    pub struct Response {
        #[xmlserde(ty = "untag")]
        pub actions: Vec<ResponseAction>,
    }

    #[derive(PartialEq, Eq, XmlSerialize)]
    pub enum ResponseAction {
        #[xmlserde(name = b"Say")]
        Say(SayAction),
        #[xmlserde(name = b"Gather")]
        Gather(GatherAction),
        #[xmlserde(name = b"Record")]
        Record(RecordAction),
        #[xmlserde(name = b"Hangup")]
        Hangup(HangupAction),
    }

    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct SayAction {
        #[xmlserde(ty = "text")]
        pub text: String,
        #[xmlserde(name = b"voice", ty = "attr")]
        pub voice: Option<String>,
        #[xmlserde(name = b"loop", ty = "attr")]
        pub lp: Option<u16>,
        #[xmlserde(name = b"language", ty = "attr")]
        pub language: Option<String>,
    }

    /// Keypad collection.  Nested verbs are played while Twilio waits for input.
    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct GatherAction {
        #[xmlserde(name = b"input", ty = "attr")]
        pub input: Option<GatherInput>,
        /// Seconds of silence before Twilio gives up waiting.
        #[xmlserde(name = b"timeout", ty = "attr")]
        pub timeout: Option<u16>,
        #[xmlserde(name = b"numDigits", ty = "attr")]
        pub num_digits: Option<u16>,
        #[xmlserde(name = b"action", ty = "attr")]
        pub action: Option<String>,
        #[xmlserde(name = b"actionOnEmptyResult", ty = "attr")]
        pub action_on_empty_result: Option<TwimlBool>,
        #[xmlserde(ty = "untag")]
        pub prompts: Vec<GatherPrompt>,
    }

    #[derive(PartialEq, Eq, XmlSerialize)]
    pub enum GatherPrompt {
        #[xmlserde(name = b"Say")]
        Say(SayAction),
    }

    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct RecordAction {
        /// Seconds of silence that end the recording.
        #[xmlserde(name = b"timeout", ty = "attr")]
        pub timeout: Option<u16>,
        #[xmlserde(name = b"maxLength", ty = "attr")]
        pub max_length: Option<u16>,
        #[xmlserde(name = b"playBeep", ty = "attr")]
        pub play_beep: Option<TwimlBool>,
    }

    #[derive(PartialEq, Eq, XmlSerialize, Default)]
    pub struct HangupAction {}

    xml_serde_enum! {
        #[derive(PartialEq, Eq, Debug)]
        GatherInput {
            Dtmf => "dtmf",
        }
    }

    xml_serde_enum! {
        #[derive(PartialEq, Eq, Debug)]
        TwimlBool {
            True => "true",
        }
    }
}
pub use twiml::*;

mod webhook {
    use crate::utils::last_value;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "kebab-case")]
    pub enum CallStatus {
        Queued,
        Initiated,
        Ringing,
        InProgress,
        Completed,
        Busy,
        Failed,
        NoAnswer,
        Canceled,
    }

    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "kebab-case")]
    pub enum CallDirection {
        Inbound,
        OutboundApi,
        OutboundDial,
    }

    /// Query string Twilio echoes back on the voice webhook.  Every value was
    /// placed there by us when the call was created.
    #[derive(Debug, Default)]
    pub struct VoiceQuery {
        pub cid: Option<String>,
        pub company: Option<String>,
        pub user: Option<String>,
    }

    impl VoiceQuery {
        pub fn from_pairs(pairs: &[(String, String)]) -> Self {
            Self {
                cid: last_value(pairs, "cid"),
                company: last_value(pairs, "c"),
                user: last_value(pairs, "u"),
            }
        }
    }

    /// Subset of the Gather action payload we act on.
    #[derive(Debug, Default)]
    pub struct GatherPayload {
        pub call_sid: Option<String>,
        pub digits: Option<String>,
    }

    impl GatherPayload {
        pub fn from_pairs(pairs: &[(String, String)]) -> Self {
            Self {
                call_sid: last_value(pairs, "CallSid"),
                digits: last_value(pairs, "Digits"),
            }
        }
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "PascalCase")]
    pub struct StatusCallbackPayload {
        pub account_sid: Option<String>,
        pub call_sid: Option<String>,
        pub call_status: Option<CallStatus>,
        pub call_duration: Option<String>,
        pub direction: Option<CallDirection>,
        pub from: Option<String>,
        pub to: Option<String>,
        pub timestamp: Option<String>,
    }
}
pub use webhook::*;

mod rest {
    use serde::Deserialize;

    /// The fields of a Call resource returned by `POST .../Calls.json` that we use.
    #[derive(Deserialize, Debug)]
    pub struct CallResource {
        pub sid: String,
        #[serde(default)]
        pub status: Option<String>,
    }

    /// Error body returned by the REST API on 4xx/5xx.
    #[derive(Deserialize, Debug)]
    pub struct RestError {
        pub code: Option<u32>,
        pub message: String,
        #[serde(default)]
        pub more_info: Option<String>,
        #[serde(default)]
        pub status: Option<u16>,
    }
}
pub use rest::*;
