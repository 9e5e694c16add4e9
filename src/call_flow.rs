//! TwiML documents for each step of the call.
//!
//! Twilio drives the call: it fetches the greeting from `/voice`, posts the pressed key to
//! `/gather`, and reports the outcome to `/status`.  Nothing here keeps state between steps.

use crate::consts::{
    DEFAULT_COMPANY, DEFAULT_USER, GATHER_NUM_DIGITS, GATHER_TIMEOUT_SECS, RECORD_MAX_LENGTH_SECS,
    RECORD_SILENCE_TIMEOUT_SECS, VOICE,
};
use crate::twilio_types::{
    GatherAction, GatherInput, GatherPrompt, HangupAction, RecordAction, Response, ResponseAction,
    SayAction, TwimlBool,
};
use crate::utils::gather_action;

fn say(text: impl Into<String>) -> SayAction {
    SayAction {
        text: text.into(),
        voice: Some(VOICE.to_string()),
        ..Default::default()
    }
}

/// Say without a voice attribute; used on fault paths so nothing optional can go wrong.
fn plain_say(text: &str) -> ResponseAction {
    ResponseAction::Say(SayAction {
        text: text.to_string(),
        ..Default::default()
    })
}

/// Greeting plus the single-digit keypad prompt.
pub fn voice_script(company: Option<&str>, user: Option<&str>, cid: Option<&str>) -> Response {
    let company = company.unwrap_or(DEFAULT_COMPANY);
    let user = user.unwrap_or(DEFAULT_USER);

    let greeting = say(format!(
        "Hello {user}. This is an automated call from {company}."
    ));
    let gather = GatherAction {
        input: Some(GatherInput::Dtmf),
        timeout: Some(GATHER_TIMEOUT_SECS),
        num_digits: Some(GATHER_NUM_DIGITS),
        action: Some(gather_action(cid)),
        action_on_empty_result: Some(TwimlBool::True),
        prompts: vec![GatherPrompt::Say(say(
            "This message is regarding a system update. \
             Press 1 to confirm receipt. \
             Press 2 to leave a voice message.",
        ))],
    };
    // Only reached if Twilio falls through the gather without redirecting.
    let no_input = say("We did not receive a response. Please stay on the line.");

    Response {
        actions: vec![
            ResponseAction::Say(greeting),
            ResponseAction::Gather(gather),
            ResponseAction::Say(no_input),
        ],
    }
}

/// Served when the voice webhook cannot build the greeting.
pub fn technical_difficulties() -> Response {
    Response {
        actions: vec![
            plain_say("We are experiencing technical difficulties. Goodbye."),
            ResponseAction::Hangup(HangupAction {}),
        ],
    }
}

/// What the caller pressed, as far as the call flow cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadChoice {
    Confirm,
    LeaveMessage,
    Invalid,
}

impl KeypadChoice {
    pub fn from_digits(digits: Option<&str>) -> Self {
        match digits {
            Some("1") => KeypadChoice::Confirm,
            Some("2") => KeypadChoice::LeaveMessage,
            _ => KeypadChoice::Invalid,
        }
    }

    fn actions(self) -> Vec<ResponseAction> {
        match self {
            KeypadChoice::Confirm => vec![ResponseAction::Say(say(
                "Thank you. Your confirmation has been recorded.",
            ))],
            KeypadChoice::LeaveMessage => vec![
                ResponseAction::Say(say("Please leave your message after the beep.")),
                ResponseAction::Record(RecordAction {
                    timeout: Some(RECORD_SILENCE_TIMEOUT_SECS),
                    max_length: Some(RECORD_MAX_LENGTH_SECS),
                    play_beep: Some(TwimlBool::True),
                }),
            ],
            KeypadChoice::Invalid => vec![ResponseAction::Say(say(
                "Invalid input. No further action is required.",
            ))],
        }
    }
}

/// Branch on the keypress, then always close and hang up.  `None` means the gather payload
/// could not be read.
pub fn gather_result(choice: Option<KeypadChoice>) -> Response {
    let mut actions = match choice {
        Some(choice) => choice.actions(),
        None => vec![plain_say("An error occurred. Goodbye.")],
    };
    actions.push(ResponseAction::Say(say("Thank you for your time. Goodbye.")));
    actions.push(ResponseAction::Hangup(HangupAction {}));
    Response { actions }
}
