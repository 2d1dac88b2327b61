use serde::{Deserialize, Serialize};

use crate::session::Turn;

/// Form fields posted to `/chat`; exactly one is expected per turn
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default, alias = "mcq_option")]
    pub selected_option: Option<String>,

    /// `data:<mime>;base64,<payload>` recording
    #[serde(default)]
    pub audio_data: Option<String>,

    #[serde(default, alias = "text_input")]
    pub typed_text: Option<String>,
}

/// What the request is, after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The patient picked one of the offered replies
    Selection(String),
    /// The doctor recorded a question
    Audio(String),
    /// The doctor typed a question (possibly empty)
    Text(String),
}

impl From<ChatForm> for InboundEvent {
    /// Selection wins over audio, audio over text
    fn from(form: ChatForm) -> Self {
        let present = |field: Option<String>| field.filter(|v| !v.trim().is_empty());

        if let Some(choice) = present(form.selected_option) {
            return Self::Selection(choice.trim().to_string());
        }
        if let Some(audio) = present(form.audio_data) {
            return Self::Audio(audio);
        }
        Self::Text(form.typed_text.unwrap_or_default())
    }
}

/// Everything the client needs to draw the chat screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub message: String,

    /// URL of the synthesized reply, when one was produced
    pub audio_artifact: Option<String>,

    /// Choices to show, at most seven
    pub options: Vec<String>,

    pub conversation: Vec<Turn>,

    /// Advisory that does not block the turn (e.g. normalization fallback)
    pub notice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(selected: Option<&str>, audio: Option<&str>, text: Option<&str>) -> ChatForm {
        ChatForm {
            selected_option: selected.map(String::from),
            audio_data: audio.map(String::from),
            typed_text: text.map(String::from),
        }
    }

    #[test]
    fn test_selection_has_priority() {
        let event = InboundEvent::from(form(Some(" Yes "), Some("data:,AAAA"), Some("hi")));
        assert_eq!(event, InboundEvent::Selection("Yes".to_string()));
    }

    #[test]
    fn test_audio_over_text() {
        let event = InboundEvent::from(form(Some(""), Some("data:,AAAA"), Some("hi")));
        assert_eq!(event, InboundEvent::Audio("data:,AAAA".to_string()));
    }

    #[test]
    fn test_text_fallthrough() {
        assert_eq!(
            InboundEvent::from(form(None, Some("  "), Some("Are you in pain?"))),
            InboundEvent::Text("Are you in pain?".to_string())
        );
        assert_eq!(
            InboundEvent::from(ChatForm::default()),
            InboundEvent::Text(String::new())
        );
    }
}
