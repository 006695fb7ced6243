//! Query intent detection.
//!
//! Cheap substring checks on the lowercased query. No network, no model.

/// Substrings that mark a request to write or answer a message.
const MESSAGE_MARKERS: &[&str] = &["reply", "message", "respond"];

/// Coarse intent of a query. Both flags may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryIntent {
    pub is_question: bool,
    pub is_message_request: bool,
}

impl QueryIntent {
    /// The intent tag, if any. Questions take priority over message requests.
    pub fn tag(&self) -> Option<&'static str> {
        if self.is_question {
            Some("decision-support")
        } else if self.is_message_request {
            Some("auto-reply")
        } else {
            None
        }
    }
}

pub fn classify_intent(query: &str) -> QueryIntent {
    let lower = query.to_lowercase();
    QueryIntent {
        is_question: lower.contains('?'),
        is_message_request: MESSAGE_MARKERS.iter().any(|m| lower.contains(m)),
    }
}
