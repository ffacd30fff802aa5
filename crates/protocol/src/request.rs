use serde::Serialize;

/// A request to open one streaming turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TurnRequest {
    /// The user's message for this turn.
    pub text: String,
    /// The existing ticket to follow up on. `None` opens a new
    /// ticket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

impl TurnRequest {
    /// Creates a request for a new ticket.
    #[inline]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ticket_id: None,
        }
    }

    /// Creates a follow-up request on an existing ticket.
    #[inline]
    pub fn follow_up<S: Into<String>, T: Into<String>>(
        text: S,
        ticket_id: T,
    ) -> Self {
        Self {
            text: text.into(),
            ticket_id: Some(ticket_id.into()),
        }
    }
}

/// A resolution/feedback report for a ticket.
///
/// Failures submitting this are non-fatal to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FeedbackRequest {
    /// The ticket being resolved.
    pub ticket_id: String,
    /// The ticket text the feedback refers to.
    pub ticket_text: String,
    /// The response the user is giving feedback on.
    pub final_response: String,
    /// The feedback sentiment.
    pub feedback: String,
}
