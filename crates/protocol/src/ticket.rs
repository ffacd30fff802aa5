use serde::{Deserialize, Serialize};

/// The detailed result of processing one ticket turn.
///
/// This is both the payload of a `final_result` stream event and the
/// per-ticket result in listings, so every field except `status` is
/// optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketResult {
    /// One of `processing`, `resolved`, `waiting_human`, `failed` or
    /// `dismissed`.
    #[serde(default)]
    pub status: String,
    /// The ticket text this result was computed for.
    #[serde(default)]
    pub ticket_text: Option<String>,
    /// The classified intent.
    #[serde(default)]
    pub intent: Option<String>,
    /// The classification confidence, in `0.0..=1.0`.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// The solution the backend proposes to the user.
    #[serde(default)]
    pub proposed_solution: Option<String>,
    /// The final response object, when the backend produced one.
    #[serde(default)]
    pub final_response: Option<FinalResponse>,
    /// The failure description, when processing failed.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Whether the backend wants a human to review this ticket.
    #[serde(default)]
    pub needs_human: bool,
    /// The ticket this result belongs to.
    #[serde(default)]
    pub ticket_id: Option<String>,
}

/// The final response object attached to a [`TicketResult`].
///
/// The backend attaches more fields (escalation payloads carry the
/// reason, for example); only the message is consumed here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    /// The user-facing message.
    #[serde(default)]
    pub message: Option<String>,
}

/// One ticket in a listing, or the response to creating a ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    /// The ticket identifier.
    pub ticket_id: String,
    /// The ticket status.
    pub status: String,
    /// The latest processing result for this ticket.
    pub result: TicketResult,
}

/// Acknowledgement for a feedback submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAck {
    /// The submission status.
    pub status: String,
    /// The ticket the feedback was recorded for.
    pub ticket_id: String,
    /// A human-readable confirmation.
    pub message: String,
}

/// The backend health report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// `ok` when the backend is reachable.
    pub status: String,
    /// The service name, when the backend reports one.
    #[serde(default)]
    pub service: Option<String>,
}

impl Health {
    /// The sentinel reported when the backend cannot be reached.
    #[inline]
    pub fn offline() -> Self {
        Self {
            status: "offline".to_owned(),
            service: None,
        }
    }
}
