use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::ticket::TicketResult;

/// One decoded event from a streaming turn.
///
/// Any number of `Chunk`/`TicketId` events may arrive in one turn,
/// in arrival order. Exactly one `FinalResult` or `Error` terminates
/// the turn. Tags this crate doesn't know about deserialize to
/// [`StreamEvent::Unknown`] so that newer backends don't break older
/// clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A token of the in-flight assistant response.
    Chunk {
        /// The token text.
        content: String,
    },
    /// The backend assigned (or confirmed) the ticket this turn
    /// belongs to.
    TicketId {
        /// The ticket identifier.
        id: String,
    },
    /// The turn finished; carries the full processing result.
    FinalResult {
        /// The processing result.
        data: TicketResult,
    },
    /// The backend reported a failure mid-stream. Terminal.
    Error {
        /// A human-readable description of the failure.
        error: String,
    },
    /// An event tag this client doesn't recognize.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Returns whether this event terminates the turn.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::FinalResult { .. } | StreamEvent::Error { .. })
    }
}

/// A streaming turn opened against the backend.
pub trait TurnStream: Sized + Send + 'static {
    /// The error type that may be returned by the transport.
    type Error: BackendError;

    /// Attempts to pull out the next event from the turn.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct turn state:
    ///
    /// - `Poll::Pending` means that the turn is still waiting for
    ///   the next event. Implementations will ensure that the
    ///   current task will be notified when the next event may be
    ///   ready.
    /// - `Poll::Ready(Ok(Some(event)))` means the turn has an event
    ///   to deliver, and may produce further events on subsequent
    ///   `poll_next_event` calls.
    /// - `Poll::Ready(Ok(None))` means the byte source has signaled
    ///   completion.
    /// - `Poll::Ready(Err(error))` means the transport failed while
    ///   reading the turn.
    ///
    /// Calling this method after completion should always return
    /// `None`. Implementations must not yield further events after a
    /// terminal event has been delivered.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<StreamEvent>, Self::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type": "chunk", "content": "We"}"#)
                .unwrap();
        assert_eq!(
            event,
            StreamEvent::Chunk {
                content: "We".to_owned()
            }
        );

        let event: StreamEvent =
            serde_json::from_str(r#"{"type": "ticket_id", "id": "abc123de"}"#)
                .unwrap();
        assert_eq!(
            event,
            StreamEvent::TicketId {
                id: "abc123de".to_owned()
            }
        );

        let event: StreamEvent = serde_json::from_str(
            r#"{"type": "error", "error": "LLM unavailable"}"#,
        )
        .unwrap();
        assert!(event.is_terminal());
    }

    #[test]
    fn test_unknown_tag_is_tolerated() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type": "heartbeat", "ts": 1730000000}"#,
        )
        .unwrap();
        assert_eq!(event, StreamEvent::Unknown);
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_final_result_payload() {
        let event: StreamEvent = serde_json::from_str(
            r#"{
                "type": "final_result",
                "data": {
                    "status": "resolved",
                    "intent": "billing",
                    "confidence": 0.92,
                    "proposed_solution": "We can help.",
                    "needs_human": false
                }
            }"#,
        )
        .unwrap();
        let StreamEvent::FinalResult { data } = event else {
            panic!("expected a final result");
        };
        assert_eq!(data.status, "resolved");
        assert_eq!(data.proposed_solution.as_deref(), Some("We can help."));
        assert!(!data.needs_human);
    }
}
