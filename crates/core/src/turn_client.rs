use std::future::poll_fn;
use std::pin::pin;

use helpdesk_protocol::{
    FeedbackAck, FeedbackRequest, StreamEvent, SupportBackend, TicketResult,
    TurnRequest, TurnStream,
};

/// Reaction points for the non-terminal events of an in-flight turn.
///
/// Each decoded event maps to exactly one call, in the order the
/// events were framed.
pub trait TurnObserver: Send {
    /// The backend assigned (or confirmed) the ticket for this turn.
    fn on_ticket_id(&mut self, id: &str);

    /// A token of the in-flight assistant response arrived.
    fn on_chunk(&mut self, content: &str);
}

/// How a turn ended.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// The backend delivered a final result.
    Completed(TicketResult),
    /// The backend reported a failure, or the stream ended before a
    /// terminal event arrived.
    Failed(String),
}

/// A wrapper around a support backend that pumps one streaming turn
/// at a time and maps the decoded events onto an observer.
///
/// The client owns only the lifetime of the in-flight exchange; it
/// holds no observable state after a turn completes or fails.
pub struct TurnClient<B> {
    backend: B,
}

impl<B: SupportBackend> TurnClient<B> {
    /// Creates a new `TurnClient` over the given backend.
    #[inline]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Opens one streaming turn and pumps its events.
    ///
    /// Non-terminal events are forwarded to `observer` in framing
    /// order. A `final_result` or `error` event finishes the turn;
    /// nothing past it is consumed. An `Err` is returned only when
    /// the exchange itself fails at the transport level.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The turn stops streaming further
    /// events when this operation is cancelled.
    pub async fn open_turn(
        &self,
        req: &TurnRequest,
        observer: &mut dyn TurnObserver,
    ) -> Result<TurnOutcome, B::Error> {
        trace!("opening turn: {req:?}");
        let turn = match self.backend.open_turn(req).await {
            Ok(turn) => turn,
            Err(err) => {
                error!("could not open the exchange: {err:?}");
                return Err(err);
            }
        };

        trace!("start receiving events");
        let mut pinned_turn = pin!(turn);
        loop {
            let event_or_err =
                poll_fn(|cx| pinned_turn.as_mut().poll_next_event(cx)).await;
            let event = match event_or_err {
                Ok(event) => event,
                Err(err) => {
                    error!("got an error: {err:?}");
                    return Err(err);
                }
            };

            let Some(event) = event else {
                // The byte source completed without a terminal
                // event; the turn cannot be considered finished.
                return Ok(TurnOutcome::Failed(
                    "response stream ended unexpectedly".to_owned(),
                ));
            };
            trace!("got an event: {event:?}");

            match event {
                StreamEvent::TicketId { id } => observer.on_ticket_id(&id),
                StreamEvent::Chunk { content } => observer.on_chunk(&content),
                StreamEvent::FinalResult { data } => {
                    trace!("finished a turn");
                    return Ok(TurnOutcome::Completed(data));
                }
                StreamEvent::Error { error } => {
                    return Ok(TurnOutcome::Failed(error));
                }
                StreamEvent::Unknown => {}
            }
        }
    }

    /// Reports a resolution for a ticket.
    #[inline]
    pub async fn submit_feedback(
        &self,
        req: &FeedbackRequest,
    ) -> Result<FeedbackAck, B::Error> {
        self.backend.submit_feedback(req).await
    }
}
