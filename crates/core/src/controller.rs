
use std::time::Duration;

use helpdesk_protocol::{
    FeedbackRequest, SupportBackend, TicketResult, TurnRequest,
};
use tokio::time::timeout;

use crate::conversation::{
    Metadata, PendingAction, Role, Session, Transcript,
};
use crate::turn_client::{TurnClient, TurnObserver, TurnOutcome};

/// Greetings that never warrant a ticket on their own.
const GREETINGS: &[&str] = &["hi", "hello", "hey", "greetings"];

/// Minimum raw length for the opening message of a new ticket.
const MIN_TICKET_LEN: usize = 5;

const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

const WELCOME: &str = "Hi! Please describe the problem you're facing, \
    and I'll create a support ticket.";
const GUIDANCE: &str = "Please describe the problem you're facing in \
    detail so I can create a support ticket for you.";
const RESOLVED_NOTICE: &str = "Ticket Resolved. If you have another \
    issue, please describe it below.";
const INTERRUPTED_NOTICE: &str =
    "\n\n[Connection Error: Response interrupted]";

type UpdateFn = dyn FnMut(&Transcript) + Send;

/// The stage of the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// No turn in flight, no pending confirmation.
    #[default]
    Idle,
    /// One turn in flight.
    Streaming,
    /// A resolution confirmation is pending.
    AwaitingConfirmation,
}

/// [`Controller`] builder.
pub struct ControllerBuilder<B> {
    backend: B,
    on_update: Option<Box<UpdateFn>>,
    turn_timeout: Duration,
}

impl<B: SupportBackend> ControllerBuilder<B> {
    /// Creates a new builder with the specified backend.
    #[inline]
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            on_update: None,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
        }
    }

    /// Attaches a callback to be invoked whenever the transcript
    /// changes observably.
    ///
    /// During streaming, the callback fires once per received token,
    /// synchronously, before the next event is consumed.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl FnMut(&Transcript) + Send + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(on_update));
        self
    }

    /// Sets how long one turn may take before it is abandoned with a
    /// failure. Defaults to two minutes.
    #[inline]
    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    /// Builds the controller.
    pub fn build(self) -> Controller<B> {
        let mut transcript = Transcript::default();
        transcript.push(Role::Assistant, WELCOME);
        Controller {
            client: TurnClient::new(self.backend),
            transcript,
            session: Session::default(),
            stage: Stage::Idle,
            turn_timeout: self.turn_timeout,
            on_update: self.on_update,
        }
    }
}

/// The orchestrating state machine of one support session.
///
/// The controller exclusively owns the transcript and the session;
/// everything else renders from its state snapshots. One turn runs
/// at a time: [`Controller::submit`] holds the exclusive borrow for
/// the whole exchange, so a second submission while streaming is
/// impossible by construction.
pub struct Controller<B> {
    client: TurnClient<B>,
    transcript: Transcript,
    session: Session,
    stage: Stage,
    turn_timeout: Duration,
    on_update: Option<Box<UpdateFn>>,
}

impl<B: SupportBackend> Controller<B> {
    /// Returns the current transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the current conversation stage.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the ticket the session is currently following up on.
    #[inline]
    pub fn active_ticket_id(&self) -> Option<&str> {
        self.session.active_ticket_id()
    }

    /// Detaches the session from its current ticket, so that the
    /// next submission opens a new one.
    pub fn start_new_ticket(&mut self) {
        self.session.active_ticket_id = None;
    }

    /// Submits one user message and runs the turn to completion.
    pub async fn submit(&mut self, text: &str) {
        // A pending confirmation is superseded by a new submission.
        self.transcript.clear_pending();
        self.transcript.push(Role::User, text);
        self.publish();

        // Content gate, for the first turn of a new ticket only.
        if self.session.active_ticket_id.is_none() && !is_ticket_worthy(text)
        {
            debug!("input rejected by the content gate");
            self.transcript.push(Role::Assistant, GUIDANCE);
            self.stage = Stage::Idle;
            self.publish();
            return;
        }

        self.stage = Stage::Streaming;
        let key = self.transcript.begin_streaming();
        self.publish();

        let req = match self.session.active_ticket_id() {
            Some(id) => TurnRequest::follow_up(text, id),
            None => TurnRequest::new(text),
        };

        let outcome = {
            let mut sink = StreamSink {
                transcript: &mut self.transcript,
                session: &mut self.session,
                key,
                on_update: self.on_update.as_deref_mut(),
            };
            let turn_fut = self.client.open_turn(&req, &mut sink);
            match timeout(self.turn_timeout, turn_fut).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("turn abandoned after {:?}", self.turn_timeout);
                    Ok(TurnOutcome::Failed("response timed out".to_owned()))
                }
            }
        };

        match outcome {
            Ok(TurnOutcome::Completed(result)) => {
                self.finish_turn(key, result);
            }
            Ok(TurnOutcome::Failed(message)) => {
                warn!("turn failed: {message}");
                self.fail_turn(key);
            }
            Err(err) => {
                warn!("turn failed at the transport level: {err}");
                self.fail_turn(key);
            }
        }
        self.publish();
    }

    /// Confirms the pending resolution.
    ///
    /// The resolution report is best-effort: its failure is logged
    /// and never blocks the transition. No-op without a pending
    /// confirmation.
    pub async fn resolve_pending(&mut self) {
        let Some(action) = self.transcript.take_pending() else {
            return;
        };
        let req = FeedbackRequest {
            ticket_id: action.ticket_id.unwrap_or_default(),
            ticket_text: "Resolved by user confirmation".to_owned(),
            final_response: "User confirmed resolution".to_owned(),
            feedback: "positive".to_owned(),
        };
        if let Err(err) = self.client.submit_feedback(&req).await {
            warn!("failed to report the resolution: {err}");
        }
        self.transcript.push(Role::System, RESOLVED_NOTICE);
        self.session.active_ticket_id = None;
        self.stage = Stage::Idle;
        self.publish();
    }

    /// Declines the pending resolution; the conversation continues
    /// as a follow-up on the same ticket.
    pub fn continue_pending(&mut self) {
        if self.transcript.take_pending().is_none() {
            return;
        }
        self.stage = Stage::Idle;
        self.publish();
    }

    /// Finalizes the in-flight message and applies the post-turn
    /// policy.
    fn finish_turn(&mut self, key: u64, result: TicketResult) {
        let ticket_id = result
            .ticket_id
            .clone()
            .or_else(|| self.session.active_ticket_id.clone());
        let content = result.proposed_solution.clone().or_else(|| {
            result
                .final_response
                .as_ref()
                .and_then(|resp| resp.message.clone())
        });
        let metadata = Metadata {
            intent: result.intent.clone(),
            confidence: result.confidence,
            ticket_id: ticket_id.clone(),
            needs_human: result.needs_human,
            status: Some(result.status.clone()),
        };
        self.transcript.finalize(key, content, Some(metadata));

        // Off-topic turns should not interrupt the flow.
        if result.status == "dismissed" {
            self.stage = Stage::Idle;
            return;
        }

        let escalated =
            result.needs_human || result.status == "waiting_human";
        if escalated {
            let short_id =
                ticket_id.as_deref().map_or("pending", short_ticket_id);
            self.transcript.push(
                Role::System,
                format!(
                    "This ticket has been escalated for human review. \
                     Ticket ID: #{short_id}. A human agent will review \
                     this, but I can still help meanwhile."
                ),
            );
        }

        self.transcript.set_pending(PendingAction { ticket_id });
        self.stage = Stage::AwaitingConfirmation;
    }

    fn fail_turn(&mut self, key: u64) {
        self.transcript.append_content(key, INTERRUPTED_NOTICE);
        self.transcript.finalize(key, None, None);
        self.stage = Stage::Idle;
    }

    fn publish(&mut self) {
        if let Some(on_update) = &mut self.on_update {
            on_update(&self.transcript);
        }
    }
}

/// Routes in-flight turn events into the controller state.
struct StreamSink<'a> {
    transcript: &'a mut Transcript,
    session: &'a mut Session,
    key: u64,
    on_update: Option<&'a mut UpdateFn>,
}

impl TurnObserver for StreamSink<'_> {
    fn on_ticket_id(&mut self, id: &str) {
        // The backend is authoritative; adopt its id even when one
        // is already set.
        self.session.active_ticket_id = Some(id.to_owned());
    }

    fn on_chunk(&mut self, content: &str) {
        self.transcript.append_content(self.key, content);
        // Each token must be observable before the next event is
        // consumed, so the snapshot is published synchronously here
        // instead of once per turn.
        if let Some(on_update) = &mut self.on_update {
            on_update(self.transcript);
        }
    }
}

// First 8 characters, not bytes; ids are unconstrained wire strings.
fn short_ticket_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn is_ticket_worthy(text: &str) -> bool {
    let folded = text.trim().to_lowercase();
    let bare = folded.trim_end_matches(['!', '.']);
    !GREETINGS.contains(&bare) && text.len() >= MIN_TICKET_LEN
}
