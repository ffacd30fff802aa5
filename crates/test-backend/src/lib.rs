//! A local fake support backend for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use helpdesk_protocol::{
    BackendError, ErrorKind, FeedbackAck, FeedbackRequest, StreamEvent,
    SupportBackend, TurnRequest, TurnStream,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct TestTurn {
    events: VecDeque<StreamEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TurnStream for TestTurn {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<StreamEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            let Some(event) = this.events.pop_front() else {
                return Poll::Ready(Ok(None));
            };
            if event.is_terminal() {
                // Per the `TurnStream` contract, nothing past the
                // terminal event may be yielded.
                this.events.clear();
            }
            return Poll::Ready(Ok(Some(event)));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake support backend for testing purpose.
///
/// Before opening turns, you need to setup the turn script, which is
/// how the backend should respond to each exchange. Scripted turns
/// are consumed in order; opening a turn with an exhausted script
/// returns an error.
///
/// The backend records every turn request and feedback submission it
/// receives, so tests can assert on what was (or was not) sent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy
/// memory copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestBackend {
    script: Arc<Mutex<VecDeque<PresetTurn>>>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
    feedback: Arc<Mutex<Vec<FeedbackRequest>>>,
    fail_feedback: bool,
    delay: Option<Duration>,
}

impl TestBackend {
    /// Appends a scripted turn.
    #[inline]
    pub fn add_turn(&mut self, preset: PresetTurn) {
        self.script.lock().unwrap().push_back(preset);
    }

    /// Sets the delay between streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Makes every feedback submission fail.
    #[inline]
    pub fn fail_feedback(&mut self) {
        self.fail_feedback = true;
    }

    /// Returns the turn requests received so far.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the feedback submissions received so far.
    pub fn feedback_log(&self) -> Vec<FeedbackRequest> {
        self.feedback.lock().unwrap().clone()
    }
}

impl SupportBackend for TestBackend {
    type Error = crate::Error;
    type Turn = TestTurn;

    fn open_turn(
        &self,
        req: &TurnRequest,
    ) -> impl Future<Output = Result<Self::Turn, Self::Error>> + Send + 'static
    {
        self.requests.lock().unwrap().push(req.clone());

        let preset = self.script.lock().unwrap().pop_front();
        let result = match preset {
            None => Err(Error {
                message: "turn script exhausted",
                kind: ErrorKind::Other,
            }),
            Some(PresetTurn::ConnectionFailure) => Err(Error {
                message: "connection refused",
                kind: ErrorKind::Transport,
            }),
            Some(PresetTurn::Events(events)) => Ok(TestTurn {
                events: events.into(),
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }

    fn submit_feedback(
        &self,
        req: &FeedbackRequest,
    ) -> impl Future<Output = Result<FeedbackAck, Self::Error>> + Send + 'static
    {
        self.feedback.lock().unwrap().push(req.clone());

        let result = if self.fail_feedback {
            Err(Error {
                message: "feedback endpoint unavailable",
                kind: ErrorKind::Transport,
            })
        } else {
            Ok(FeedbackAck {
                status: "recorded".to_owned(),
                ticket_id: req.ticket_id.clone(),
                message: "Feedback recorded".to_owned(),
            })
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use helpdesk_protocol::TicketResult;

    use super::*;

    async fn collect_turn(turn: TestTurn) -> (String, Option<TicketResult>) {
        let mut turn = pin!(turn);
        let mut content = String::new();
        let mut result = None;
        loop {
            let Some(event) = poll_fn(|cx| turn.as_mut().poll_next_event(cx))
                .await
                .unwrap()
            else {
                break;
            };
            match event {
                StreamEvent::Chunk { content: token } => {
                    content.push_str(&token);
                }
                StreamEvent::FinalResult { data } => {
                    result = Some(data);
                }
                _ => {}
            }
        }
        (content, result)
    }

    #[tokio::test]
    async fn test_scripted_turns() {
        let mut backend = TestBackend::default();
        backend.add_turn(PresetTurn::with_events([
            StreamEvent::Chunk {
                content: "We".to_owned(),
            },
            StreamEvent::Chunk {
                content: " can help.".to_owned(),
            },
            StreamEvent::FinalResult {
                data: TicketResult {
                    status: "resolved".to_owned(),
                    ..Default::default()
                },
            },
            // Never delivered.
            StreamEvent::Chunk {
                content: "late".to_owned(),
            },
        ]));

        let turn = backend
            .open_turn(&TurnRequest::new("My billing is wrong"))
            .await
            .unwrap();
        let (content, result) = collect_turn(turn).await;
        assert_eq!(content, "We can help.");
        assert_eq!(result.unwrap().status, "resolved");

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "My billing is wrong");

        // The script is exhausted now.
        let err = backend
            .open_turn(&TurnRequest::new("again"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let mut backend = TestBackend::default();
        backend.add_turn(PresetTurn::ConnectionFailure);
        let err = backend
            .open_turn(&TurnRequest::new("hello there"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_feedback_recording() {
        let mut backend = TestBackend::default();
        let req = FeedbackRequest {
            ticket_id: "abc123de".to_owned(),
            ticket_text: "Resolved by user confirmation".to_owned(),
            final_response: "User confirmed resolution".to_owned(),
            feedback: "positive".to_owned(),
        };
        let ack = backend.submit_feedback(&req).await.unwrap();
        assert_eq!(ack.ticket_id, "abc123de");
        assert_eq!(backend.feedback_log(), vec![req.clone()]);

        backend.fail_feedback();
        let err = backend.submit_feedback(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        // Still recorded.
        assert_eq!(backend.feedback_log().len(), 2);
    }
}
