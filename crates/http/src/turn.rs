use std::pin::Pin;
use std::task::{Context, Poll, ready};

use helpdesk_protocol::{ErrorKind, StreamEvent, TurnStream};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;

struct PartialState {
    sse: Sse,
    // Set once a `final_result`/`error` event has been delivered;
    // anything the backend sends after that is not consumed.
    terminated: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<StreamEvent>, PartialState), Error>;

pin_project! {
    /// A streaming turn read from an HTTP event-stream response.
    pub struct HttpTurn {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl HttpTurn {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            terminated: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl TurnStream for HttpTurn {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<StreamEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            // The turn has been exhausted.
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new
        // future for the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<StreamEvent>, PartialState), Error> {
    if partial_state.terminated {
        return Ok((None, partial_state));
    }

    loop {
        let payload = match partial_state.sse.next_frame().await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok((None, partial_state)),
            Err(err) => {
                return Err(Error::new(err.0.message(), ErrorKind::Transport));
            }
        };
        trace!("got frame: {payload}");

        let event = match serde_json::from_str::<StreamEvent>(&payload) {
            Ok(event) => event,
            Err(err) => {
                // A single undecodable frame must not abort the
                // whole stream.
                warn!("dropping malformed frame: {err}");
                continue;
            }
        };
        if event == StreamEvent::Unknown {
            debug!("ignoring unknown event type");
            continue;
        }

        if event.is_terminal() {
            partial_state.terminated = true;
        }
        return Ok((Some(event), partial_state));
    }
}
