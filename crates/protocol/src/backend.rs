use std::error::Error;

use crate::error::ErrorKind;
use crate::request::{FeedbackRequest, TurnRequest};
use crate::stream::TurnStream;
use crate::ticket::FeedbackAck;

/// The error type for a support backend.
pub trait BackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a support backend, which is an entry for
/// opening streaming turns and reporting resolutions.
///
/// Once the backend is created, it should behave like a stateless
/// object. It can still have internal state, but callers should not
/// rely on it, and the backend should be prepared for being dropped
/// anytime.
pub trait SupportBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// The streaming turn type for this backend.
    type Turn: TurnStream<Error = Self::Error>;

    /// Opens one streaming turn.
    fn open_turn(
        &self,
        req: &TurnRequest,
    ) -> impl Future<Output = Result<Self::Turn, Self::Error>> + Send + 'static;

    /// Reports a resolution for a ticket.
    ///
    /// This is a best-effort side action; callers are expected to
    /// tolerate failures.
    fn submit_feedback(
        &self,
        req: &FeedbackRequest,
    ) -> impl Future<Output = Result<FeedbackAck, Self::Error>> + Send + 'static;
}
