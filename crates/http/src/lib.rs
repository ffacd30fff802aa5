//! The HTTP implementation of the support backend protocol.
//!
//! Besides the streaming turn exchange, this crate also exposes the
//! non-streaming collaborator surfaces of the backend: ticket
//! creation and listing, feedback submission and the health probe.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod turn;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use helpdesk_protocol::{
    BackendError, ErrorKind, FeedbackAck, FeedbackRequest, Health,
    SupportBackend, TicketSummary, TurnRequest,
};
use mime::Mime;
use reqwest::{Client, Response, header};
use serde_json::json;

pub use config::{HttpConfig, HttpConfigBuilder};
use io::{Chunks, Sse};
pub use turn::HttpTurn;

/// Error type for [`HttpBackend`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// HTTP support backend client.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: Arc<HttpConfig>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` with the given configuration.
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn create_request(&self, text: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url("/tickets/"))
            .json(&json!({ "text": text }))
    }

    fn list_request(&self, status: Option<&str>) -> reqwest::RequestBuilder {
        let mut req = self.client.get(self.url("/tickets/"));
        if let Some(status) = status {
            req = req.query(&[("status", status)]);
        }
        req
    }

    /// Creates and processes a ticket without streaming.
    pub async fn create_ticket(
        &self,
        text: &str,
    ) -> Result<TicketSummary, Error> {
        let resp = self
            .create_request(text)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;
        resp.json()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Protocol))
    }

    /// Lists tickets, newest first, optionally filtered by status.
    pub async fn list_tickets(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<TicketSummary>, Error> {
        let resp = self
            .list_request(status)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;
        resp.json()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Protocol))
    }

    /// Retrieves a single ticket by id.
    pub async fn get_ticket(
        &self,
        ticket_id: &str,
    ) -> Result<TicketSummary, Error> {
        let resp = self
            .client
            .get(self.url(&format!("/tickets/{ticket_id}")))
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Transport))?;
        resp.json()
            .await
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Protocol))
    }

    /// Probes the backend health.
    ///
    /// Transport failures map to the `offline` sentinel instead of
    /// an error.
    pub async fn check_health(&self) -> Health {
        let resp = match self.client.get(self.url("/health")).send().await {
            Ok(resp) => resp,
            Err(err) => {
                debug!("health probe failed: {err}");
                return Health::offline();
            }
        };
        match resp.json().await {
            Ok(health) => health,
            Err(err) => {
                debug!("health probe returned garbage: {err}");
                Health::offline()
            }
        }
    }
}

impl SupportBackend for HttpBackend {
    type Error = Error;
    type Turn = HttpTurn;

    fn open_turn(
        &self,
        req: &TurnRequest,
    ) -> impl Future<Output = Result<Self::Turn, Self::Error>> + Send + 'static
    {
        let resp_fut = self
            .client
            .post(self.url("/tickets/stream"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(req)
            .send();

        async move {
            let resp = match resp_fut.await.and_then(Response::error_for_status)
            {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("{err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.type_() == mime::TEXT && m.subtype() == "event-stream"
                })
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Protocol,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(HttpTurn::from_sse(sse))
        }
    }

    fn submit_feedback(
        &self,
        req: &FeedbackRequest,
    ) -> impl Future<Output = Result<FeedbackAck, Self::Error>> + Send + 'static
    {
        let resp_fut = self
            .client
            .post(self.url("/feedback/"))
            .json(req)
            .send();

        async move {
            let resp = resp_fut
                .await
                .and_then(Response::error_for_status)
                .map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::Transport)
                })?;
            resp.json().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Protocol)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HttpBackend {
        HttpBackend::new(
            HttpConfigBuilder::new()
                .with_base_url("http://support.example:8000/")
                .build(),
        )
    }

    #[test]
    fn test_listing_request() {
        let backend = backend();

        let req = backend.list_request(None).build().unwrap();
        assert_eq!(req.method().as_str(), "GET");
        assert_eq!(
            req.url().as_str(),
            "http://support.example:8000/tickets/"
        );

        let req = backend
            .list_request(Some("waiting_human"))
            .build()
            .unwrap();
        assert_eq!(
            req.url().as_str(),
            "http://support.example:8000/tickets/?status=waiting_human"
        );
    }

    #[test]
    fn test_create_request() {
        let req = backend()
            .create_request("My billing is wrong")
            .build()
            .unwrap();
        assert_eq!(req.method().as_str(), "POST");
        assert_eq!(
            req.url().as_str(),
            "http://support.example:8000/tickets/"
        );

        let body = req.body().unwrap().as_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["text"], "My billing is wrong");
    }

    #[test]
    fn test_single_ticket_url() {
        assert_eq!(
            backend().url("/tickets/abc123de"),
            "http://support.example:8000/tickets/abc123de"
        );
    }

    #[tokio::test]
    async fn test_health_offline_sentinel() {
        // Nothing listens on the discard port; the probe must fold
        // the connection failure into the sentinel.
        let backend = HttpBackend::new(
            HttpConfigBuilder::new()
                .with_base_url("http://127.0.0.1:9")
                .build(),
        );
        assert_eq!(backend.check_health().await, Health::offline());
    }
}
