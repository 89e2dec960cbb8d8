//! HTTP/JSON client for the calendar server.
//!
//! [`HttpEventSource`] implements [`RemoteEventSource`] and reports every problem as a raw
//! [`TransportFailure`]. Status handling lives in [`classify`]:
//!
//! | status | result |
//! |---|---|
//! | 200 (and other 2xx) | body, or `MissingBody` when it is empty or `null` |
//! | 204 | success without a body |
//! | 401 | `AccessTokenExpired` |
//! | anything else | `Status { code, message }` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use calsync_core::failure::{
    STATUS_CODE_DELETE_SUCCESS, STATUS_CODE_OK, TransportFailure, TransportResult,
};
use calsync_core::remote::RemoteEventSource;
use calsync_core::remote::protocol::{
    CreateEventRequest, EventResponse, EventSummaryResponse, decode_events,
};
use calsync_core::window::SyncWindow;
use calsync_core::{Event, EventSummary};

const STATUS_CODE_UNAUTHORIZED: u16 = 401;

/// Longest server message kept in a `Status` failure.
const MAX_MESSAGE_LEN: usize = 200;

pub struct HttpEventSource {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl HttpEventSource {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> TransportResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        Ok(HttpEventSource {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and classify. `Ok(None)` means the server answered without a body.
    async fn send(&self, builder: RequestBuilder) -> TransportResult<Option<String>> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        debug!(status, bytes = body.len(), "server responded");
        classify(status, body)
    }

    /// Send and decode a body that must be present.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> TransportResult<T> {
        let body = self
            .send(builder)
            .await?
            .ok_or(TransportFailure::MissingBody)?;
        serde_json::from_str(&body).map_err(|e| TransportFailure::Decode(e.to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> TransportFailure {
        if error.is_timeout() {
            TransportFailure::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if error.is_decode() {
            TransportFailure::Decode(error.to_string())
        } else {
            TransportFailure::Network(error.to_string())
        }
    }
}

#[async_trait]
impl RemoteEventSource for HttpEventSource {
    async fn fetch(&self, window: &SyncWindow) -> TransportResult<Vec<Event>> {
        let builder = self.request(Method::GET, "/calendar/events").query(&[
            ("startDate", window.server_start_date()),
            ("endDate", window.server_end_date()),
        ]);

        let responses: Vec<EventResponse> = self.send_json(builder).await?;
        decode_events(responses)
    }

    async fn create(&self, request: &CreateEventRequest) -> TransportResult<()> {
        let builder = self.request(Method::POST, "/calendar/events").json(request);
        // Creation needs no payload back.
        match self.send(builder).await {
            Ok(_) | Err(TransportFailure::MissingBody) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn search(
        &self,
        keyword: Option<&str>,
        window: &SyncWindow,
    ) -> TransportResult<Vec<EventSummary>> {
        let mut query = vec![
            ("startDate", window.server_start_date()),
            ("endDate", window.server_end_date()),
        ];
        if let Some(keyword) = keyword {
            query.push(("keyword", keyword.to_string()));
        }

        let builder = self
            .request(Method::GET, "/calendar/events/search")
            .query(&query);

        let responses: Vec<EventSummaryResponse> = self.send_json(builder).await?;
        Ok(responses.into_iter().map(EventSummary::from).collect())
    }
}

/// Map a status and raw body to the transport contract.
pub fn classify(status: u16, body: String) -> TransportResult<Option<String>> {
    match status {
        STATUS_CODE_DELETE_SUCCESS => Ok(None),
        STATUS_CODE_OK | 201..=299 => {
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed == "null" {
                Err(TransportFailure::MissingBody)
            } else {
                Ok(Some(body))
            }
        }
        STATUS_CODE_UNAUTHORIZED => Err(TransportFailure::AccessTokenExpired),
        code => Err(TransportFailure::Status {
            code,
            message: error_message(&body),
        }),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return Some(parsed.message);
    }

    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.chars().take(MAX_MESSAGE_LEN).collect())
    }
}
