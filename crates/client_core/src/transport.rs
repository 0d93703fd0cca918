use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Action, ActionId},
    protocol::ActionPayload,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ClientSettings;

/// The part of a non-2xx (or undecodable) response kept for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedResponse {
    pub status: u16,
    pub payload: Option<Value>,
}

/// Raw failure of a single request, before classification.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{detail}")]
pub struct TransportFailure {
    pub request_sent: bool,
    pub response: Option<FailedResponse>,
    pub detail: String,
}

impl TransportFailure {
    pub fn setup(detail: impl Into<String>) -> Self {
        Self {
            request_sent: false,
            response: None,
            detail: detail.into(),
        }
    }

    pub fn no_response(detail: impl Into<String>) -> Self {
        Self {
            request_sent: true,
            response: None,
            detail: detail.into(),
        }
    }

    pub fn response(status: u16, payload: Option<Value>, detail: impl Into<String>) -> Self {
        Self {
            request_sent: true,
            response: Some(FailedResponse { status, payload }),
            detail: detail.into(),
        }
    }
}

#[async_trait]
pub trait ActionTransport: Send + Sync {
    async fn list(&self) -> Result<Vec<Action>, TransportFailure>;
    async fn create(&self, payload: &ActionPayload) -> Result<Action, TransportFailure>;
    async fn update(
        &self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Action, TransportFailure>;
    async fn delete(&self, action_id: ActionId) -> Result<(), TransportFailure>;
}

#[async_trait]
impl<T> ActionTransport for Arc<T>
where
    T: ActionTransport + ?Sized,
{
    async fn list(&self) -> Result<Vec<Action>, TransportFailure> {
        (**self).list().await
    }

    async fn create(&self, payload: &ActionPayload) -> Result<Action, TransportFailure> {
        (**self).create(payload).await
    }

    async fn update(
        &self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Action, TransportFailure> {
        (**self).update(action_id, payload).await
    }

    async fn delete(&self, action_id: ActionId) -> Result<(), TransportFailure> {
        (**self).delete(action_id).await
    }
}

/// JSON-over-HTTP transport for the actions collection.
pub struct HttpTransport {
    http: Client,
    settings: ClientSettings,
}

impl HttpTransport {
    pub fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self { http, settings })
    }

    async fn execute(
        &self,
        method: Method,
        url: Result<Url, url::ParseError>,
        body: Option<&ActionPayload>,
    ) -> Result<(StatusCode, Vec<u8>), TransportFailure> {
        let url =
            url.map_err(|err| TransportFailure::setup(format!("invalid request url: {err}")))?;
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");
        if let Some(payload) = body {
            let encoded = serde_json::to_vec(payload).map_err(|err| {
                TransportFailure::setup(format!("failed to encode request body: {err}"))
            })?;
            request = request.header(CONTENT_TYPE, "application/json").body(encoded);
        }

        debug!(%method, %url, "sending request");
        let response = request.send().await.map_err(|err| {
            if err.is_builder() {
                TransportFailure::setup(format!("failed to build {method} {url}: {err}"))
            } else {
                TransportFailure::no_response(format!("{method} {url} failed: {err}"))
            }
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| {
            TransportFailure::no_response(format!("failed to read response of {method} {url}: {err}"))
        })?;
        debug!(%method, %url, status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(TransportFailure::response(
                status.as_u16(),
                raw_payload(&bytes),
                format!("{method} {url} returned {status}"),
            ));
        }
        Ok((status, bytes.to_vec()))
    }
}

#[async_trait]
impl ActionTransport for HttpTransport {
    async fn list(&self) -> Result<Vec<Action>, TransportFailure> {
        let (status, body) = self
            .execute(Method::GET, self.settings.collection_url(), None)
            .await?;
        decode(status, &body)
    }

    async fn create(&self, payload: &ActionPayload) -> Result<Action, TransportFailure> {
        let (status, body) = self
            .execute(Method::POST, self.settings.collection_url(), Some(payload))
            .await?;
        decode(status, &body)
    }

    async fn update(
        &self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Action, TransportFailure> {
        let (status, body) = self
            .execute(Method::PUT, self.settings.item_url(action_id), Some(payload))
            .await?;
        decode(status, &body)
    }

    async fn delete(&self, action_id: ActionId) -> Result<(), TransportFailure> {
        self.execute(Method::DELETE, self.settings.item_url(action_id), None)
            .await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, TransportFailure> {
    serde_json::from_slice(body).map_err(|err| {
        TransportFailure::response(
            status.as_u16(),
            raw_payload(body),
            format!("invalid response body: {err}"),
        )
    })
}

/// JSON when the body parses, the text otherwise, nothing when empty.
fn raw_payload(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(body)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(body).into_owned())))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
