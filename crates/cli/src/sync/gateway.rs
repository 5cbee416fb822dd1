// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote apply gateway: the system of record's write entry points.
//!
//! Provides a trait-based boundary that enables:
//! - A REST implementation speaking PostgREST conventions for production
//! - Mock gateways for unit testing

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use outbox_core::{EntityKind, RecordId};
use serde_json::{Map, Value};

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The call did not finish within the configured timeout.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The remote could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success status.
    #[error("remote rejected request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// This process has no remote to talk to.
    #[error("no remote configured: {0}")]
    NotConfigured(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future returned by [`Gateway`] methods.
pub type GatewayFuture<'a> = Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + 'a>>;

/// Write access to the remote system of record.
///
/// Implementations do not retry; retry bookkeeping belongs to the caller.
pub trait Gateway: Send + Sync {
    /// Create a record of the given kind.
    fn insert(&self, kind: EntityKind, record: Map<String, Value>) -> GatewayFuture<'_>;

    /// Overwrite the given fields of the record with `id`.
    fn update(
        &self,
        kind: EntityKind,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> GatewayFuture<'_>;

    /// Delete the record with `id`.
    fn delete(&self, kind: EntityKind, id: RecordId) -> GatewayFuture<'_>;

    /// Succeeds when the remote is reachable at all.
    fn probe(&self) -> GatewayFuture<'_>;
}

impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    fn insert(&self, kind: EntityKind, record: Map<String, Value>) -> GatewayFuture<'_> {
        (**self).insert(kind, record)
    }

    fn update(
        &self,
        kind: EntityKind,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> GatewayFuture<'_> {
        (**self).update(kind, id, changes)
    }

    fn delete(&self, kind: EntityKind, id: RecordId) -> GatewayFuture<'_> {
        (**self).delete(kind, id)
    }

    fn probe(&self) -> GatewayFuture<'_> {
        (**self).probe()
    }
}

/// REST gateway for a PostgREST-style API.
///
/// - insert: `POST {base}/{table}`
/// - update: `PATCH {base}/{table}?id=eq.{id}`
/// - delete: `DELETE {base}/{table}?id=eq.{id}`
/// - probe: `GET {base}/` (any HTTP response counts as reachable)
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl RestGateway {
    /// Create a gateway for the given base URL.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(RestGateway {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Returns the base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(
        &self,
        method: reqwest::Method,
        kind: EntityKind,
        id: Option<&RecordId>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, kind.table());
        let mut builder = self
            .client
            .request(method, url)
            .header("Prefer", "return=minimal");
        if let Some(id) = id {
            builder = builder.query(&[("id", format!("eq.{id}"))]);
        }
        self.authorize(builder)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("apikey", key).bearer_auth(key),
            None => builder,
        }
    }
}

async fn send(builder: reqwest::RequestBuilder) -> GatewayResult<()> {
    let response = builder
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        body,
    })
}

impl Gateway for RestGateway {
    fn insert(&self, kind: EntityKind, record: Map<String, Value>) -> GatewayFuture<'_> {
        let builder = self
            .request(reqwest::Method::POST, kind, None)
            .json(&Value::Object(record));
        Box::pin(send(builder))
    }

    fn update(
        &self,
        kind: EntityKind,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> GatewayFuture<'_> {
        let builder = self
            .request(reqwest::Method::PATCH, kind, Some(&id))
            .json(&Value::Object(changes));
        Box::pin(send(builder))
    }

    fn delete(&self, kind: EntityKind, id: RecordId) -> GatewayFuture<'_> {
        let builder = self.request(reqwest::Method::DELETE, kind, Some(&id));
        Box::pin(send(builder))
    }

    fn probe(&self) -> GatewayFuture<'_> {
        let builder = self.authorize(self.client.get(format!("{}/", self.base_url)));
        Box::pin(async move {
            builder
                .send()
                .await
                .map(|_| ())
                .map_err(|e| GatewayError::Network(e.to_string()))
        })
    }
}

/// Gateway for processes that only enqueue or inspect the queue.
///
/// Every call fails with [`GatewayError::NotConfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedGateway;

impl DetachedGateway {
    fn refuse(&self) -> GatewayFuture<'_> {
        Box::pin(async {
            Err(GatewayError::NotConfigured(
                "set [remote] url in the config file".into(),
            ))
        })
    }
}

impl Gateway for DetachedGateway {
    fn insert(&self, _kind: EntityKind, _record: Map<String, Value>) -> GatewayFuture<'_> {
        self.refuse()
    }

    fn update(
        &self,
        _kind: EntityKind,
        _id: RecordId,
        _changes: Map<String, Value>,
    ) -> GatewayFuture<'_> {
        self.refuse()
    }

    fn delete(&self, _kind: EntityKind, _id: RecordId) -> GatewayFuture<'_> {
        self.refuse()
    }

    fn probe(&self) -> GatewayFuture<'_> {
        self.refuse()
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
