// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pluggable delivery transports, keyed by DSN scheme.

use crate::client::Client;
use crate::error::CorvidError;
use async_trait::async_trait;
use corvid_core::Ident;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers accompanying one encoded event.
#[derive(Debug, Clone)]
pub struct EnvelopeHeaders {
	/// The `X-Corvid-Auth` value for this transmission.
	pub auth: String,
	pub content_type: &'static str,
	pub content_length: usize,
}

impl EnvelopeHeaders {
	pub fn new(auth: String, content_length: usize) -> Self {
		Self {
			auth,
			content_type: "application/octet-stream",
			content_length,
		}
	}
}

/// A delivery mechanism for encoded events.
///
/// Implementations attempt delivery exactly once — no retry, no backoff,
/// no batching — and must report the outcome through
/// [`Client::report_delivered`] or [`Client::report_failed`].
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, client: &Client, body: String, headers: EnvelopeHeaders, ident: Ident);
}

/// Built-in transport for `http` and `https` descriptors: posts the
/// encoded event to the descriptor's store endpoint.
pub struct HttpTransport {
	http: reqwest::Client,
}

impl HttpTransport {
	pub fn new() -> Self {
		Self {
			http: corvid_common_http::new_client_with_timeout(REQUEST_TIMEOUT),
		}
	}

	/// Transport trusting an additional certificate authority.
	pub fn with_ca(ca_pem: &[u8]) -> reqwest::Result<Self> {
		Ok(Self {
			http: corvid_common_http::new_client_with_ca(ca_pem, REQUEST_TIMEOUT)?,
		})
	}
}

impl Default for HttpTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send(&self, client: &Client, body: String, headers: EnvelopeHeaders, ident: Ident) {
		// Only enabled clients queue dispatches, so a descriptor exists.
		let Some(dsn) = client.dsn() else {
			client.report_failed(ident, "client has no connection descriptor");
			return;
		};
		let url = dsn.endpoint();

		let result = self
			.http
			.post(&url)
			.header("X-Corvid-Auth", &headers.auth)
			.header(CONTENT_TYPE, headers.content_type)
			.header(CONTENT_LENGTH, headers.content_length)
			.body(body)
			.send()
			.await;

		match result {
			Ok(response) if response.status().is_success() => {
				debug!(event_id = %ident.id, "event delivered");
				client.report_delivered(ident);
			}
			Ok(response) => {
				let status = response.status().as_u16();
				let message = response.text().await.unwrap_or_default();
				error!(event_id = %ident.id, status, "collector rejected event");
				client.report_failed(ident, CorvidError::ServerError { status, message }.to_string());
			}
			Err(err) => {
				error!(event_id = %ident.id, error = %err, "event delivery failed");
				client.report_failed(ident, CorvidError::RequestFailed(err).to_string());
			}
		}
	}
}
