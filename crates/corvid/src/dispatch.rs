// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The serialize → compress → encode → sign → transmit pipeline.
//!
//! One pipeline run per queued event, executed on the async runtime so
//! capture calls return without blocking. Pipeline failures surface as
//! "failed" delivery notices, never as errors to the capture caller.

use crate::client::Client;
use crate::error::{CorvidError, Result};
use crate::transport::EnvelopeHeaders;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use corvid_core::{auth, Event, Ident};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use tracing::{debug, error};

/// Runs the full pipeline for one event.
pub(crate) async fn run(client: Client, event: Event, ident: Ident) {
	let Some(dsn) = client.dsn().cloned() else {
		return;
	};

	let encoded = match encode(&event) {
		Ok(encoded) => encoded,
		Err(err) => {
			error!(event_id = %ident.id, error = %err, "event encoding failed");
			client.report_failed(ident, err.to_string());
			return;
		}
	};

	let headers = EnvelopeHeaders::new(
		auth::auth_header(
			Utc::now().timestamp_millis(),
			dsn.public_key(),
			dsn.secret_key(),
		),
		encoded.len(),
	);

	let Some(transport) = client.transport_for(dsn.scheme()) else {
		error!(scheme = dsn.scheme(), "no transport registered for scheme");
		let err = CorvidError::NoTransport(dsn.scheme().to_owned());
		client.report_failed(ident, err.to_string());
		return;
	};

	debug!(event_id = %ident.id, endpoint = %dsn.endpoint(), "dispatching event");
	transport.send(&client, encoded, headers, ident).await;
}

/// Serializes and deflates the event, then encodes it to transportable
/// text.
pub(crate) fn encode(event: &Event) -> Result<String> {
	let serialized = serde_json::to_vec(event)?;
	let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(&serialized)?;
	let compressed = encoder.finish()?;
	Ok(BASE64.encode(compressed))
}
