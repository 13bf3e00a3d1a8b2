// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared helpers for SDK integration tests.

use async_trait::async_trait;
use corvid::{Client, ClientOptions, EnvelopeHeaders, Event, Ident, Transport};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that records every body it is asked to send and reports a
/// configurable outcome after an optional delay.
pub struct RecordingTransport {
	sends: Arc<Mutex<Vec<String>>>,
	deliver: bool,
	delay: Duration,
}

impl RecordingTransport {
	pub fn delivering() -> (Arc<Mutex<Vec<String>>>, Arc<Self>) {
		Self::build(true, Duration::ZERO)
	}

	pub fn failing() -> (Arc<Mutex<Vec<String>>>, Arc<Self>) {
		Self::build(false, Duration::ZERO)
	}

	pub fn delivering_after(delay: Duration) -> (Arc<Mutex<Vec<String>>>, Arc<Self>) {
		Self::build(true, delay)
	}

	fn build(deliver: bool, delay: Duration) -> (Arc<Mutex<Vec<String>>>, Arc<Self>) {
		let sends = Arc::new(Mutex::new(Vec::new()));
		let transport = Arc::new(Self {
			sends: Arc::clone(&sends),
			deliver,
			delay,
		});
		(sends, transport)
	}
}

#[async_trait]
impl Transport for RecordingTransport {
	async fn send(&self, client: &Client, body: String, _headers: EnvelopeHeaders, ident: Ident) {
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		self.sends.lock().unwrap().push(body);
		if self.deliver {
			client.report_delivered(ident);
		} else {
			client.report_failed(ident, "synthetic transport failure");
		}
	}
}

/// Client options with a data callback that copies every built event
/// into the returned sink.
pub fn event_sink() -> (Arc<Mutex<Vec<Event>>>, ClientOptions) {
	let seen: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	let options = ClientOptions::new().data_callback(move |event| {
		sink.lock().unwrap().push(event.clone());
		event
	});
	(seen, options)
}
