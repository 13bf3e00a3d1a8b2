// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction with a consistent User-Agent header.
//!
//! Transports build their reqwest clients here so every outbound request
//! identifies itself the same way. There is deliberately no retry layer:
//! the SDK makes exactly one delivery attempt per event.

use reqwest::{Certificate, Client, ClientBuilder};
use std::time::Duration;

/// Creates an HTTP client with the standard corvid User-Agent.
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Creates an HTTP client builder with the standard corvid User-Agent.
///
/// Use this when the client needs further customization.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates an HTTP client with a request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> Client {
	builder()
		.timeout(timeout)
		.build()
		.expect("failed to build HTTP client")
}

/// Creates an HTTP client trusting an additional certificate authority.
///
/// `ca_pem` is a PEM-encoded certificate bundle; an unparseable bundle
/// is an error rather than a silently ignored override.
pub fn new_client_with_ca(ca_pem: &[u8], timeout: Duration) -> reqwest::Result<Client> {
	let certificate = Certificate::from_pem(ca_pem)?;
	builder()
		.timeout(timeout)
		.add_root_certificate(certificate)
		.build()
}

/// Returns the standard corvid User-Agent string.
///
/// Format: `corvid/{os}-{arch}/{version}`
pub fn user_agent() -> String {
	format!(
		"corvid/{}-{}/{}",
		std::env::consts::OS,
		std::env::consts::ARCH,
		env!("CARGO_PKG_VERSION")
	)
}
