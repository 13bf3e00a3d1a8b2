// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the SDK.
//!
//! Capture operations never return these to callers: configuration,
//! network, and transport conditions surface only through "failed"
//! delivery notices. The variants here belong to guard installation and
//! to the dispatch pipeline internals.

use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, CorvidError>;

/// Errors that can occur inside the SDK.
#[derive(Debug, Error)]
pub enum CorvidError {
	/// A fault guard is already installed for this process.
	#[error("a fault guard is already installed for this process")]
	GuardAlreadyInstalled,

	/// Event serialization failed.
	#[error("event serialization failed: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Event compression failed.
	#[error("event compression failed: {0}")]
	Compression(#[from] std::io::Error),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Collector returned a non-success status.
	#[error("collector error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Error message from the collector.
		message: String,
	},

	/// No transport is registered for the descriptor's scheme.
	#[error("no transport registered for scheme {0:?}")]
	NoTransport(String),
}
