// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fault representation and coercion of arbitrary thrown values.

use crate::trace::{self, Stacktrace};
use std::any::Any;
use std::error::Error;
use std::fmt;

/// A captured runtime fault.
///
/// Every value the process throws is coerced into this shape before
/// capture; values that are not already structured errors become a
/// synthetic fault carrying a best-effort origin trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
	/// Classification of the fault ("panic", an error type name, ...).
	pub kind: String,
	pub message: String,
	pub origin_trace: Option<Stacktrace>,
}

impl Fault {
	/// Creates a fault and records the current call stack as its origin.
	pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			message: message.into(),
			origin_trace: Some(trace::capture()),
		}
	}

	/// Creates a fault with an already-captured origin trace.
	pub fn with_trace(
		kind: impl Into<String>,
		message: impl Into<String>,
		origin_trace: Stacktrace,
	) -> Self {
		Self {
			kind: kind.into(),
			message: message.into(),
			origin_trace: Some(origin_trace),
		}
	}

	/// Coerces a structured error, keyed by its concrete type name.
	pub fn from_error(error: &(dyn Error + 'static)) -> Self {
		Self::new(std::any::type_name_of_val(error), error.to_string())
	}

	/// Synthesizes a fault from a panic payload.
	///
	/// String payloads keep their message; anything else is recorded as
	/// opaque.
	pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
		let message = if let Some(message) = payload.downcast_ref::<&str>() {
			(*message).to_owned()
		} else if let Some(message) = payload.downcast_ref::<String>() {
			message.clone()
		} else {
			"opaque panic payload".to_owned()
		};
		Self::new("panic", message)
	}
}

impl fmt::Display for Fault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.kind, self.message)
	}
}

impl From<String> for Fault {
	fn from(message: String) -> Self {
		Fault::new("fault", message)
	}
}

impl From<&str> for Fault {
	fn from(message: &str) -> Self {
		Fault::new("fault", message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io;

	#[test]
	fn from_error_uses_type_name_and_message() {
		let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
		let fault = Fault::from_error(&err);
		assert!(fault.kind.contains("Error"));
		assert_eq!(fault.message, "disk on fire");
		assert!(fault.origin_trace.is_some());
	}

	#[test]
	fn from_panic_str_payload() {
		let payload: Box<dyn Any + Send> = Box::new("boom");
		let fault = Fault::from_panic(payload.as_ref());
		assert_eq!(fault.kind, "panic");
		assert_eq!(fault.message, "boom");
	}

	#[test]
	fn from_panic_string_payload() {
		let payload: Box<dyn Any + Send> = Box::new(String::from("kaput"));
		let fault = Fault::from_panic(payload.as_ref());
		assert_eq!(fault.message, "kaput");
	}

	#[test]
	fn from_panic_opaque_payload() {
		let payload: Box<dyn Any + Send> = Box::new(17_u32);
		let fault = Fault::from_panic(payload.as_ref());
		assert_eq!(fault.message, "opaque panic payload");
	}

	#[test]
	fn string_coercion_is_synthetic() {
		let fault = Fault::from("something awesome");
		assert_eq!(fault.kind, "fault");
		assert!(fault.origin_trace.is_some());
	}

	#[test]
	fn display_joins_kind_and_message() {
		let fault = Fault::with_trace("panic", "boom", Stacktrace::default());
		assert_eq!(fault.to_string(), "panic: boom");
	}
}
