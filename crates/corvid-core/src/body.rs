// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Body fragment constructors for the three capture kinds.
//!
//! Each constructor returns an already-safe JSON fragment that the event
//! builder flattens into the event top level. Fragments never fail to
//! build.

use crate::fault::Fault;
use serde_json::{json, Map, Value};

/// Fragment for a plain message capture.
pub fn from_message(message: &str) -> Map<String, Value> {
	let mut body = Map::new();
	body.insert("message".to_owned(), Value::String(message.to_owned()));
	body
}

/// Fragment for a fault capture: exception record plus a culprit taken
/// from the innermost application frame of the origin trace.
pub fn from_fault(fault: &Fault) -> Map<String, Value> {
	let mut body = Map::new();
	body.insert("message".to_owned(), Value::String(fault.to_string()));
	body.insert(
		"exception".to_owned(),
		json!({
			"type": fault.kind,
			"value": fault.message,
			"stacktrace": fault.origin_trace,
		}),
	);
	if let Some(culprit) = fault.origin_trace.as_ref().and_then(|trace| trace.culprit()) {
		body.insert("culprit".to_owned(), Value::String(culprit.function.clone()));
	}
	body
}

/// Fragment for a diagnostic query capture.
pub fn from_query(query: &str, engine: &str) -> Map<String, Value> {
	let mut body = Map::new();
	body.insert("message".to_owned(), Value::String(query.to_owned()));
	body.insert(
		"query".to_owned(),
		json!({ "query": query, "engine": engine }),
	);
	body
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::trace::{Frame, Stacktrace};

	#[test]
	fn message_fragment() {
		let body = from_message("ready");
		assert_eq!(body["message"], json!("ready"));
	}

	#[test]
	fn fault_fragment_carries_exception_and_culprit() {
		let trace = Stacktrace {
			frames: vec![Frame {
				function: "app::job::run".into(),
				module: Some("app::job".into()),
				in_app: true,
			}],
		};
		let fault = Fault::with_trace("panic", "boom", trace);
		let body = from_fault(&fault);

		assert_eq!(body["message"], json!("panic: boom"));
		assert_eq!(body["exception"]["type"], json!("panic"));
		assert_eq!(body["exception"]["value"], json!("boom"));
		assert_eq!(body["culprit"], json!("app::job::run"));
	}

	#[test]
	fn fault_fragment_without_trace_has_no_culprit() {
		let fault = Fault {
			kind: "fault".into(),
			message: "bare".into(),
			origin_trace: None,
		};
		let body = from_fault(&fault);
		assert!(!body.contains_key("culprit"));
	}

	#[test]
	fn query_fragment() {
		let body = from_query("SELECT 1", "postgres");
		assert_eq!(body["message"], json!("SELECT 1"));
		assert_eq!(body["query"]["engine"], json!("postgres"));
	}
}
