// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The enriched event record and its identifiers.

use crate::modules::ModuleInfo;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one captured event: 32 lowercase hex characters,
/// no separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
	pub fn generate() -> Self {
		Self(Uuid::new_v4().simple().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// The synchronous result of every capture call, returned whether or not
/// a dispatch was queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
	pub id: EventId,
}

/// Current wall-clock time as ISO-8601 with the sub-second part
/// discarded (truncated, not rounded).
pub fn wire_timestamp() -> String {
	Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// The record describing one capture, immutable once built.
///
/// Serializes to the collector wire shape; the body fragment produced by
/// [`crate::body`] is flattened into the top level.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
	pub event_id: EventId,
	pub timestamp: String,
	pub project: String,
	pub platform: String,
	pub logger: String,
	pub server_name: String,
	pub modules: Vec<ModuleInfo>,
	pub extra: Map<String, Value>,
	pub tags: BTreeMap<String, String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<Map<String, Value>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub release: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
	#[serde(flatten)]
	pub body: Map<String, Value>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn minimal_event() -> Event {
		Event {
			event_id: EventId::generate(),
			timestamp: wire_timestamp(),
			project: "42".into(),
			platform: "rust".into(),
			logger: String::new(),
			server_name: "box-1".into(),
			modules: Vec::new(),
			extra: Map::new(),
			tags: BTreeMap::new(),
			user: None,
			release: None,
			environment: None,
			body: Map::new(),
		}
	}

	#[test]
	fn event_id_is_32_lowercase_hex() {
		let id = EventId::generate().to_string();
		assert_eq!(id.len(), 32);
		assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
	}

	#[test]
	fn event_ids_are_fresh_per_event() {
		assert_ne!(EventId::generate(), EventId::generate());
	}

	#[test]
	fn wire_timestamp_has_no_subsecond_part() {
		let ts = wire_timestamp();
		assert!(!ts.contains('.'));
		assert_eq!(ts.len(), "2025-01-01T00:00:00".len());
	}

	#[test]
	fn optional_fields_are_omitted_when_absent() {
		let serialized = serde_json::to_value(minimal_event()).unwrap();
		let object = serialized.as_object().unwrap();
		assert!(!object.contains_key("user"));
		assert!(!object.contains_key("release"));
		assert!(!object.contains_key("environment"));
	}

	#[test]
	fn body_fragment_is_flattened() {
		let mut event = minimal_event();
		event.body.insert("message".into(), json!("hello"));
		let serialized = serde_json::to_value(event).unwrap();
		assert_eq!(serialized["message"], json!("hello"));
	}
}
