// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tag/extra/user context maps and their merge rules.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Contextual metadata attached to events.
///
/// The same shape backs both the process-wide global context and each
/// flow-local scope. Writes are shallow merges: new keys overwrite,
/// existing keys are retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
	pub tags: BTreeMap<String, String>,
	pub extra: Map<String, Value>,
	pub user: Option<Map<String, Value>>,
}

impl Context {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds a single tag; chainable, intended for initial contexts.
	pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	/// Seeds a single extra entry; chainable.
	pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extra.insert(key.into(), value);
		self
	}

	/// Seeds the user; chainable.
	pub fn with_user(mut self, user: Map<String, Value>) -> Self {
		self.user = Some(user);
		self
	}

	pub fn merge_tags(&mut self, tags: BTreeMap<String, String>) {
		self.tags.extend(tags);
	}

	pub fn merge_extra(&mut self, extra: Map<String, Value>) {
		for (key, value) in extra {
			self.extra.insert(key, value);
		}
	}

	pub fn set_user(&mut self, user: Option<Map<String, Value>>) {
		self.user = user;
	}

	/// Read-time merge for event construction.
	///
	/// `over` wins key-by-key for tags and extra, and wholesale for the
	/// user: an overlay user replaces the base user entirely, while an
	/// absent overlay user leaves the base user visible.
	pub fn overlay(&self, over: &Context) -> Context {
		let mut merged = self.clone();
		merged.tags.extend(over.tags.clone());
		for (key, value) in &over.extra {
			merged.extra.insert(key.clone(), value.clone());
		}
		if over.user.is_some() {
			merged.user = over.user.clone();
		}
		merged
	}
}
