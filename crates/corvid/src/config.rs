// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration.

use crate::transport::Transport;
use corvid_core::{Event, ModuleInfo};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Callback invoked synchronously with every fully built event; its
/// return value wholly replaces the event before dispatch.
///
/// Panics inside the callback are not caught by the SDK and propagate to
/// the caller of the capture operation.
pub type DataCallback = Arc<dyn Fn(Event) -> Event + Send + Sync>;

/// Replacement module inventory provider.
pub type ModuleInventory = Arc<dyn Fn() -> Vec<ModuleInfo> + Send + Sync>;

/// Options recognized at client construction.
///
/// Every field is optional; [`crate::Client::new`] fills in environment
/// and host defaults for whatever is left unset.
#[derive(Clone, Default)]
pub struct ClientOptions {
	/// Server identifier stamped on events. Defaults to `CORVID_NAME`,
	/// then `HOSTNAME`.
	pub name: Option<String>,
	/// Project root directory. Defaults to the current directory.
	pub root: Option<PathBuf>,
	/// Release identifier; omitted from events when empty. Defaults to
	/// `CORVID_RELEASE`.
	pub release: Option<String>,
	/// Deployment environment. Defaults to `CORVID_ENVIRONMENT`.
	pub environment: Option<String>,
	/// Default logger name for events with no explicit override.
	pub logger_name: Option<String>,
	/// PEM bundle of an additional certificate authority for the HTTPS
	/// transport.
	pub ca_bundle: Option<Vec<u8>>,
	/// Initial global tags.
	pub tags: BTreeMap<String, String>,
	/// Initial global extra data.
	pub extra: Map<String, Value>,
	/// Event rewrite hook; see [`DataCallback`].
	pub data_callback: Option<DataCallback>,
	/// Replacement module inventory provider.
	pub module_inventory: Option<ModuleInventory>,
	/// Per-scheme transport overrides, applied on top of the built-in
	/// `http`/`https` transports.
	pub transports: HashMap<String, Arc<dyn Transport>>,
}

impl ClientOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
		self.root = Some(root.into());
		self
	}

	pub fn release(mut self, release: impl Into<String>) -> Self {
		self.release = Some(release.into());
		self
	}

	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	pub fn logger_name(mut self, logger_name: impl Into<String>) -> Self {
		self.logger_name = Some(logger_name.into());
		self
	}

	pub fn ca_bundle(mut self, ca_pem: impl Into<Vec<u8>>) -> Self {
		self.ca_bundle = Some(ca_pem.into());
		self
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extra.insert(key.into(), value);
		self
	}

	pub fn data_callback(
		mut self,
		callback: impl Fn(Event) -> Event + Send + Sync + 'static,
	) -> Self {
		self.data_callback = Some(Arc::new(callback));
		self
	}

	pub fn module_inventory(
		mut self,
		provider: impl Fn() -> Vec<ModuleInfo> + Send + Sync + 'static,
	) -> Self {
		self.module_inventory = Some(Arc::new(provider));
		self
	}

	/// Registers or replaces the transport for one DSN scheme.
	pub fn transport(mut self, scheme: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
		self.transports.insert(scheme.into(), transport);
		self
	}
}

impl fmt::Debug for ClientOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientOptions")
			.field("name", &self.name)
			.field("root", &self.root)
			.field("release", &self.release)
			.field("environment", &self.environment)
			.field("logger_name", &self.logger_name)
			.field("ca_bundle", &self.ca_bundle.as_ref().map(|_| "<pem>"))
			.field("tags", &self.tags)
			.field("extra", &self.extra)
			.field("data_callback", &self.data_callback.as_ref().map(|_| "<fn>"))
			.field(
				"module_inventory",
				&self.module_inventory.as_ref().map(|_| "<fn>"),
			)
			.field(
				"transports",
				&self.transports.keys().collect::<Vec<_>>(),
			)
			.finish()
	}
}
