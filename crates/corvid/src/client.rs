// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The capture client: context routing, event construction, dispatch
//! queueing.

use crate::config::{ClientOptions, DataCallback, ModuleInventory};
use crate::dispatch;
use crate::notify::{DeliveryNotice, Notifier};
use crate::scope::{self, OnFault, Scope, ScopeHandle, ACTIVE_SCOPE};
use crate::transport::{HttpTransport, Transport};
use corvid_core::{body, event, Context, Dsn, Event, EventId, Fault, Ident};
use futures::FutureExt;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Caller-supplied auxiliary data for one capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
	pub tags: BTreeMap<String, String>,
	pub extra: Map<String, Value>,
	pub user: Option<Map<String, Value>>,
	pub environment: Option<String>,
	pub logger: Option<String>,
	pub server_name: Option<String>,
}

impl CaptureOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extra.insert(key.into(), value);
		self
	}

	pub fn user(mut self, user: Map<String, Value>) -> Self {
		self.user = Some(user);
		self
	}

	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.environment = Some(environment.into());
		self
	}

	pub fn logger(mut self, logger: impl Into<String>) -> Self {
		self.logger = Some(logger.into());
		self
	}

	pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
		self.server_name = Some(server_name.into());
		self
	}
}

struct ClientInner {
	dsn: Option<Dsn>,
	name: String,
	root: PathBuf,
	release: String,
	environment: String,
	logger_name: String,
	data_callback: Option<DataCallback>,
	module_inventory: Option<ModuleInventory>,
	global: RwLock<Context>,
	notifier: Notifier,
	transports: HashMap<String, Arc<dyn Transport>>,
	runtime: Option<Handle>,
}

/// Client for capturing faults, messages, and diagnostic queries.
///
/// Cheap to clone; all clones share the same global context, transports,
/// and notification surface. Capture operations return synchronously and
/// never fail because of configuration, network, or transport state —
/// the only code that can unwind out of a capture is a user-supplied
/// data callback.
#[derive(Clone)]
pub struct Client {
	inner: Arc<ClientInner>,
}

impl Client {
	/// Builds a client from a raw connection string and options.
	///
	/// Construction is infallible: a missing or unparseable connection
	/// string (after the `CORVID_DSN` fallback) yields a *disabled*
	/// client whose captures still return idents but queue no dispatch.
	pub fn new(dsn: Option<&str>, options: ClientOptions) -> Self {
		let raw = dsn
			.map(str::to_owned)
			.or_else(|| std::env::var("CORVID_DSN").ok());
		let dsn = raw.as_deref().and_then(Dsn::parse);

		let name = options
			.name
			.or_else(|| std::env::var("CORVID_NAME").ok())
			.or_else(|| std::env::var("HOSTNAME").ok())
			.unwrap_or_else(|| "unknown-host".to_owned());
		let root = options
			.root
			.or_else(|| std::env::current_dir().ok())
			.unwrap_or_default();
		let release = options
			.release
			.or_else(|| std::env::var("CORVID_RELEASE").ok())
			.unwrap_or_default();
		let environment = options
			.environment
			.or_else(|| std::env::var("CORVID_ENVIRONMENT").ok())
			.unwrap_or_default();

		let mut transports = default_transports(options.ca_bundle.as_deref());
		transports.extend(options.transports);

		let mut global = Context::new();
		global.merge_tags(options.tags);
		global.merge_extra(options.extra);

		match &dsn {
			Some(dsn) => info!(project = dsn.project_id(), "capture client initialized"),
			None => info!("no usable connection string; capture client disabled"),
		}

		Self {
			inner: Arc::new(ClientInner {
				dsn,
				name,
				root,
				release,
				environment,
				logger_name: options.logger_name.unwrap_or_default(),
				data_callback: options.data_callback,
				module_inventory: options.module_inventory,
				global: RwLock::new(global),
				notifier: Notifier::new(),
				transports,
				runtime: Handle::try_current().ok(),
			}),
		}
	}

	/// Whether a valid connection descriptor is configured.
	pub fn is_enabled(&self) -> bool {
		self.inner.dsn.is_some()
	}

	pub fn dsn(&self) -> Option<&Dsn> {
		self.inner.dsn.as_ref()
	}

	/// The configured server identifier.
	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// The configured project root directory.
	pub fn root(&self) -> &Path {
		&self.inner.root
	}

	// --- notification surface -------------------------------------------

	/// Subscribes to delivery notices for this client's dispatches.
	pub fn subscribe(&self) -> broadcast::Receiver<DeliveryNotice> {
		self.inner.notifier.subscribe()
	}

	/// Reports a successful delivery. Called by transports.
	pub fn report_delivered(&self, ident: Ident) {
		self.inner.notifier.delivered(ident);
	}

	/// Reports a failed delivery. Called by transports; no retry follows.
	pub fn report_failed(&self, ident: Ident, reason: impl Into<String>) {
		self.inner.notifier.failed(ident, reason);
	}

	pub(crate) fn transport_for(&self, scheme: &str) -> Option<Arc<dyn Transport>> {
		self.inner.transports.get(scheme).cloned()
	}

	/// The runtime dispatches run on: the one the caller is currently
	/// inside, falling back to the one captured at construction so a
	/// client built before any runtime existed can still dispatch from
	/// within one later.
	pub(crate) fn dispatch_runtime(&self) -> Option<Handle> {
		Handle::try_current()
			.ok()
			.or_else(|| self.inner.runtime.clone())
	}

	// --- context routing ------------------------------------------------

	/// Sets the user on the active scope, or on the global context when
	/// no scope is active for the calling flow.
	///
	/// This is a write-time routing decision: while a scope is active it
	/// fully shadows the global context for writes.
	pub fn set_user(&self, user: Option<Map<String, Value>>) {
		match scope::active_scope() {
			Some(scope) => scope.update(|context| context.set_user(user)),
			None => self.update_global(|context| context.set_user(user)),
		}
	}

	/// Shallow-merges tags into the active scope or the global context.
	pub fn set_tags(&self, tags: BTreeMap<String, String>) {
		match scope::active_scope() {
			Some(scope) => scope.update(|context| context.merge_tags(tags)),
			None => self.update_global(|context| context.merge_tags(tags)),
		}
	}

	/// Shallow-merges extra data into the active scope or the global
	/// context.
	pub fn set_extra(&self, extra: Map<String, Value>) {
		match scope::active_scope() {
			Some(scope) => scope.update(|context| context.merge_extra(extra)),
			None => self.update_global(|context| context.merge_extra(extra)),
		}
	}

	/// Snapshot of the global context.
	pub fn global_context(&self) -> Context {
		self.inner
			.global
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	fn update_global(&self, apply: impl FnOnce(&mut Context)) {
		let mut global = self
			.inner
			.global
			.write()
			.unwrap_or_else(PoisonError::into_inner);
		apply(&mut global);
	}

	// --- captures -------------------------------------------------------

	/// Captures a plain message.
	pub fn capture_message(&self, message: &str, options: CaptureOptions) -> Ident {
		self.process(body::from_message(message), options)
	}

	/// Captures a fault, coercing whatever the caller throws at it.
	pub fn capture_fault(&self, fault: impl Into<Fault>, options: CaptureOptions) -> Ident {
		let fault = fault.into();
		self.process(body::from_fault(&fault), options)
	}

	/// Captures a structured error.
	pub fn capture_error(
		&self,
		error: &(dyn std::error::Error + 'static),
		options: CaptureOptions,
	) -> Ident {
		self.capture_fault(Fault::from_error(error), options)
	}

	/// Captures a diagnostic query.
	pub fn capture_query(&self, query: &str, engine: &str, options: CaptureOptions) -> Ident {
		self.process(body::from_query(query, engine), options)
	}

	/// Assembles the event and queues its dispatch.
	///
	/// Field precedence: tags and extra merge global ⊕ scope ⊕ explicit,
	/// later sources winning on key collisions. The user is asymmetric:
	/// a contextual user (scope first, then global) overrides an
	/// explicit call-site user; the explicit user applies only when no
	/// contextual user exists.
	fn process(&self, body: Map<String, Value>, options: CaptureOptions) -> Ident {
		let contextual = match scope::active_scope() {
			Some(scope) => self.global_context().overlay(&scope.snapshot()),
			None => self.global_context(),
		};

		let mut tags = contextual.tags;
		tags.extend(options.tags);

		let mut extra = contextual.extra;
		for (key, value) in options.extra {
			extra.insert(key, value);
		}
		extra.entry("sdk".to_owned()).or_insert_with(|| {
			json!({ "name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION") })
		});

		let user = contextual.user.or(options.user);

		let modules = match &self.inner.module_inventory {
			Some(provider) => provider(),
			None => corvid_core::default_inventory(),
		};

		let event = Event {
			event_id: EventId::generate(),
			timestamp: event::wire_timestamp(),
			project: self
				.inner
				.dsn
				.as_ref()
				.map(|dsn| dsn.project_id().to_owned())
				.unwrap_or_default(),
			platform: "rust".to_owned(),
			logger: options
				.logger
				.unwrap_or_else(|| self.inner.logger_name.clone()),
			server_name: options
				.server_name
				.unwrap_or_else(|| self.inner.name.clone()),
			modules,
			extra,
			tags,
			user,
			release: non_empty(&self.inner.release),
			environment: options
				.environment
				.filter(|env| !env.is_empty())
				.or_else(|| non_empty(&self.inner.environment)),
			body,
		};

		let ident = Ident {
			id: event.event_id.clone(),
		};

		// The callback's return value wholly replaces the event; a panic
		// inside it propagates to the capture caller.
		let event = match &self.inner.data_callback {
			Some(callback) => callback(event),
			None => event,
		};

		if self.is_enabled() {
			self.queue_dispatch(event, ident.clone());
		}

		ident
	}

	fn queue_dispatch(&self, event: Event, ident: Ident) {
		let Some(runtime) = self.dispatch_runtime() else {
			debug!(event_id = %ident.id, "no async runtime available; dispatch skipped");
			return;
		};
		let client = self.clone();
		runtime.spawn(dispatch::run(client, event, ident));
	}

	// --- scopes ---------------------------------------------------------

	/// Runs `body` under a fresh scope seeded with `initial`.
	///
	/// The scope is active for body's entire asynchronous extent; `body`
	/// is deferred one scheduling step so no part of it runs before the
	/// scope is observable. An `Err` resolved by the body, or a panic
	/// inside it, is captured using the scope's context instead of
	/// reaching the process-wide fault guard.
	///
	/// Must be called from within a tokio runtime.
	pub fn with_scope<F, T, E>(&self, initial: Context, body: F) -> ScopeHandle<T>
	where
		F: Future<Output = Result<T, E>> + Send + 'static,
		T: Send + 'static,
		E: Into<Fault> + Send + 'static,
	{
		self.spawn_scope(initial, body, None)
	}

	/// Like [`Client::with_scope`], with an explicit fault handler
	/// replacing the default capture. A panic inside `on_fault`
	/// propagates; it is never silently caught.
	pub fn with_scope_on_fault<F, T, E>(
		&self,
		initial: Context,
		body: F,
		on_fault: OnFault,
	) -> ScopeHandle<T>
	where
		F: Future<Output = Result<T, E>> + Send + 'static,
		T: Send + 'static,
		E: Into<Fault> + Send + 'static,
	{
		self.spawn_scope(initial, body, Some(on_fault))
	}

	fn spawn_scope<F, T, E>(
		&self,
		initial: Context,
		body: F,
		on_fault: Option<OnFault>,
	) -> ScopeHandle<T>
	where
		F: Future<Output = Result<T, E>> + Send + 'static,
		T: Send + 'static,
		E: Into<Fault> + Send + 'static,
	{
		let scope = Arc::new(Scope::new(initial));
		let client = self.clone();
		let task_scope = Arc::clone(&scope);

		// The task-local wrapper installs the scope before the first poll
		// of the body, and spawning defers that poll by a scheduling
		// step.
		let join = tokio::spawn(ACTIVE_SCOPE.scope(task_scope, async move {
			match AssertUnwindSafe(body).catch_unwind().await {
				Ok(Ok(value)) => Some(value),
				Ok(Err(err)) => {
					client.route_scope_fault(on_fault, err.into());
					None
				}
				Err(payload) => {
					client.route_scope_fault(on_fault, Fault::from_panic(payload.as_ref()));
					None
				}
			}
		}));

		ScopeHandle { scope, join }
	}

	/// Runs inside the faulted scope's extent, so the default capture
	/// resolves the scope's context.
	fn route_scope_fault(&self, on_fault: Option<OnFault>, fault: Fault) {
		match on_fault {
			Some(handler) => handler(fault),
			None => {
				let ident = self.capture_fault(fault, CaptureOptions::default());
				error!(event_id = %ident.id, "scope fault captured");
			}
		}
	}
}

fn non_empty(value: &str) -> Option<String> {
	if value.is_empty() {
		None
	} else {
		Some(value.to_owned())
	}
}

fn default_transports(ca_bundle: Option<&[u8]>) -> HashMap<String, Arc<dyn Transport>> {
	let mut transports: HashMap<String, Arc<dyn Transport>> = HashMap::new();
	let http: Arc<dyn Transport> = Arc::new(HttpTransport::new());
	let https: Arc<dyn Transport> = match ca_bundle {
		Some(ca_pem) => match HttpTransport::with_ca(ca_pem) {
			Ok(transport) => Arc::new(transport),
			Err(err) => {
				error!(error = %err, "certificate authority override rejected");
				Arc::clone(&http)
			}
		},
		None => Arc::clone(&http),
	};
	transports.insert("http".to_owned(), http);
	transports.insert("https".to_owned(), https);
	transports
}
