// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flow-local scopes layered over the global context.
//!
//! A scope is an isolated `{tags, extra, user}` context bound to one
//! logical asynchronous flow. It is installed in task-local storage for
//! the whole async extent of the flow's body, so context resolution is
//! an explicit lookup on the running task, never an ambient global.
//! Sibling flows and the global context never observe a scope's
//! mutations.

use corvid_core::{Context, Fault};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

tokio::task_local! {
	pub(crate) static ACTIVE_SCOPE: Arc<Scope>;
}

/// Returns the scope installed for the current task, if any.
pub(crate) fn active_scope() -> Option<Arc<Scope>> {
	ACTIVE_SCOPE.try_with(Arc::clone).ok()
}

/// An isolated context owned by one asynchronous flow.
///
/// Reclaimed once the flow completes and the last handle is dropped;
/// there is no explicit destructor.
#[derive(Debug)]
pub struct Scope {
	context: Mutex<Context>,
}

impl Scope {
	pub(crate) fn new(initial: Context) -> Self {
		Self {
			context: Mutex::new(initial),
		}
	}

	/// Snapshot of the scope's context at this instant.
	pub fn snapshot(&self) -> Context {
		self.context
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub(crate) fn update(&self, apply: impl FnOnce(&mut Context)) {
		let mut context = self.context.lock().unwrap_or_else(PoisonError::into_inner);
		apply(&mut context);
	}
}

/// Fault handler for one scope flow. Panics inside the handler are not
/// caught; they unwind the scope task and resurface from
/// [`ScopeHandle::join`].
pub type OnFault = Box<dyn FnOnce(Fault) + Send + 'static>;

/// Handle to a flow started by [`crate::Client::with_scope`].
#[derive(Debug)]
pub struct ScopeHandle<T> {
	pub(crate) scope: Arc<Scope>,
	pub(crate) join: JoinHandle<Option<T>>,
}

impl<T> ScopeHandle<T> {
	/// The scope this flow runs under.
	pub fn scope(&self) -> &Arc<Scope> {
		&self.scope
	}

	/// Waits for the flow to finish.
	///
	/// Returns `None` when the body faulted and the fault was routed to
	/// its handler. A panic raised by a user-supplied fault handler is
	/// resumed here.
	pub async fn join(self) -> Option<T> {
		match self.join.await {
			Ok(outcome) => outcome,
			Err(join_error) if join_error.is_panic() => {
				std::panic::resume_unwind(join_error.into_panic())
			}
			Err(_) => None,
		}
	}
}
