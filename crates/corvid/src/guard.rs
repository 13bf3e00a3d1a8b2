// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide uncaught-fault handling with overlap-safe dedup.
//!
//! The guard is a two-state machine, idle and in-flight, guarding a
//! single outstanding dispatch slot. A fault arriving while a prior
//! capture is still awaiting its delivery notice is reported to the
//! completion callback as undelivered without a second dispatch: bounded
//! resource usage is preferred over delivery of every overlapping fault,
//! and the behavior is deliberately not generalized to N-deep queueing.

use crate::client::{CaptureOptions, Client};
use crate::error::{CorvidError, Result};
use crate::scope;
use corvid_core::Fault;
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

/// Completion callback receiving `(delivered, fault)` once per uncaught
/// fault.
pub type Completion = Arc<dyn Fn(bool, Fault) + Send + Sync>;

static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
	Idle,
	InFlight,
}

struct GuardInner {
	client: Client,
	completion: Option<Completion>,
	state: Mutex<GuardState>,
}

/// Process-wide handler for uncaught faults.
///
/// Built atop the scope manager, event builder, and dispatch pipeline:
/// each handled fault is captured with whatever global or scope context
/// is current, and the delivery notice feeds the completion callback.
pub struct FaultGuard {
	inner: Arc<GuardInner>,
}

impl FaultGuard {
	/// Creates a guard without registering any process-wide hook.
	///
	/// Useful when the host application has its own fault source and
	/// routes faults through [`FaultGuard::handle_fault`] directly.
	pub fn new(client: Client, completion: Option<Completion>) -> Self {
		Self {
			inner: Arc::new(GuardInner {
				client,
				completion,
				state: Mutex::new(GuardState::Idle),
			}),
		}
	}

	/// Registers this guard as the process-wide panic hook.
	///
	/// Exactly one guard may be installed per process; a second install
	/// is rejected with [`CorvidError::GuardAlreadyInstalled`]. Panics
	/// raised inside an active scope are skipped here — they belong to
	/// that scope's fault handler.
	pub fn install(&self) -> Result<()> {
		if HOOK_INSTALLED
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			return Err(CorvidError::GuardAlreadyInstalled);
		}

		let inner = Arc::clone(&self.inner);
		let previous = panic::take_hook();
		panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
			if scope::active_scope().is_none() {
				inner.handle(fault_from_panic(panic_info));
			}
			previous(panic_info);
		}));

		info!("fault guard installed");
		Ok(())
	}

	/// Routes one uncaught fault through the guard's state machine.
	pub fn handle_fault(&self, fault: Fault) {
		self.inner.handle(fault);
	}
}

impl GuardInner {
	fn handle(self: &Arc<Self>, fault: Fault) {
		let Some(completion) = self.completion.clone() else {
			// No feedback path, so nothing to coordinate with: capture
			// every fault and skip the in-flight bookkeeping.
			let ident = self.client.capture_fault(fault, CaptureOptions::default());
			info!(event_id = %ident.id, "uncaught fault captured");
			return;
		};

		{
			let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
			if *state == GuardState::InFlight {
				// A prior capture is still awaiting its delivery notice:
				// drop this fault's dispatch, report it undelivered.
				drop(state);
				completion(false, fault);
				return;
			}
			*state = GuardState::InFlight;
		}

		// Subscribe before capturing so the notice cannot be missed.
		let mut notices = self.client.subscribe();
		let ident = self.client.capture_fault(fault.clone(), CaptureOptions::default());
		info!(event_id = %ident.id, "uncaught fault captured");

		let Some(runtime) = self.client.dispatch_runtime() else {
			// Nothing will ever emit a notice; resolve immediately.
			self.reset();
			completion(false, fault);
			return;
		};
		if !self.client.is_enabled() {
			self.reset();
			completion(false, fault);
			return;
		}

		// One-shot listener bound to this ident.
		let inner = Arc::clone(self);
		runtime.spawn(async move {
			loop {
				match notices.recv().await {
					Ok(notice) => {
						if notice.ident() != &ident {
							continue;
						}
						inner.reset();
						completion(notice.is_delivered(), fault);
						break;
					}
					// Falling behind drops the oldest notices; ours may
					// still be in the buffer or yet to arrive.
					Err(RecvError::Lagged(_)) => continue,
					Err(RecvError::Closed) => {
						inner.reset();
						completion(false, fault);
						break;
					}
				}
			}
		});
	}

	fn reset(&self) {
		let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
		*state = GuardState::Idle;
	}
}

fn fault_from_panic(panic_info: &PanicHookInfo<'_>) -> Fault {
	let mut fault = Fault::from_panic(panic_info.payload());
	if let Some(location) = panic_info.location() {
		fault.message = format!("{} (at {location})", fault.message);
	}
	fault
}
