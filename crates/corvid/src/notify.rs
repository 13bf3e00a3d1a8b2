// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery notification surface.
//!
//! Transports report completion here; the fault guard and any interested
//! caller subscribe through [`crate::Client::subscribe`]. Notices for
//! concurrent dispatches arrive in network order, not capture order.

use corvid_core::Ident;
use tokio::sync::broadcast;

const NOTICE_CAPACITY: usize = 64;

/// Outcome of one dispatch attempt. Exactly one notice is emitted per
/// queued dispatch.
#[derive(Debug, Clone)]
pub enum DeliveryNotice {
	/// The transport delivered the event.
	Delivered { ident: Ident },
	/// The transport gave up; no retry is attempted.
	Failed { ident: Ident, reason: String },
}

impl DeliveryNotice {
	pub fn ident(&self) -> &Ident {
		match self {
			DeliveryNotice::Delivered { ident } => ident,
			DeliveryNotice::Failed { ident, .. } => ident,
		}
	}

	pub fn is_delivered(&self) -> bool {
		matches!(self, DeliveryNotice::Delivered { .. })
	}
}

/// Broadcast fan-out for delivery notices.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
	sender: broadcast::Sender<DeliveryNotice>,
}

impl Notifier {
	pub fn new() -> Self {
		let (sender, _) = broadcast::channel(NOTICE_CAPACITY);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<DeliveryNotice> {
		self.sender.subscribe()
	}

	pub fn delivered(&self, ident: Ident) {
		// A send with no subscribers is not an error.
		let _ = self.sender.send(DeliveryNotice::Delivered { ident });
	}

	pub fn failed(&self, ident: Ident, reason: impl Into<String>) {
		let _ = self.sender.send(DeliveryNotice::Failed {
			ident,
			reason: reason.into(),
		});
	}
}
