// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fault guard state machine and process-wide hook behavior.

mod common;

use common::RecordingTransport;
use corvid::{Client, ClientOptions, CorvidError, EventId, Fault, FaultGuard, Ident};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Completions = Arc<Mutex<Vec<(bool, String)>>>;

fn recording_completion() -> (Completions, corvid::Completion) {
	let seen: Completions = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	let completion: corvid::Completion = Arc::new(move |delivered, fault: Fault| {
		sink.lock().unwrap().push((delivered, fault.message));
	});
	(seen, completion)
}

async fn wait_for_completions(seen: &Completions, count: usize) {
	for _ in 0..200 {
		if seen.lock().unwrap().len() >= count {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!(
		"expected {count} completions, saw {}",
		seen.lock().unwrap().len()
	);
}

#[tokio::test]
async fn overlapping_faults_yield_exactly_one_dispatch() {
	let (sends, transport) = RecordingTransport::delivering_after(Duration::from_millis(100));
	let client = Client::new(
		Some("mock://pub@collector.test/1"),
		ClientOptions::new().transport("mock", transport),
	);
	let (seen, completion) = recording_completion();
	let guard = FaultGuard::new(client, Some(completion));

	guard.handle_fault(Fault::from("first"));
	// The first dispatch is still in flight: the second fault must be
	// reported undelivered without a capture of its own.
	guard.handle_fault(Fault::from("second"));

	wait_for_completions(&seen, 2).await;

	assert_eq!(sends.lock().unwrap().len(), 1);
	let completions = seen.lock().unwrap();
	assert_eq!(completions[0], (false, "second".to_owned()));
	assert_eq!(completions[1], (true, "first".to_owned()));
}

#[tokio::test]
async fn guard_returns_to_idle_after_delivery() {
	let (sends, transport) = RecordingTransport::delivering();
	let client = Client::new(
		Some("mock://pub@collector.test/1"),
		ClientOptions::new().transport("mock", transport),
	);
	let (seen, completion) = recording_completion();
	let guard = FaultGuard::new(client, Some(completion));

	guard.handle_fault(Fault::from("first"));
	wait_for_completions(&seen, 1).await;

	// Idle again: the next fault gets its own dispatch.
	guard.handle_fault(Fault::from("second"));
	wait_for_completions(&seen, 2).await;

	assert_eq!(sends.lock().unwrap().len(), 2);
	let completions = seen.lock().unwrap();
	assert_eq!(completions[0], (true, "first".to_owned()));
	assert_eq!(completions[1], (true, "second".to_owned()));
}

#[tokio::test]
async fn listener_survives_a_lagged_notice_channel() {
	let (sends, transport) = RecordingTransport::delivering();
	let client = Client::new(
		Some("mock://pub@collector.test/1"),
		ClientOptions::new().transport("mock", transport),
	);
	let (seen, completion) = recording_completion();
	let guard = FaultGuard::new(client.clone(), Some(completion));

	guard.handle_fault(Fault::from("first"));

	// Flood the notice channel well past its capacity before the
	// listener gets a chance to run, so its first recv observes a lag.
	for n in 0..128 {
		client.report_failed(
			Ident {
				id: EventId::generate(),
			},
			format!("unrelated {n}"),
		);
	}

	wait_for_completions(&seen, 1).await;
	assert_eq!(seen.lock().unwrap()[0], (true, "first".to_owned()));

	// The guard went back to idle, so the next fault dispatches again.
	guard.handle_fault(Fault::from("second"));
	wait_for_completions(&seen, 2).await;
	assert_eq!(sends.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn transport_failure_reaches_the_completion_callback() {
	let (_sends, transport) = RecordingTransport::failing();
	let client = Client::new(
		Some("mock://pub@collector.test/1"),
		ClientOptions::new().transport("mock", transport),
	);
	let (seen, completion) = recording_completion();
	let guard = FaultGuard::new(client, Some(completion));

	guard.handle_fault(Fault::from("doomed"));
	wait_for_completions(&seen, 1).await;
	assert_eq!(seen.lock().unwrap()[0], (false, "doomed".to_owned()));
}

#[tokio::test]
async fn without_completion_every_fault_is_captured() {
	let (sends, transport) = RecordingTransport::delivering();
	let client = Client::new(
		Some("mock://pub@collector.test/1"),
		ClientOptions::new().transport("mock", transport),
	);
	let guard = FaultGuard::new(client, None);

	// No feedback path means no dedup bookkeeping.
	guard.handle_fault(Fault::from("first"));
	guard.handle_fault(Fault::from("second"));

	for _ in 0..200 {
		if sends.lock().unwrap().len() == 2 {
			break;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	assert_eq!(sends.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn disabled_client_resolves_guard_faults_immediately() {
	let client = Client::new(None, ClientOptions::new());
	let (seen, completion) = recording_completion();
	let guard = FaultGuard::new(client, Some(completion));

	guard.handle_fault(Fault::from("nowhere to go"));
	wait_for_completions(&seen, 1).await;
	assert_eq!(seen.lock().unwrap()[0].0, false);

	// And the guard is idle again afterwards.
	guard.handle_fault(Fault::from("again"));
	wait_for_completions(&seen, 2).await;
}

#[test]
fn install_registers_hook_once_and_rejects_a_second_guard() {
	let client = Client::new(None, ClientOptions::new());
	let (seen, completion) = recording_completion();

	let guard = FaultGuard::new(client.clone(), Some(completion));
	guard.install().expect("first install succeeds");

	let second = FaultGuard::new(client, None);
	assert!(matches!(
		second.install(),
		Err(CorvidError::GuardAlreadyInstalled)
	));

	// An uncaught panic on a plain thread reaches the installed guard.
	let _ = std::thread::spawn(|| panic!("thread exploded")).join();

	let completions = seen.lock().unwrap();
	assert_eq!(completions.len(), 1);
	assert!(!completions[0].0);
	assert!(completions[0].1.contains("thread exploded"));
}
