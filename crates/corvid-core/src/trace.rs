// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Origin trace capture for faults.

use rustc_demangle::demangle;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;

/// A best-effort call stack recorded at fault creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	/// The innermost application frame, used as the event culprit.
	pub fn culprit(&self) -> Option<&Frame> {
		self.frames.iter().find(|frame| frame.in_app)
	}
}

/// One resolved stack frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
	pub function: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub module: Option<String>,
	pub in_app: bool,
}

/// Captures the current call stack.
pub fn capture() -> Stacktrace {
	parse(&Backtrace::force_capture())
}

/// Parses the rendered form of a [`Backtrace`] into frames.
pub fn parse(backtrace: &Backtrace) -> Stacktrace {
	let rendered = backtrace.to_string();
	let frames = rendered.lines().filter_map(frame_from_line).collect();
	Stacktrace { frames }
}

fn frame_from_line(line: &str) -> Option<Frame> {
	let line = line.trim();
	// Location lines ("at src/foo.rs:10:5") annotate the previous frame.
	if line.is_empty() || line.starts_with("at ") {
		return None;
	}

	// Frame lines look like "3: some::mangled::symbol".
	let symbol = match line.split_once(':') {
		Some((index, rest)) if index.trim().parse::<u32>().is_ok() => rest.trim(),
		_ => line,
	};
	if symbol.is_empty() {
		return None;
	}

	// The alternate form strips the trailing hash suffix.
	let function = format!("{:#}", demangle(symbol));
	let module = function.rfind("::").map(|idx| function[..idx].to_owned());
	let in_app = is_application_frame(&function);

	Some(Frame {
		function,
		module,
		in_app,
	})
}

/// Frames from the standard library and async runtime are noise for the
/// purpose of locating a culprit.
fn is_application_frame(function: &str) -> bool {
	const RUNTIME_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"tokio::",
		"futures::",
		"backtrace::",
		"<std::",
		"<core::",
		"<alloc::",
		"<tokio::",
		"<futures::",
		"rust_begin_unwind",
		"__rust_",
	];
	const RUNTIME_MARKERS: &[&str] = &["::panicking::", "::panic::", "::rt::", "::runtime::"];

	!RUNTIME_PREFIXES.iter().any(|p| function.starts_with(p))
		&& !RUNTIME_MARKERS.iter().any(|m| function.contains(m))
}
