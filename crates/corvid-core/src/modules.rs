// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Module inventory shipped with every event.

use serde::{Deserialize, Serialize};

/// One entry in an event's module inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
	pub name: String,
	pub version: String,
}

impl ModuleInfo {
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
		}
	}
}

/// The built-in inventory provider: the SDK itself plus the build
/// target. Clients accept a replacement provider through their options.
pub fn default_inventory() -> Vec<ModuleInfo> {
	vec![
		ModuleInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
		ModuleInfo::new(
			"target",
			format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
		),
	]
}
