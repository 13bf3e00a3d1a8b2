// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the corvid fault capture SDK.
//!
//! This crate provides the leaf types shared by the client SDK and by
//! custom transports: the parsed connection descriptor, the enriched
//! event record, the fault representation, context maps with their merge
//! rules, body fragment constructors, origin trace capture, and the
//! authentication header signer.
//!
//! Everything here is deterministic and free of I/O; the asynchronous
//! machinery lives in the `corvid` crate.

pub mod auth;
pub mod body;
pub mod context;
pub mod dsn;
pub mod event;
pub mod fault;
pub mod modules;
pub mod trace;

pub use context::Context;
pub use dsn::Dsn;
pub use event::{Event, EventId, Ident};
pub use fault::Fault;
pub use modules::{default_inventory, ModuleInfo};
pub use trace::{Frame, Stacktrace};
