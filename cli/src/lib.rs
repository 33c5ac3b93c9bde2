// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! linkboards CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Wires configuration, store and services for one command
//!   invocation and renders results as JSON

pub mod commands;
pub mod embedded;
pub mod output;
