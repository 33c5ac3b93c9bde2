// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `linkboards-core` - Boards, Membership, Invitations and Links
//!
//! Shared boards owned by their creator, joined through time-limited
//! invitations, collecting links posted by members, with every mutation
//! gated by role-derived scopes.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Board`, `BoardMember`, `BoardInvite`, `BoardAggregate`, `Link`, store contracts, events |
//! | [`application`] | Application | `BoardService`, `LinkService`, `AuthorizationEngine`, access services, link cascade |
//! | [`infrastructure`] | Infrastructure | In-memory and sled stores, broadcast event bus |
//!
//! The consistency unit is a single board aggregate (board + members +
//! invites). Writes are check-and-set against the concurrency token returned
//! by the preceding read; there is no in-process locking above the store.
//! Links are stored apart from the aggregate and follow a board's deletion
//! through its `BoardDeleted` event.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
