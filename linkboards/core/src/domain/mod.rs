// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Board Domain Layer
//!
//! Pure domain types. The only I/O seams are the [`repository::BoardAggregateStore`]
//! and [`repository::LinkStore`] traits, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`user`] | `User`, `UserId` |
//! | [`role`] | `BoardRole`, `Scope`, `ScopeSet`, `RoleScopeTable` |
//! | [`board`] | `Board`, `BoardId`, `BoardEdit` |
//! | [`member`] | `BoardMember`, `BoardMemberEdit` |
//! | [`invite`] | `BoardInvite`, `InviteId`, `InviteState`, `InviteTransition` |
//! | [`aggregate`] | `BoardAggregate`, `BoardLimits` |
//! | [`link`] | `Link`, `LinkId` |
//! | [`repository`] | `BoardAggregateStore`, `LinkStore`, `AggregateDelta`, `ConcurrencyToken`, `QueryParams` |
//! | [`events`] | `BoardEvent`, `EventPublisher`, `NoopEventPublisher` |
//! | [`errors`] | `BoardError`, `ErrorKind`, `ErrorCode`, `PublicError` |
//! | [`clock`] | `Clock`, `SystemClock`, `ManualClock` |
//! | [`config`] | `LinkboardsConfig` |

pub mod user;
pub mod role;
pub mod board;
pub mod member;
pub mod invite;
pub mod aggregate;
pub mod link;
pub mod repository;
pub mod events;
pub mod errors;
pub mod clock;
pub mod config;
