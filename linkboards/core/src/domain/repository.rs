// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Board Aggregate Store Contract
//!
//! Optimistic-concurrency persistence of a [`BoardAggregate`] as one unit.
//! The interface is defined here and implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Implementation | Backend |
//! |----------------|---------|
//! | `InMemoryBoardStore` | `parking_lot::RwLock` over a version map |
//! | `SledBoardStore` | sled trees, multi-tree transactions |
//!
//! ## Concurrency Tokens
//!
//! Every read returns a [`ConcurrencyToken`]. A write presenting that token
//! succeeds only if the aggregate has not been written (or deleted) since;
//! otherwise it fails with [`RepositoryError::Conflict`]. Versions come from a
//! store-wide monotonic sequence, so a token issued before a delete never
//! matches a re-created aggregate. A write without a token creates the
//! aggregate and fails if it already exists.
//!
//! ## Links
//!
//! Links are kept by a separate [`LinkStore`], keyed by board. They carry no
//! tokens: a link is written once and only ever removed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::aggregate::BoardAggregate;
use crate::domain::board::{Board, BoardId};
use crate::domain::invite::{BoardInvite, InviteId};
use crate::domain::link::{Link, LinkId};
use crate::domain::member::BoardMember;
use crate::domain::user::UserId;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    Sled(SledConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SledConfig {
    pub path: PathBuf,
}

/// Opaque check-and-set marker issued by [`BoardAggregateStore::read_aggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConcurrencyToken {
    board_id: BoardId,
    version: u64,
}

impl ConcurrencyToken {
    pub fn new(board_id: BoardId, version: u64) -> Self {
        Self { board_id, version }
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Changes to apply to one aggregate in a single all-or-nothing write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateDelta {
    pub board: Option<Board>,
    pub upsert_members: Vec<BoardMember>,
    pub remove_members: Vec<UserId>,
    pub upsert_invites: Vec<BoardInvite>,
    pub remove_invites: Vec<InviteId>,
}

impl AggregateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(mut self, board: Board) -> Self {
        self.board = Some(board);
        self
    }

    pub fn upsert_member(mut self, member: BoardMember) -> Self {
        self.upsert_members.push(member);
        self
    }

    pub fn remove_member(mut self, user_id: UserId) -> Self {
        self.remove_members.push(user_id);
        self
    }

    pub fn upsert_invite(mut self, invite: BoardInvite) -> Self {
        self.upsert_invites.push(invite);
        self
    }

    pub fn remove_invite(mut self, invite_id: InviteId) -> Self {
        self.remove_invites.push(invite_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_none()
            && self.upsert_members.is_empty()
            && self.remove_members.is_empty()
            && self.upsert_invites.is_empty()
            && self.remove_invites.is_empty()
    }
}

/// Pagination over per-user listings, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub limit: Option<usize>,
    /// Exclusive upper bound on the creation time of returned entries.
    #[serde(default)]
    pub cursor: Option<DateTime<Utc>>,
}

impl QueryParams {
    pub fn new(limit: Option<usize>, cursor: Option<DateTime<Utc>>) -> Self {
        Self { limit, cursor }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: DateTime<Utc>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Cursor given as Unix time in nanoseconds.
    pub fn with_cursor_nanos(self, nanos: i64) -> Self {
        self.with_cursor(DateTime::from_timestamp_nanos(nanos))
    }

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    /// Sort `entries` newest first, drop everything at or after the cursor
    /// and truncate to the effective limit.
    pub fn paginate<T>(&self, mut entries: Vec<(DateTime<Utc>, T)>) -> Vec<T> {
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries
            .into_iter()
            .filter(|(created, _)| self.cursor.is_none_or(|cursor| *created < cursor))
            .take(self.effective_limit())
            .map(|(_, item)| item)
            .collect()
    }
}

/// An invite targeted at the querying user, with the board it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteForUser {
    pub board_id: BoardId,
    pub invite: BoardInvite,
}

#[async_trait]
pub trait BoardAggregateStore: Send + Sync {
    /// Load the aggregate and a token for the next write.
    async fn read_aggregate(
        &self,
        board_id: &BoardId,
    ) -> Result<(BoardAggregate, ConcurrencyToken), RepositoryError>;

    /// Apply `delta` if `token` is still current, or create the aggregate
    /// when `token` is `None`. Returns the token for the new state.
    async fn write_aggregate(
        &self,
        board_id: &BoardId,
        token: Option<&ConcurrencyToken>,
        delta: AggregateDelta,
    ) -> Result<ConcurrencyToken, RepositoryError>;

    /// Remove the board with all its members and invites. Idempotent.
    async fn delete_aggregate(&self, board_id: &BoardId) -> Result<(), RepositoryError>;

    /// Boards `user_id` is a member of, newest membership first.
    async fn query_boards_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<Board>, RepositoryError>;

    /// Invites targeted at `user_id`, newest first. At most one per board.
    async fn query_invites_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, RepositoryError>;

    /// Persist buffered writes. A no-op for backends without buffering.
    async fn flush(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Store a new link. Fails with `Conflict` if the id is taken.
    async fn insert_link(&self, link: &Link) -> Result<(), RepositoryError>;

    async fn read_link(&self, board_id: &BoardId, link_id: &LinkId)
        -> Result<Link, RepositoryError>;

    /// Returns whether a link was removed.
    async fn delete_link(&self, board_id: &BoardId, link_id: &LinkId)
        -> Result<bool, RepositoryError>;

    /// Links on `board_id`, newest first.
    async fn query_links(
        &self,
        board_id: &BoardId,
        params: &QueryParams,
    ) -> Result<Vec<Link>, RepositoryError>;

    /// Remove every link on `board_id`, returning how many were removed.
    async fn delete_links_for_board(&self, board_id: &BoardId) -> Result<usize, RepositoryError>;

    async fn flush(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Validate a write against the stored version, shared by all backends.
///
/// `current` is the stored aggregate and its version, if present.
pub fn check_write_preconditions(
    board_id: &BoardId,
    current: Option<(&BoardAggregate, u64)>,
    token: Option<&ConcurrencyToken>,
    delta: &AggregateDelta,
) -> Result<(), RepositoryError> {
    if delta.is_empty() {
        return Err(RepositoryError::InvalidArgument("empty update".to_string()));
    }
    if let Some(board) = &delta.board {
        if &board.board_id != board_id {
            return Err(RepositoryError::InvalidArgument(format!(
                "board record {} does not match aggregate {}",
                board.board_id, board_id
            )));
        }
    }

    match (token, current) {
        (None, Some(_)) => Err(RepositoryError::Conflict(format!(
            "board {board_id} already exists"
        ))),
        (None, None) if delta.board.is_none() => Err(RepositoryError::InvalidArgument(
            "creating a board requires the board record".to_string(),
        )),
        (None, None) => Ok(()),
        (Some(_), None) => Err(RepositoryError::Conflict(format!(
            "board {board_id} no longer exists"
        ))),
        (Some(token), Some((_, version))) => {
            if token.board_id() != board_id || token.version() != version {
                return Err(RepositoryError::Conflict(format!(
                    "stale token for board {board_id}"
                )));
            }
            Ok(())
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for RepositoryError {
    fn from(err: sled::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::User;
    use chrono::Duration;

    fn board() -> Board {
        Board::new("b", "", User::new("u-alice", "Alice"), Utc::now()).unwrap()
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(QueryParams::default().effective_limit(), 20);
        assert_eq!(QueryParams::default().with_limit(0).effective_limit(), 1);
        assert_eq!(QueryParams::default().with_limit(500).effective_limit(), 100);
        assert_eq!(QueryParams::default().with_limit(7).effective_limit(), 7);
    }

    #[test]
    fn test_paginate_newest_first_with_exclusive_cursor() {
        let t0 = Utc::now();
        let entries: Vec<_> = (0..5).map(|i| (t0 + Duration::seconds(i), i)).collect();

        assert_eq!(QueryParams::default().paginate(entries.clone()), vec![4, 3, 2, 1, 0]);

        let page = QueryParams::default()
            .with_limit(2)
            .with_cursor(t0 + Duration::seconds(3))
            .paginate(entries);
        assert_eq!(page, vec![2, 1]);
    }

    #[test]
    fn test_cursor_nanos() {
        let params = QueryParams::default().with_cursor_nanos(1_700_000_000_000_000_000);
        assert_eq!(params.cursor.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_empty_delta_rejected() {
        let id = BoardId::from("b-1");
        assert!(matches!(
            check_write_preconditions(&id, None, None, &AggregateDelta::new()),
            Err(RepositoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_preconditions() {
        let b = board();
        let id = b.board_id.clone();
        let delta = AggregateDelta::new().with_board(b.clone());
        assert!(check_write_preconditions(&id, None, None, &delta).is_ok());

        let member_only = AggregateDelta::new().remove_member(UserId::from("u-x"));
        assert!(matches!(
            check_write_preconditions(&id, None, None, &member_only),
            Err(RepositoryError::InvalidArgument(_))
        ));

        let other = BoardId::from("b-other");
        assert!(matches!(
            check_write_preconditions(&other, None, None, &delta),
            Err(RepositoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_token_preconditions() {
        let b = board();
        let id = b.board_id.clone();
        let agg = BoardAggregate::new(
            b.clone(),
            BoardMember::owner(b.created_by.clone(), b.created_time),
        );
        let delta = AggregateDelta::new().with_board(b);

        assert!(matches!(
            check_write_preconditions(&id, Some((&agg, 3)), None, &delta),
            Err(RepositoryError::Conflict(_))
        ));
        let current = ConcurrencyToken::new(id.clone(), 3);
        assert!(check_write_preconditions(&id, Some((&agg, 3)), Some(&current), &delta).is_ok());

        let stale = ConcurrencyToken::new(id.clone(), 2);
        assert!(matches!(
            check_write_preconditions(&id, Some((&agg, 3)), Some(&stale), &delta),
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            check_write_preconditions(&id, None, Some(&current), &delta),
            Err(RepositoryError::Conflict(_))
        ));
    }
}
