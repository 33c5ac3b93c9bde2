// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the [`BoardAggregateStore`] and
//! [`LinkStore`] contracts.
//!
//! - **InMemoryBoardStore** - `RwLock`-guarded map of aggregates with a
//!   version per aggregate. Reference implementation for tests and development.
//! - **SledBoardStore** - Embedded persistent store; one JSON document per
//!   aggregate plus per-user index trees, written in one sled transaction.
//! - **InMemoryLinkStore** / **SledLinkStore** - links grouped by board.
//!
//! Both backends validate writes with
//! [`check_write_preconditions`](crate::domain::repository::check_write_preconditions)
//! and draw versions from a store-wide monotonic sequence.

pub mod sled_store;

pub use sled_store::{SledBoardStore, SledLinkStore};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::domain::aggregate::BoardAggregate;
use crate::domain::board::{Board, BoardId};
use crate::domain::link::{Link, LinkId};
use crate::domain::repository::{
    check_write_preconditions, AggregateDelta, BoardAggregateStore, ConcurrencyToken,
    InviteForUser, LinkStore, QueryParams, RepositoryError,
};
use crate::domain::user::UserId;

struct VersionedAggregate {
    aggregate: BoardAggregate,
    version: u64,
}

#[derive(Clone, Default)]
pub struct InMemoryBoardStore {
    boards: Arc<RwLock<HashMap<BoardId, VersionedAggregate>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn len(&self) -> usize {
        self.boards.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.read().is_empty()
    }
}

#[async_trait]
impl BoardAggregateStore for InMemoryBoardStore {
    async fn read_aggregate(
        &self,
        board_id: &BoardId,
    ) -> Result<(BoardAggregate, ConcurrencyToken), RepositoryError> {
        let boards = self.boards.read();
        let stored = boards
            .get(board_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("board {board_id}")))?;
        Ok((
            stored.aggregate.clone(),
            ConcurrencyToken::new(board_id.clone(), stored.version),
        ))
    }

    async fn write_aggregate(
        &self,
        board_id: &BoardId,
        token: Option<&ConcurrencyToken>,
        delta: AggregateDelta,
    ) -> Result<ConcurrencyToken, RepositoryError> {
        let mut boards = self.boards.write();
        let current = boards.get(board_id).map(|s| (&s.aggregate, s.version));
        check_write_preconditions(board_id, current, token, &delta)?;

        let version = self.next_version();
        match boards.get_mut(board_id) {
            Some(stored) => {
                stored.aggregate.apply(&delta);
                stored.version = version;
            }
            None => {
                let board = delta.board.clone().ok_or_else(|| {
                    RepositoryError::InvalidArgument("creating a board requires the board record".to_string())
                })?;
                let mut aggregate = BoardAggregate::from_board(board);
                aggregate.apply(&delta);
                boards.insert(board_id.clone(), VersionedAggregate { aggregate, version });
            }
        }

        debug!(board_id = %board_id, version, "Aggregate written");
        Ok(ConcurrencyToken::new(board_id.clone(), version))
    }

    async fn delete_aggregate(&self, board_id: &BoardId) -> Result<(), RepositoryError> {
        if self.boards.write().remove(board_id).is_some() {
            debug!(board_id = %board_id, "Aggregate deleted");
        }
        Ok(())
    }

    async fn query_boards_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<Board>, RepositoryError> {
        let boards = self.boards.read();
        let entries = boards
            .values()
            .filter_map(|stored| {
                stored
                    .aggregate
                    .member(user_id)
                    .map(|m| (m.created_time, stored.aggregate.board.clone()))
            })
            .collect();
        Ok(params.paginate(entries))
    }

    async fn query_invites_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, RepositoryError> {
        let boards = self.boards.read();
        let entries = boards
            .values()
            .filter_map(|stored| {
                stored.aggregate.invite_for_user(user_id).map(|invite| {
                    (
                        invite.created_time,
                        InviteForUser {
                            board_id: stored.aggregate.board_id().clone(),
                            invite: invite.clone(),
                        },
                    )
                })
            })
            .collect();
        Ok(params.paginate(entries))
    }
}

// ============================================================================
// Links
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryLinkStore {
    links: Arc<RwLock<HashMap<BoardId, HashMap<LinkId, Link>>>>,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn insert_link(&self, link: &Link) -> Result<(), RepositoryError> {
        let mut links = self.links.write();
        let board = links.entry(link.board_id.clone()).or_default();
        if board.contains_key(&link.link_id) {
            return Err(RepositoryError::Conflict(format!(
                "link {} already exists",
                link.link_id
            )));
        }
        board.insert(link.link_id.clone(), link.clone());
        debug!(board_id = %link.board_id, link_id = %link.link_id, "Link stored");
        Ok(())
    }

    async fn read_link(
        &self,
        board_id: &BoardId,
        link_id: &LinkId,
    ) -> Result<Link, RepositoryError> {
        self.links
            .read()
            .get(board_id)
            .and_then(|board| board.get(link_id))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("link {link_id}")))
    }

    async fn delete_link(
        &self,
        board_id: &BoardId,
        link_id: &LinkId,
    ) -> Result<bool, RepositoryError> {
        let mut links = self.links.write();
        let Some(board) = links.get_mut(board_id) else {
            return Ok(false);
        };
        let removed = board.remove(link_id).is_some();
        if board.is_empty() {
            links.remove(board_id);
        }
        Ok(removed)
    }

    async fn query_links(
        &self,
        board_id: &BoardId,
        params: &QueryParams,
    ) -> Result<Vec<Link>, RepositoryError> {
        let links = self.links.read();
        let entries = links
            .get(board_id)
            .map(|board| {
                board
                    .values()
                    .map(|link| (link.created_time, link.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(params.paginate(entries))
    }

    async fn delete_links_for_board(&self, board_id: &BoardId) -> Result<usize, RepositoryError> {
        let removed = self
            .links
            .write()
            .remove(board_id)
            .map(|board| board.len())
            .unwrap_or(0);
        if removed > 0 {
            debug!(board_id = %board_id, removed, "Board links deleted");
        }
        Ok(removed)
    }
}
