// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sled Board Store
//!
//! Layout:
//!
//! | Tree | Key | Value |
//! |------|-----|-------|
//! | `boards` | board id | JSON `{version, aggregate}` |
//! | `member_index` | user id `\0` board id | board id |
//! | `invite_index` | target user id `\0` board id | board id |
//! | `links` | board id `\0` link id | JSON link |
//!
//! Every write reads the current document, checks the token, and rewrites
//! the document and both indexes inside one multi-tree transaction. Versions
//! come from `Db::generate_id`, which is monotonic across restarts.
//!
//! Links share the database through [`SledBoardStore::link_store`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionResult, TransactionalTree,
};
use sled::Transactional;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::aggregate::BoardAggregate;
use crate::domain::board::{Board, BoardId};
use crate::domain::link::{Link, LinkId};
use crate::domain::repository::{
    check_write_preconditions, AggregateDelta, BoardAggregateStore, ConcurrencyToken,
    InviteForUser, LinkStore, QueryParams, RepositoryError,
};
use crate::domain::user::UserId;

const BOARDS_TREE: &str = "boards";
const MEMBER_INDEX_TREE: &str = "member_index";
const INVITE_INDEX_TREE: &str = "invite_index";
const LINKS_TREE: &str = "links";

#[derive(Debug, Serialize, Deserialize)]
struct StoredAggregate {
    version: u64,
    aggregate: BoardAggregate,
}

pub struct SledBoardStore {
    db: sled::Db,
    boards: sled::Tree,
    member_index: sled::Tree,
    invite_index: sled::Tree,
}

impl SledBoardStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        info!("Opened sled board store at {:?}", path);
        Self::from_db(db)
    }

    /// A store backed by a temporary directory removed on drop.
    pub fn temporary() -> Result<Self, RepositoryError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, RepositoryError> {
        Ok(Self {
            boards: db.open_tree(BOARDS_TREE)?,
            member_index: db.open_tree(MEMBER_INDEX_TREE)?,
            invite_index: db.open_tree(INVITE_INDEX_TREE)?,
            db,
        })
    }

    /// Link store over the same database.
    pub fn link_store(&self) -> Result<SledLinkStore, RepositoryError> {
        Ok(SledLinkStore {
            links: self.db.open_tree(LINKS_TREE)?,
            db: self.db.clone(),
        })
    }

    fn load(&self, board_id: &BoardId) -> Result<Option<StoredAggregate>, RepositoryError> {
        match self.boards.get(board_id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Board ids listed under `user_id` in `index`.
    fn indexed_boards(&self, index: &sled::Tree, user_id: &UserId) -> Result<Vec<BoardId>, RepositoryError> {
        index
            .scan_prefix(user_prefix(user_id))
            .values()
            .map(|value| -> Result<BoardId, RepositoryError> {
                let value = value?;
                let id = std::str::from_utf8(&value)
                    .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
                Ok(BoardId::from(id))
            })
            .collect()
    }
}

fn decode(bytes: &[u8]) -> Result<StoredAggregate, RepositoryError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn user_prefix(user_id: &UserId) -> Vec<u8> {
    let mut prefix = user_id.as_str().as_bytes().to_vec();
    prefix.push(0);
    prefix
}

fn index_key(user_id: &UserId, board_id: &BoardId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(board_id.as_str().as_bytes());
    key
}

fn abort<T>(err: RepositoryError) -> ConflictableTransactionResult<T, RepositoryError> {
    Err(ConflictableTransactionError::Abort(err))
}

/// Bring both index trees in line with the transition `previous` → `next`.
/// `next = None` removes the aggregate.
fn reindex(
    members: &TransactionalTree,
    invites: &TransactionalTree,
    board_id: &BoardId,
    previous: Option<&BoardAggregate>,
    next: Option<&BoardAggregate>,
) -> ConflictableTransactionResult<(), RepositoryError> {
    if let Some(prev) = previous {
        for user_id in prev.members.keys() {
            if !next.is_some_and(|n| n.contains_member(user_id)) {
                members.remove(index_key(user_id, board_id))?;
            }
        }
        for target in prev.invites.values().filter_map(|i| i.target_id()) {
            if !next.is_some_and(|n| n.invite_for_user(target).is_some()) {
                invites.remove(index_key(target, board_id))?;
            }
        }
    }

    if let Some(next) = next {
        let value = board_id.as_str().as_bytes().to_vec();
        for user_id in next.members.keys() {
            members.insert(index_key(user_id, board_id), value.clone())?;
        }
        for target in next.invites.values().filter_map(|i| i.target_id()) {
            invites.insert(index_key(target, board_id), value.clone())?;
        }
    }
    Ok(())
}

fn unwrap_transaction<T>(result: TransactionResult<T, RepositoryError>) -> Result<T, RepositoryError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(err.into()),
    }
}

#[async_trait]
impl BoardAggregateStore for SledBoardStore {
    async fn read_aggregate(
        &self,
        board_id: &BoardId,
    ) -> Result<(BoardAggregate, ConcurrencyToken), RepositoryError> {
        let stored = self
            .load(board_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("board {board_id}")))?;
        Ok((
            stored.aggregate,
            ConcurrencyToken::new(board_id.clone(), stored.version),
        ))
    }

    async fn write_aggregate(
        &self,
        board_id: &BoardId,
        token: Option<&ConcurrencyToken>,
        delta: AggregateDelta,
    ) -> Result<ConcurrencyToken, RepositoryError> {
        let version = self.db.generate_id()?;
        let key = board_id.as_str().as_bytes().to_vec();

        let result: TransactionResult<(), RepositoryError> =
            (&self.boards, &self.member_index, &self.invite_index).transaction(
                |(boards, members, invites)| {
                    let current = match boards.get(&key)? {
                        Some(bytes) => match decode(&bytes) {
                            Ok(stored) => Some(stored),
                            Err(e) => return abort(e),
                        },
                        None => None,
                    };

                    let check = check_write_preconditions(
                        board_id,
                        current.as_ref().map(|s| (&s.aggregate, s.version)),
                        token,
                        &delta,
                    );
                    if let Err(e) = check {
                        return abort(e);
                    }

                    let previous = current.map(|s| s.aggregate);
                    let mut next = match (&previous, &delta.board) {
                        (Some(aggregate), _) => aggregate.clone(),
                        (None, Some(board)) => BoardAggregate::from_board(board.clone()),
                        (None, None) => {
                            return abort(RepositoryError::InvalidArgument(
                                "creating a board requires the board record".to_string(),
                            ))
                        }
                    };
                    next.apply(&delta);

                    reindex(members, invites, board_id, previous.as_ref(), Some(&next))?;

                    let document = match serde_json::to_vec(&StoredAggregate { version, aggregate: next }) {
                        Ok(document) => document,
                        Err(e) => return abort(e.into()),
                    };
                    boards.insert(key.clone(), document)?;
                    Ok(())
                },
            );
        unwrap_transaction(result)?;

        debug!(board_id = %board_id, version, "Aggregate written");
        Ok(ConcurrencyToken::new(board_id.clone(), version))
    }

    async fn delete_aggregate(&self, board_id: &BoardId) -> Result<(), RepositoryError> {
        let key = board_id.as_str().as_bytes().to_vec();

        let result: TransactionResult<bool, RepositoryError> =
            (&self.boards, &self.member_index, &self.invite_index).transaction(
                |(boards, members, invites)| {
                    let Some(bytes) = boards.remove(key.clone())? else {
                        return Ok(false);
                    };
                    let stored = match decode(&bytes) {
                        Ok(stored) => stored,
                        Err(e) => return abort(e),
                    };
                    reindex(members, invites, board_id, Some(&stored.aggregate), None)?;
                    Ok(true)
                },
            );

        if unwrap_transaction(result)? {
            debug!(board_id = %board_id, "Aggregate deleted");
        }
        Ok(())
    }

    async fn query_boards_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<Board>, RepositoryError> {
        let mut entries = Vec::new();
        for board_id in self.indexed_boards(&self.member_index, user_id)? {
            let Some(stored) = self.load(&board_id)? else {
                continue;
            };
            if let Some(member) = stored.aggregate.member(user_id) {
                entries.push((member.created_time, stored.aggregate.board.clone()));
            }
        }
        Ok(params.paginate(entries))
    }

    async fn query_invites_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, RepositoryError> {
        let mut entries = Vec::new();
        for board_id in self.indexed_boards(&self.invite_index, user_id)? {
            let Some(stored) = self.load(&board_id)? else {
                continue;
            };
            if let Some(invite) = stored.aggregate.invite_for_user(user_id) {
                entries.push((
                    invite.created_time,
                    InviteForUser {
                        board_id,
                        invite: invite.clone(),
                    },
                ));
            }
        }
        Ok(params.paginate(entries))
    }

    async fn flush(&self) -> Result<(), RepositoryError> {
        self.db.flush_async().await?;
        Ok(())
    }
}

// ============================================================================
// Links
// ============================================================================

pub struct SledLinkStore {
    db: sled::Db,
    links: sled::Tree,
}

fn board_prefix(board_id: &BoardId) -> Vec<u8> {
    let mut prefix = board_id.as_str().as_bytes().to_vec();
    prefix.push(0);
    prefix
}

fn link_key(board_id: &BoardId, link_id: &LinkId) -> Vec<u8> {
    let mut key = board_prefix(board_id);
    key.extend_from_slice(link_id.as_str().as_bytes());
    key
}

#[async_trait]
impl LinkStore for SledLinkStore {
    async fn insert_link(&self, link: &Link) -> Result<(), RepositoryError> {
        let value = serde_json::to_vec(link)?;
        let key = link_key(&link.board_id, &link.link_id);
        if self
            .links
            .compare_and_swap(key, None::<&[u8]>, Some(value))?
            .is_err()
        {
            return Err(RepositoryError::Conflict(format!(
                "link {} already exists",
                link.link_id
            )));
        }
        debug!(board_id = %link.board_id, link_id = %link.link_id, "Link stored");
        Ok(())
    }

    async fn read_link(
        &self,
        board_id: &BoardId,
        link_id: &LinkId,
    ) -> Result<Link, RepositoryError> {
        let bytes = self
            .links
            .get(link_key(board_id, link_id))?
            .ok_or_else(|| RepositoryError::NotFound(format!("link {link_id}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn delete_link(
        &self,
        board_id: &BoardId,
        link_id: &LinkId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.links.remove(link_key(board_id, link_id))?.is_some())
    }

    async fn query_links(
        &self,
        board_id: &BoardId,
        params: &QueryParams,
    ) -> Result<Vec<Link>, RepositoryError> {
        let mut entries = Vec::new();
        for value in self.links.scan_prefix(board_prefix(board_id)).values() {
            let link: Link = serde_json::from_slice(&value?)?;
            entries.push((link.created_time, link));
        }
        Ok(params.paginate(entries))
    }

    async fn delete_links_for_board(&self, board_id: &BoardId) -> Result<usize, RepositoryError> {
        let mut batch = sled::Batch::default();
        let mut removed = 0;
        for key in self.links.scan_prefix(board_prefix(board_id)).keys() {
            batch.remove(key?);
            removed += 1;
        }
        self.links.apply_batch(batch)?;
        if removed > 0 {
            debug!(board_id = %board_id, removed, "Board links deleted");
        }
        Ok(removed)
    }

    async fn flush(&self) -> Result<(), RepositoryError> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::BoardMember;
    use crate::domain::user::User;
    use chrono::Utc;

    fn create_delta() -> (BoardId, AggregateDelta) {
        let alice = User::new("u-alice", "Alice");
        let now = Utc::now();
        let board = Board::new("persistent", "", alice.clone(), now).unwrap();
        let id = board.board_id.clone();
        (id, AggregateDelta::new().with_board(board).upsert_member(BoardMember::owner(alice, now)))
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        let (board_id, delta) = create_delta();

        let first_token = {
            let store = SledBoardStore::open(&path).unwrap();
            let token = store.write_aggregate(&board_id, None, delta).await.unwrap();
            store.flush().await.unwrap();
            token
        };

        let store = SledBoardStore::open(&path).unwrap();
        let (aggregate, token) = store.read_aggregate(&board_id).await.unwrap();
        assert_eq!(aggregate.board.name, "persistent");
        assert_eq!(token, first_token);

        let boards = store
            .query_boards_for_user(&UserId::from("u-alice"), &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(boards.len(), 1);
    }

    #[tokio::test]
    async fn test_versions_keep_increasing_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        let (board_id, delta) = create_delta();

        let before = {
            let store = SledBoardStore::open(&path).unwrap();
            let token = store.write_aggregate(&board_id, None, delta.clone()).await.unwrap();
            store.delete_aggregate(&board_id).await.unwrap();
            store.flush().await.unwrap();
            token
        };

        let store = SledBoardStore::open(&path).unwrap();
        let after = store.write_aggregate(&board_id, None, delta).await.unwrap();
        assert_ne!(before, after);
        assert!(after.version() > before.version());
    }

    #[tokio::test]
    async fn test_delete_clears_indexes() {
        let store = SledBoardStore::temporary().unwrap();
        let (board_id, delta) = create_delta();
        store.write_aggregate(&board_id, None, delta).await.unwrap();
        store.delete_aggregate(&board_id).await.unwrap();

        assert!(store.member_index.is_empty());
        assert!(store.boards.is_empty());
    }

    #[tokio::test]
    async fn test_links_survive_reopen_and_share_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");
        let board_id = BoardId::from("b-1");
        let alice = User::new("u-alice", "Alice");
        let link = Link::new(board_id.clone(), "docs", "https://docs.rs", alice, Utc::now()).unwrap();

        {
            let store = SledBoardStore::open(&path).unwrap();
            let links = store.link_store().unwrap();
            links.insert_link(&link).await.unwrap();
            links.flush().await.unwrap();
        }

        let store = SledBoardStore::open(&path).unwrap();
        let links = store.link_store().unwrap();
        assert_eq!(links.read_link(&board_id, &link.link_id).await.unwrap(), link);
        assert_eq!(links.delete_links_for_board(&board_id).await.unwrap(), 1);
        assert!(links.links.is_empty());
    }
}
