// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Board Domain Service
//!
//! Enforces the board, membership and invite rules on top of a
//! [`BoardAggregateStore`]. No operation here performs authorization; callers
//! go through `BoardAccessService` for that.
//!
//! Every mutation follows the same shape:
//! 1. structural validation of the inputs (no store access)
//! 2. read the aggregate and its concurrency token
//! 3. re-validate against the current aggregate state
//! 4. write the delta with the token
//!
//! A lost race surfaces as `ConcurrentModification` and is never retried here.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::metrics::record_conflict;
use crate::domain::aggregate::{BoardAggregate, BoardLimits};
use crate::domain::board::{Board, BoardEdit, BoardId};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::errors::BoardError;
use crate::domain::events::{BoardEvent, EventPublisher, NoopEventPublisher};
use crate::domain::invite::{BoardInvite, InviteId, InviteTransition};
use crate::domain::member::{BoardMember, BoardMemberEdit};
use crate::domain::repository::{
    AggregateDelta, BoardAggregateStore, ConcurrencyToken, InviteForUser, QueryParams,
    RepositoryError,
};
use crate::domain::role::BoardRole;
use crate::domain::user::{User, UserId};

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait BoardService: Send + Sync {
    /// Create a board with `creator` as its owner and only member.
    async fn create_board(
        &self,
        name: &str,
        description: &str,
        creator: &User,
    ) -> Result<BoardAggregate, BoardError>;

    async fn get_board(&self, board_id: &BoardId) -> Result<BoardAggregate, BoardError>;

    async fn edit_board(
        &self,
        board_id: &BoardId,
        edit: &BoardEdit,
        editor: &User,
    ) -> Result<Board, BoardError>;

    /// Delete the board with its members and invites. Idempotent.
    async fn delete_board(&self, board_id: &BoardId, actor: &User) -> Result<(), BoardError>;

    /// Issue an invite. `target_user = None` creates an open invite anyone may accept.
    async fn create_invite(
        &self,
        board_id: &BoardId,
        role: BoardRole,
        target_user: Option<User>,
        inviter: &User,
    ) -> Result<BoardInvite, BoardError>;

    async fn delete_invite(&self, board_id: &BoardId, invite_id: &InviteId) -> Result<(), BoardError>;

    /// Consume the invite and add `accepter` as a member in one commit.
    async fn accept_invite(
        &self,
        board_id: &BoardId,
        invite_id: &InviteId,
        accepter: &User,
    ) -> Result<BoardMember, BoardError>;

    async fn decline_invite(
        &self,
        board_id: &BoardId,
        invite_id: &InviteId,
        decliner: &User,
    ) -> Result<(), BoardError>;

    async fn remove_user(&self, board_id: &BoardId, user_id: &UserId) -> Result<(), BoardError>;

    async fn edit_board_user(
        &self,
        board_id: &BoardId,
        user_id: &UserId,
        edit: &BoardMemberEdit,
        actor: &User,
    ) -> Result<BoardMember, BoardError>;

    async fn boards_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<Board>, BoardError>;

    async fn invites_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, BoardError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardBoardService {
    store: Arc<dyn BoardAggregateStore>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    limits: BoardLimits,
}

impl StandardBoardService {
    pub fn new(store: Arc<dyn BoardAggregateStore>) -> Self {
        Self {
            store,
            event_publisher: Arc::new(NoopEventPublisher),
            clock: Arc::new(SystemClock),
            limits: BoardLimits::default(),
        }
    }

    pub fn with_event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = publisher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_limits(mut self, limits: BoardLimits) -> Self {
        self.limits = limits;
        self
    }

    async fn load(
        &self,
        operation: &'static str,
        board_id: &BoardId,
    ) -> Result<(BoardAggregate, ConcurrencyToken), BoardError> {
        self.store
            .read_aggregate(board_id)
            .await
            .map_err(|e| map_store_error(operation, board_id, e))
    }

    async fn commit(
        &self,
        operation: &'static str,
        board_id: &BoardId,
        token: Option<&ConcurrencyToken>,
        delta: AggregateDelta,
    ) -> Result<ConcurrencyToken, BoardError> {
        self.store
            .write_aggregate(board_id, token, delta)
            .await
            .map_err(|e| map_store_error(operation, board_id, e))
    }

    fn publish(&self, event: BoardEvent) {
        debug!(event = event.name(), board_id = %event.board_id(), "Publishing board event");
        self.event_publisher.publish(event);
    }
}

fn map_store_error(operation: &'static str, board_id: &BoardId, err: RepositoryError) -> BoardError {
    match err {
        RepositoryError::NotFound(_) => BoardError::BoardNotFound(board_id.clone()),
        RepositoryError::Conflict(reason) => {
            record_conflict(operation);
            warn!(operation, board_id = %board_id, "Write rejected: {}", reason);
            BoardError::ConcurrentModification(board_id.clone())
        }
        other => {
            error!(operation, board_id = %board_id, "Store failure: {}", other);
            BoardError::Store(other)
        }
    }
}

fn map_query_error(operation: &'static str, user_id: &UserId, err: RepositoryError) -> BoardError {
    error!(operation, user_id = %user_id, "Store query failed: {}", err);
    BoardError::Store(err)
}

#[async_trait]
impl BoardService for StandardBoardService {
    async fn create_board(
        &self,
        name: &str,
        description: &str,
        creator: &User,
    ) -> Result<BoardAggregate, BoardError> {
        let now = self.clock.now();
        let board = Board::new(name, description, creator.clone(), now)?;
        let owner = BoardMember::owner(creator.clone(), now);
        let board_id = board.board_id.clone();

        let delta = AggregateDelta::new()
            .with_board(board.clone())
            .upsert_member(owner.clone());
        self.commit("create_board", &board_id, None, delta).await?;

        info!(board_id = %board_id, user_id = %creator.user_id, "Board created");
        self.publish(BoardEvent::BoardCreated {
            board_id,
            name: board.name.clone(),
            description: board.description.clone(),
            created_time: board.created_time,
            created_by: board.created_by.clone(),
        });

        Ok(BoardAggregate::new(board, owner))
    }

    async fn get_board(&self, board_id: &BoardId) -> Result<BoardAggregate, BoardError> {
        let (aggregate, _) = self.load("get_board", board_id).await?;
        Ok(aggregate)
    }

    async fn edit_board(
        &self,
        board_id: &BoardId,
        edit: &BoardEdit,
        editor: &User,
    ) -> Result<Board, BoardError> {
        if edit.is_empty() {
            return Err(BoardError::EmptyUpdate);
        }
        edit.validate()?;

        let (aggregate, token) = self.load("edit_board", board_id).await?;
        let mut board = aggregate.board;
        board.apply_edit(edit, editor.clone(), self.clock.now());
        board.validate()?;

        self.commit("edit_board", board_id, Some(&token), AggregateDelta::new().with_board(board.clone()))
            .await?;

        info!(board_id = %board_id, user_id = %editor.user_id, "Board edited");
        self.publish(BoardEvent::BoardEdited {
            board_id: board_id.clone(),
            modified_time: board.modified_time,
            modified_by: board.modified_by.clone(),
        });
        Ok(board)
    }

    async fn delete_board(&self, board_id: &BoardId, actor: &User) -> Result<(), BoardError> {
        self.store
            .delete_aggregate(board_id)
            .await
            .map_err(|e| map_store_error("delete_board", board_id, e))?;

        info!(board_id = %board_id, user_id = %actor.user_id, "Board deleted");
        self.publish(BoardEvent::BoardDeleted {
            board_id: board_id.clone(),
            deleted_by: actor.clone(),
        });
        Ok(())
    }

    async fn create_invite(
        &self,
        board_id: &BoardId,
        role: BoardRole,
        target_user: Option<User>,
        inviter: &User,
    ) -> Result<BoardInvite, BoardError> {
        let invite = BoardInvite::new(
            role,
            target_user,
            inviter.clone(),
            self.clock.now(),
            self.limits.invite_expiry,
        )?;

        let (aggregate, token) = self.load("create_invite", board_id).await?;
        aggregate.ensure_can_issue(invite.target_id(), &self.limits)?;

        self.commit(
            "create_invite",
            board_id,
            Some(&token),
            AggregateDelta::new().upsert_invite(invite.clone()),
        )
        .await?;

        info!(
            board_id = %board_id,
            invite_id = %invite.invite_id,
            role = %invite.role,
            targeted = !invite.is_open(),
            "Invite created"
        );
        self.publish(BoardEvent::InviteCreated {
            board_id: board_id.clone(),
            invite_id: invite.invite_id.clone(),
            role: invite.role,
            target_user: invite.target_id().cloned(),
            created_by: invite.created_by.clone(),
            expires_time: invite.expires_time,
        });
        Ok(invite)
    }

    async fn delete_invite(&self, board_id: &BoardId, invite_id: &InviteId) -> Result<(), BoardError> {
        let (aggregate, token) = self.load("delete_invite", board_id).await?;
        if aggregate.invite(invite_id).is_none() {
            return Err(BoardError::InviteNotFound(invite_id.clone()));
        }

        self.commit(
            "delete_invite",
            board_id,
            Some(&token),
            AggregateDelta::new().remove_invite(invite_id.clone()),
        )
        .await?;

        info!(board_id = %board_id, invite_id = %invite_id, "Invite deleted");
        self.publish(BoardEvent::InviteDeleted {
            board_id: board_id.clone(),
            invite_id: invite_id.clone(),
        });
        Ok(())
    }

    async fn accept_invite(
        &self,
        board_id: &BoardId,
        invite_id: &InviteId,
        accepter: &User,
    ) -> Result<BoardMember, BoardError> {
        accepter.ensure_identified()?;

        let (aggregate, token) = self.load("accept_invite", board_id).await?;
        let invite = aggregate
            .invite(invite_id)
            .ok_or_else(|| BoardError::InviteNotFound(invite_id.clone()))?;

        let now = self.clock.now();
        invite.check_transition(InviteTransition::Accept, &accepter.user_id, now)?;
        aggregate.ensure_can_join(&accepter.user_id, &self.limits)?;

        let member = BoardMember::joined(accepter.clone(), invite.role, invite.created_by.clone(), now);
        let delta = AggregateDelta::new()
            .remove_invite(invite_id.clone())
            .upsert_member(member.clone());
        self.commit("accept_invite", board_id, Some(&token), delta).await?;

        info!(
            board_id = %board_id,
            invite_id = %invite_id,
            user_id = %accepter.user_id,
            role = %member.role,
            "Invite accepted"
        );
        self.publish(BoardEvent::InviteAccepted {
            board_id: board_id.clone(),
            invite_id: invite_id.clone(),
            user: accepter.clone(),
            role: member.role,
        });
        Ok(member)
    }

    async fn decline_invite(
        &self,
        board_id: &BoardId,
        invite_id: &InviteId,
        decliner: &User,
    ) -> Result<(), BoardError> {
        let (aggregate, token) = self.load("decline_invite", board_id).await?;
        let invite = aggregate
            .invite(invite_id)
            .ok_or_else(|| BoardError::InviteNotFound(invite_id.clone()))?;
        invite.check_transition(InviteTransition::Decline, &decliner.user_id, self.clock.now())?;

        self.commit(
            "decline_invite",
            board_id,
            Some(&token),
            AggregateDelta::new().remove_invite(invite_id.clone()),
        )
        .await?;

        info!(board_id = %board_id, invite_id = %invite_id, user_id = %decliner.user_id, "Invite declined");
        self.publish(BoardEvent::InviteDeclined {
            board_id: board_id.clone(),
            invite_id: invite_id.clone(),
            user: decliner.clone(),
        });
        Ok(())
    }

    async fn remove_user(&self, board_id: &BoardId, user_id: &UserId) -> Result<(), BoardError> {
        let (aggregate, token) = self.load("remove_user", board_id).await?;
        let member = aggregate.member(user_id).ok_or(BoardError::UserNotOnBoard)?;
        if member.is_owner() {
            return Err(BoardError::BoardOwnerCannotBeRemoved);
        }

        self.commit(
            "remove_user",
            board_id,
            Some(&token),
            AggregateDelta::new().remove_member(user_id.clone()),
        )
        .await?;

        info!(board_id = %board_id, user_id = %user_id, "Member removed");
        self.publish(BoardEvent::MemberRemoved {
            board_id: board_id.clone(),
            user_id: user_id.clone(),
        });
        Ok(())
    }

    async fn edit_board_user(
        &self,
        board_id: &BoardId,
        user_id: &UserId,
        edit: &BoardMemberEdit,
        actor: &User,
    ) -> Result<BoardMember, BoardError> {
        edit.validate()?;

        let (aggregate, token) = self.load("edit_board_user", board_id).await?;
        let mut member = aggregate
            .member(user_id)
            .cloned()
            .ok_or(BoardError::UserNotOnBoard)?;
        if let Some(role) = edit.role {
            member.change_role(role, actor.clone(), self.clock.now())?;
        }

        self.commit(
            "edit_board_user",
            board_id,
            Some(&token),
            AggregateDelta::new().upsert_member(member.clone()),
        )
        .await?;

        info!(board_id = %board_id, user_id = %user_id, role = %member.role, "Member role changed");
        self.publish(BoardEvent::MemberRoleChanged {
            board_id: board_id.clone(),
            user_id: user_id.clone(),
            role: member.role,
            modified_by: actor.clone(),
        });
        Ok(member)
    }

    async fn boards_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<Board>, BoardError> {
        self.store
            .query_boards_for_user(user_id, params)
            .await
            .map_err(|e| map_query_error("boards_for_user", user_id, e))
    }

    async fn invites_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, BoardError> {
        self.store
            .query_invites_for_user(user_id, params)
            .await
            .map_err(|e| map_query_error("invites_for_user", user_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    /// Store whose every call fails with a database error.
    struct BrokenStore;

    #[async_trait]
    impl BoardAggregateStore for BrokenStore {
        async fn read_aggregate(
            &self,
            _board_id: &BoardId,
        ) -> Result<(BoardAggregate, ConcurrencyToken), RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }

        async fn write_aggregate(
            &self,
            _board_id: &BoardId,
            _token: Option<&ConcurrencyToken>,
            _delta: AggregateDelta,
        ) -> Result<ConcurrencyToken, RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }

        async fn delete_aggregate(&self, _board_id: &BoardId) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }

        async fn query_boards_for_user(
            &self,
            _user_id: &UserId,
            _params: &QueryParams,
        ) -> Result<Vec<Board>, RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }

        async fn query_invites_for_user(
            &self,
            _user_id: &UserId,
            _params: &QueryParams,
        ) -> Result<Vec<InviteForUser>, RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }
    }

    fn alice() -> User {
        User::new("u-alice", "Alice")
    }

    #[tokio::test]
    async fn test_store_failures_are_internal() {
        let service = StandardBoardService::new(Arc::new(BrokenStore));

        let err = service.create_board("b", "", &alice()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let err = service.get_board(&BoardId::from("b-1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let err = service
            .boards_for_user(&alice().user_id, &QueryParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_validation_runs_before_store_access() {
        // BrokenStore would turn any store access into Internal
        let service = StandardBoardService::new(Arc::new(BrokenStore));
        let board_id = BoardId::from("b-1");

        assert!(matches!(
            service.create_board("", "", &alice()).await,
            Err(BoardError::BoardNameEmpty)
        ));
        assert!(matches!(
            service.edit_board(&board_id, &BoardEdit::default(), &alice()).await,
            Err(BoardError::EmptyUpdate)
        ));
        assert!(matches!(
            service
                .edit_board(
                    &board_id,
                    &BoardEdit { name: Some("x".repeat(101)), description: None },
                    &alice()
                )
                .await,
            Err(BoardError::BoardNameTooLong { .. })
        ));
        assert!(matches!(
            service.create_invite(&board_id, BoardRole::Owner, None, &alice()).await,
            Err(BoardError::InvalidRole(_))
        ));
        assert!(matches!(
            service
                .edit_board_user(&board_id, &alice().user_id, &BoardMemberEdit::default(), &alice())
                .await,
            Err(BoardError::EmptyUpdate)
        ));
        assert!(matches!(
            service
                .accept_invite(&board_id, &InviteId::from("i-1"), &User::new("", "anon"))
                .await,
            Err(BoardError::EmptyUserId)
        ));
    }
}
