// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Board Access Service
//!
//! Caller-facing layer: authenticates the caller, checks scopes through the
//! [`AuthorizationEngine`], then delegates to the [`BoardService`]. Read views
//! are trimmed to what the caller's scopes allow.
//!
//! Every call runs under the caller's [`CancellationToken`] and an operation
//! timeout. Stores commit each write in a single step, so an aborted call
//! either committed fully before it was aborted or not at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::application::authorization::AuthorizationEngine;
use crate::application::board_service::BoardService;
use crate::application::metrics::record_operation;
use crate::domain::aggregate::BoardAggregate;
use crate::domain::board::{Board, BoardEdit, BoardId};
use crate::domain::errors::{BoardError, ErrorKind};
use crate::domain::invite::{BoardInvite, InviteId};
use crate::domain::member::{BoardMember, BoardMemberEdit};
use crate::domain::repository::{InviteForUser, QueryParams};
use crate::domain::role::{BoardRole, Scope, ScopeSet};
use crate::domain::user::{User, UserId};

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller identity plus the cancellation and deadline for one call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub caller: User,
    pub cancellation: CancellationToken,
    /// Overrides the service's default operation timeout.
    pub timeout: Option<Duration>,
}

impl RequestContext {
    pub fn new(caller: User) -> Self {
        Self {
            caller,
            cancellation: CancellationToken::new(),
            timeout: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteResponse {
    Accept,
    Decline,
}

impl FromStr for InviteResponse {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "decline" => Ok(Self::Decline),
            other => Err(BoardError::InvalidInviteResponse(other.to_string())),
        }
    }
}

/// Board fields visible to a caller. The modification stamp is only present
/// for callers allowed to edit the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub board_id: BoardId,
    pub name: String,
    pub description: String,
    pub created_time: DateTime<Utc>,
    pub created_by: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<User>,
}

impl BoardSummary {
    fn from_board(board: &Board, include_modification: bool) -> Self {
        Self {
            board_id: board.board_id.clone(),
            name: board.name.clone(),
            description: board.description.clone(),
            created_time: board.created_time,
            created_by: board.created_by.clone(),
            modified_time: include_modification.then_some(board.modified_time),
            modified_by: include_modification.then(|| board.modified_by.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: BoardSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<BoardMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invites: Option<Vec<BoardInvite>>,
}

impl BoardView {
    fn for_scopes(aggregate: BoardAggregate, scopes: &ScopeSet) -> Self {
        let board = BoardSummary::from_board(&aggregate.board, scopes.has(&Scope::EDIT_BOARD));
        let members = scopes
            .has(&Scope::VIEW_BOARD_USERS)
            .then(|| aggregate.members.into_values().collect());
        let invites = scopes
            .has(&Scope::VIEW_BOARD_INVITES)
            .then(|| aggregate.invites.into_values().collect());
        Self { board, members, invites }
    }
}

/// Result of loading a caller's boards and invites together. Either half
/// may be missing when its load failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardsAndInvites {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boards: Option<Vec<BoardSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boards_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invites: Option<Vec<InviteForUser>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invites_error: Option<String>,
}

pub struct BoardAccessService {
    boards: Arc<dyn BoardService>,
    authorization: AuthorizationEngine,
    operation_timeout: Duration,
}

impl BoardAccessService {
    pub fn new(boards: Arc<dyn BoardService>, authorization: AuthorizationEngine) -> Self {
        Self {
            boards,
            authorization,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn create_board(
        &self,
        ctx: &RequestContext,
        name: &str,
        description: &str,
    ) -> Result<BoardAggregate, BoardError> {
        self.run(ctx, "create_board", async {
            let caller = authenticate(ctx)?;
            self.require_authenticated(&Scope::CREATE_BOARD)?;
            self.boards.create_board(name, description, caller).await
        })
        .await
    }

    pub async fn delete_board(&self, ctx: &RequestContext, board_id: &BoardId) -> Result<(), BoardError> {
        self.run(ctx, "delete_board", async {
            let caller = authenticate(ctx)?;
            self.require_on_board(board_id, caller, &Scope::DELETE_BOARD).await?;
            self.boards.delete_board(board_id, caller).await
        })
        .await
    }

    pub async fn edit_board(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        edit: &BoardEdit,
    ) -> Result<Board, BoardError> {
        self.run(ctx, "edit_board", async {
            let caller = authenticate(ctx)?;
            self.require_on_board(board_id, caller, &Scope::EDIT_BOARD).await?;
            if edit.is_empty() {
                return Err(BoardError::EmptyUpdate);
            }
            self.boards.edit_board(board_id, edit, caller).await
        })
        .await
    }

    /// The board as the caller is allowed to see it.
    pub async fn board(&self, ctx: &RequestContext, board_id: &BoardId) -> Result<BoardView, BoardError> {
        self.run(ctx, "board", async {
            let caller = authenticate(ctx)?;
            let scopes = self.require_on_board(board_id, caller, &Scope::VIEW_BOARD).await?;
            let aggregate = self.boards.get_board(board_id).await?;
            Ok(BoardView::for_scopes(aggregate, &scopes))
        })
        .await
    }

    /// Boards the caller is a member of, newest membership first.
    pub async fn boards(
        &self,
        ctx: &RequestContext,
        params: &QueryParams,
    ) -> Result<Vec<BoardSummary>, BoardError> {
        self.run(ctx, "boards", async {
            let caller = authenticate(ctx)?;
            self.require_authenticated(&Scope::LIST_BOARDS)?;
            let boards = self.boards.boards_for_user(&caller.user_id, params).await?;
            Ok(boards.iter().map(|b| BoardSummary::from_board(b, false)).collect())
        })
        .await
    }

    pub async fn create_invite(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        role: BoardRole,
        target_user: Option<User>,
    ) -> Result<BoardInvite, BoardError> {
        self.run(ctx, "create_invite", async {
            let caller = authenticate(ctx)?;
            self.require_on_board(board_id, caller, &Scope::CREATE_INVITE).await?;
            self.boards.create_invite(board_id, role, target_user, caller).await
        })
        .await
    }

    pub async fn respond_to_invite(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        invite_id: &InviteId,
        response: InviteResponse,
    ) -> Result<(), BoardError> {
        self.run(ctx, "respond_to_invite", async {
            let caller = authenticate(ctx)?;
            self.require_authenticated(&Scope::RESPOND_TO_INVITE)?;
            match response {
                InviteResponse::Accept => self
                    .boards
                    .accept_invite(board_id, invite_id, caller)
                    .await
                    .map(|_| ()),
                InviteResponse::Decline => self.boards.decline_invite(board_id, invite_id, caller).await,
            }
        })
        .await
    }

    pub async fn delete_invite(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        invite_id: &InviteId,
    ) -> Result<(), BoardError> {
        self.run(ctx, "delete_invite", async {
            let caller = authenticate(ctx)?;
            self.require_on_board(board_id, caller, &Scope::DELETE_INVITE).await?;
            self.boards.delete_invite(board_id, invite_id).await
        })
        .await
    }

    /// Invites addressed to the caller, newest first.
    pub async fn invites(
        &self,
        ctx: &RequestContext,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, BoardError> {
        self.run(ctx, "invites", async {
            let caller = authenticate(ctx)?;
            self.require_authenticated(&Scope::LIST_USER_INVITES)?;
            self.boards.invites_for_user(&caller.user_id, params).await
        })
        .await
    }

    /// Remove a member. Callers may always remove themselves.
    pub async fn remove_user(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        user_id: &UserId,
    ) -> Result<(), BoardError> {
        self.run(ctx, "remove_user", async {
            let caller = authenticate(ctx)?;
            if &caller.user_id != user_id {
                self.require_on_board(board_id, caller, &Scope::REMOVE_USER).await?;
            }
            self.boards.remove_user(board_id, user_id).await
        })
        .await
    }

    pub async fn edit_board_user(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        user_id: &UserId,
        edit: &BoardMemberEdit,
    ) -> Result<BoardMember, BoardError> {
        self.run(ctx, "edit_board_user", async {
            let caller = authenticate(ctx)?;
            self.require_on_board(board_id, caller, &Scope::EDIT_BOARD_USERS).await?;
            if edit.is_empty() {
                return Err(BoardError::EmptyUpdate);
            }
            self.boards.edit_board_user(board_id, user_id, edit, caller).await
        })
        .await
    }

    /// Load the caller's boards and invites concurrently. Fails only when
    /// both loads fail.
    pub async fn boards_and_invites(&self, ctx: &RequestContext) -> Result<BoardsAndInvites, BoardError> {
        self.run(ctx, "boards_and_invites", async {
            let caller = authenticate(ctx)?;
            self.require_authenticated(&Scope::LIST_BOARDS)?;
            self.require_authenticated(&Scope::LIST_USER_INVITES)?;

            let params = QueryParams::default();
            let (boards, invites) = tokio::join!(
                self.boards.boards_for_user(&caller.user_id, &params),
                self.boards.invites_for_user(&caller.user_id, &params),
            );

            let mut result = BoardsAndInvites::default();
            match boards {
                Ok(boards) => {
                    result.boards = Some(boards.iter().map(|b| BoardSummary::from_board(b, false)).collect())
                }
                Err(e) => {
                    warn!(user_id = %caller.user_id, "Could not load boards: {}", e);
                    result.boards_error = Some("could not load boards".to_string());
                }
            }
            match invites {
                Ok(invites) => result.invites = Some(invites),
                Err(e) => {
                    warn!(user_id = %caller.user_id, "Could not load invites: {}", e);
                    result.invites_error = Some("could not load invites".to_string());
                }
            }

            if result.boards.is_none() && result.invites.is_none() {
                return Err(BoardError::Internal("could not load boards or invites".to_string()));
            }
            Ok(result)
        })
        .await
    }

    fn require_authenticated(&self, scope: &Scope) -> Result<(), BoardError> {
        if !self.authorization.authenticated_scopes().has(scope) {
            return Err(BoardError::PermissionDenied);
        }
        Ok(())
    }

    async fn require_on_board(
        &self,
        board_id: &BoardId,
        caller: &User,
        scope: &Scope,
    ) -> Result<ScopeSet, BoardError> {
        require_scope(&self.authorization, board_id, caller, scope).await
    }

    async fn run<T, F>(&self, ctx: &RequestContext, operation: &'static str, work: F) -> Result<T, BoardError>
    where
        F: Future<Output = Result<T, BoardError>>,
    {
        guarded(ctx, self.operation_timeout, operation, work).await
    }
}

// ============================================================================
// Shared Guards
// ============================================================================

/// Resolve the caller's scopes on the board and require `scope` among them.
pub(crate) async fn require_scope(
    authorization: &AuthorizationEngine,
    board_id: &BoardId,
    caller: &User,
    scope: &Scope,
) -> Result<ScopeSet, BoardError> {
    let scopes = authorization.authorize(board_id, &caller.user_id).await?;
    if !scopes.has(scope) {
        debug!(board_id = %board_id, user_id = %caller.user_id, scope = %scope, "Missing scope");
        return Err(BoardError::PermissionDenied);
    }
    Ok(scopes)
}

/// Run `work` under the caller's cancellation and deadline, then log and
/// record the outcome.
pub(crate) async fn guarded<T, F>(
    ctx: &RequestContext,
    default_timeout: Duration,
    operation: &'static str,
    work: F,
) -> Result<T, BoardError>
where
    F: Future<Output = Result<T, BoardError>>,
{
    let started = Instant::now();
    let limit = ctx.timeout.unwrap_or(default_timeout);

    let result = tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => Err(BoardError::Cancelled),
        outcome = tokio::time::timeout(limit, work) => {
            outcome.unwrap_or_else(|_| Err(BoardError::DeadlineExceeded))
        }
    };

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            match e.kind() {
                ErrorKind::Internal => {
                    error!(operation, user_id = %ctx.caller.user_id, "Operation failed: {}", e)
                }
                ErrorKind::Cancelled | ErrorKind::DeadlineExceeded => {
                    warn!(operation, user_id = %ctx.caller.user_id, "Operation aborted: {}", e)
                }
                _ => debug!(operation, user_id = %ctx.caller.user_id, "Operation rejected: {}", e),
            }
            "error"
        }
    };
    record_operation(operation, outcome, started.elapsed());
    result
}

pub(crate) fn authenticate(ctx: &RequestContext) -> Result<&User, BoardError> {
    if ctx.caller.user_id.is_empty() {
        return Err(BoardError::Unauthenticated);
    }
    Ok(&ctx.caller)
}
