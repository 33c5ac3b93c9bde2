// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use common::{user, Harness};
use linkboards_core::application::{
    AuthorizationEngine, AuthorizationError, BoardAccessService, BoardService, InviteResponse,
    MemberRoleResolver, RequestContext, RoleResolver, StandardBoardService,
};
use linkboards_core::domain::aggregate::BoardAggregate;
use linkboards_core::domain::board::{Board, BoardEdit, BoardId};
use linkboards_core::domain::errors::{BoardError, ErrorKind, PublicError};
use linkboards_core::domain::member::BoardMemberEdit;
use linkboards_core::domain::repository::{
    AggregateDelta, BoardAggregateStore, ConcurrencyToken, InviteForUser, QueryParams,
    RepositoryError,
};
use linkboards_core::domain::role::{BoardRole, RoleScopeTable};
use linkboards_core::domain::user::{User, UserId};
use linkboards_core::infrastructure::repositories::InMemoryBoardStore;

fn ctx(id: &str) -> RequestContext {
    RequestContext::new(user(id))
}

/// A board owned by alice with bob as editor and carol as viewer.
async fn staffed_board(h: &Harness) -> BoardId {
    let alice = user("u-alice");
    let board_id = h.service.create_board("Team", "shared links", &alice).await.unwrap().board_id().clone();
    for (member, role) in [(user("u-bob"), BoardRole::Editor), (user("u-carol"), BoardRole::Viewer)] {
        let invite = h
            .service
            .create_invite(&board_id, role, Some(member.clone()), &alice)
            .await
            .unwrap();
        h.service.accept_invite(&board_id, &invite.invite_id, &member).await.unwrap();
    }
    board_id
}

#[tokio::test]
async fn board_view_is_trimmed_to_scopes() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;
    h.service
        .create_invite(&board_id, BoardRole::Viewer, None, &user("u-alice"))
        .await
        .unwrap();

    let full = h.access.board(&ctx("u-bob"), &board_id).await.unwrap();
    assert_eq!(full.members.as_ref().map(Vec::len), Some(3));
    assert_eq!(full.invites.as_ref().map(Vec::len), Some(1));
    assert!(full.board.modified_time.is_some());
    assert!(full.board.modified_by.is_some());

    let trimmed = h.access.board(&ctx("u-carol"), &board_id).await.unwrap();
    assert_eq!(trimmed.board.name, "Team");
    assert!(trimmed.members.is_none());
    assert!(trimmed.invites.is_none());
    assert!(trimmed.board.modified_time.is_none());

    let json = serde_json::to_value(&trimmed).unwrap();
    assert_eq!(json["name"], "Team");
    assert!(json.get("members").is_none());
    assert!(json.get("modified_time").is_none());
}

#[tokio::test]
async fn outsiders_and_missing_boards_look_the_same() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;

    let outsider = h.access.board(&ctx("u-mallory"), &board_id).await.unwrap_err();
    let missing = h
        .access
        .board(&ctx("u-mallory"), &BoardId::from("b-missing"))
        .await
        .unwrap_err();
    assert!(matches!(outsider, BoardError::PermissionDenied));
    assert!(matches!(missing, BoardError::PermissionDenied));
}

#[tokio::test]
async fn role_permissions() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;
    let rename = BoardEdit { name: Some("Renamed".to_string()), description: None };

    // viewer
    assert!(matches!(
        h.access.create_invite(&ctx("u-carol"), &board_id, BoardRole::Viewer, None).await,
        Err(BoardError::PermissionDenied)
    ));
    assert!(matches!(
        h.access.edit_board(&ctx("u-carol"), &board_id, &rename).await,
        Err(BoardError::PermissionDenied)
    ));

    // editor
    let invite = assert_ok!(h.access.create_invite(&ctx("u-bob"), &board_id, BoardRole::Viewer, None).await);
    assert_ok!(h.access.edit_board(&ctx("u-bob"), &board_id, &rename).await);
    assert_ok!(h.access.delete_invite(&ctx("u-bob"), &board_id, &invite.invite_id).await);
    assert!(matches!(
        h.access.delete_board(&ctx("u-bob"), &board_id).await,
        Err(BoardError::PermissionDenied)
    ));

    // owner
    assert_ok!(h.access.delete_board(&ctx("u-alice"), &board_id).await);
    assert!(matches!(
        h.access.board(&ctx("u-alice"), &board_id).await,
        Err(BoardError::PermissionDenied)
    ));
}

#[tokio::test]
async fn empty_edits_rejected_after_authorization() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;

    assert!(matches!(
        h.access.edit_board(&ctx("u-carol"), &board_id, &BoardEdit::default()).await,
        Err(BoardError::PermissionDenied)
    ));
    assert!(matches!(
        h.access.edit_board(&ctx("u-bob"), &board_id, &BoardEdit::default()).await,
        Err(BoardError::EmptyUpdate)
    ));
    assert!(matches!(
        h.access
            .edit_board_user(&ctx("u-bob"), &board_id, &UserId::from("u-carol"), &BoardMemberEdit::default())
            .await,
        Err(BoardError::EmptyUpdate)
    ));
}

#[tokio::test]
async fn member_management() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;
    let carol = UserId::from("u-carol");
    let promote = BoardMemberEdit { role: Some(BoardRole::Editor) };

    assert!(matches!(
        h.access.edit_board_user(&ctx("u-carol"), &board_id, &carol, &promote).await,
        Err(BoardError::PermissionDenied)
    ));
    let member = h
        .access
        .edit_board_user(&ctx("u-bob"), &board_id, &carol, &promote)
        .await
        .unwrap();
    assert_eq!(member.role, BoardRole::Editor);
    assert_eq!(member.modified_by.user_id, UserId::from("u-bob"));

    assert!(matches!(
        h.access
            .remove_user(&ctx("u-bob"), &board_id, &UserId::from("u-alice"))
            .await,
        Err(BoardError::BoardOwnerCannotBeRemoved)
    ));
    assert_ok!(h.access.remove_user(&ctx("u-bob"), &board_id, &carol).await);
}

#[tokio::test]
async fn members_may_always_leave() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;

    assert!(matches!(
        h.access
            .remove_user(&ctx("u-carol"), &board_id, &UserId::from("u-bob"))
            .await,
        Err(BoardError::PermissionDenied)
    ));
    assert_ok!(
        h.access
            .remove_user(&ctx("u-carol"), &board_id, &UserId::from("u-carol"))
            .await
    );
    assert!(matches!(
        h.access.board(&ctx("u-carol"), &board_id).await,
        Err(BoardError::PermissionDenied)
    ));

    // leaving a board that does not exist reports it missing
    let err = h
        .access
        .remove_user(&ctx("u-carol"), &BoardId::from("b-missing"), &UserId::from("u-carol"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // the owner cannot leave
    assert!(matches!(
        h.access
            .remove_user(&ctx("u-alice"), &board_id, &UserId::from("u-alice"))
            .await,
        Err(BoardError::BoardOwnerCannotBeRemoved)
    ));
}

#[tokio::test]
async fn invite_responses_through_access() {
    let h = Harness::new();
    let alice_ctx = ctx("u-alice");
    let board = h.access.create_board(&alice_ctx, "Invites", "").await.unwrap();
    let board_id = board.board_id().clone();

    let for_bob = h
        .access
        .create_invite(&alice_ctx, &board_id, BoardRole::Viewer, Some(user("u-bob")))
        .await
        .unwrap();
    let for_dave = h
        .access
        .create_invite(&alice_ctx, &board_id, BoardRole::Editor, Some(user("u-dave")))
        .await
        .unwrap();

    let bobs = h.access.invites(&ctx("u-bob"), &QueryParams::default()).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].invite.invite_id, for_bob.invite_id);

    assert_ok!(
        h.access
            .respond_to_invite(&ctx("u-bob"), &board_id, &for_bob.invite_id, InviteResponse::Accept)
            .await
    );
    assert_ok!(
        h.access
            .respond_to_invite(&ctx("u-dave"), &board_id, &for_dave.invite_id, InviteResponse::Decline)
            .await
    );

    let boards = h.access.boards(&ctx("u-bob"), &QueryParams::default()).await.unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].board_id, board_id);
    assert!(boards[0].modified_time.is_none());
    assert!(h
        .access
        .boards(&ctx("u-dave"), &QueryParams::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unidentified_caller_rejected() {
    let h = Harness::new();
    let anonymous = RequestContext::new(User::new("", "anonymous"));

    let err = assert_err!(h.access.create_board(&anonymous, "Nope", "").await);
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    let err = assert_err!(h.access.boards_and_invites(&anonymous).await);
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
async fn table_overrides_change_permissions() {
    let store: Arc<dyn BoardAggregateStore> = Arc::new(InMemoryBoardStore::new());
    let service = Arc::new(StandardBoardService::new(store.clone()));

    let mut overrides = HashMap::new();
    overrides.insert(
        BoardRole::Viewer,
        vec!["boards:view".to_string(), "boards:invite".to_string()],
    );
    let table = RoleScopeTable::default().with_overrides(&overrides);
    let access = BoardAccessService::new(
        service.clone(),
        AuthorizationEngine::new(Arc::new(MemberRoleResolver::new(store)), Arc::new(table)),
    );

    let alice = user("u-alice");
    let carol = user("u-carol");
    let board_id = service.create_board("Custom", "", &alice).await.unwrap().board_id().clone();
    let invite = service
        .create_invite(&board_id, BoardRole::Viewer, Some(carol.clone()), &alice)
        .await
        .unwrap();
    service.accept_invite(&board_id, &invite.invite_id, &carol).await.unwrap();

    assert_ok!(
        access
            .create_invite(&RequestContext::new(carol), &board_id, BoardRole::Viewer, None)
            .await
    );
}

// ============================================================================
// Cancellation and deadlines
// ============================================================================

/// Resolver that takes a long time to answer.
struct SlowResolver(Duration);

#[async_trait]
impl RoleResolver for SlowResolver {
    async fn roles(&self, _board_id: &BoardId, _user_id: &UserId) -> Result<Vec<BoardRole>, AuthorizationError> {
        tokio::time::sleep(self.0).await;
        Ok(vec![BoardRole::Owner])
    }
}

fn slow_access(delay: Duration) -> BoardAccessService {
    let store: Arc<dyn BoardAggregateStore> = Arc::new(InMemoryBoardStore::new());
    BoardAccessService::new(
        Arc::new(StandardBoardService::new(store)),
        AuthorizationEngine::new(Arc::new(SlowResolver(delay)), Arc::new(RoleScopeTable::default())),
    )
}

#[tokio::test]
async fn operation_timeout_is_deadline_exceeded() {
    let access = slow_access(Duration::from_secs(10)).with_operation_timeout(Duration::from_millis(20));
    let err = access.board(&ctx("u-alice"), &BoardId::from("b-1")).await.unwrap_err();
    assert!(matches!(err, BoardError::DeadlineExceeded));

    let access = slow_access(Duration::from_secs(10));
    let short = ctx("u-alice").with_timeout(Duration::from_millis(20));
    let err = access.board(&short, &BoardId::from("b-1")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
}

#[tokio::test]
async fn cancelled_caller_aborts_operation() {
    let access = slow_access(Duration::from_secs(10));
    let token = CancellationToken::new();
    let request = ctx("u-alice").with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let err = access.board(&request, &BoardId::from("b-1")).await.unwrap_err();
    canceller.await.unwrap();
    assert!(matches!(err, BoardError::Cancelled));
}

#[tokio::test]
async fn already_cancelled_never_writes() {
    let h = Harness::new();
    let token = CancellationToken::new();
    token.cancel();
    let request = ctx("u-alice").with_cancellation(token);

    let err = h.access.create_board(&request, "Never", "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(h
        .service
        .boards_for_user(&UserId::from("u-alice"), &QueryParams::default())
        .await
        .unwrap()
        .is_empty());
}

// ============================================================================
// Combined listing
// ============================================================================

/// Store whose per-user queries can be made to fail.
struct FlakyStore {
    inner: InMemoryBoardStore,
    fail_boards: bool,
    fail_invites: bool,
}

#[async_trait]
impl BoardAggregateStore for FlakyStore {
    async fn read_aggregate(
        &self,
        board_id: &BoardId,
    ) -> Result<(BoardAggregate, ConcurrencyToken), RepositoryError> {
        self.inner.read_aggregate(board_id).await
    }

    async fn write_aggregate(
        &self,
        board_id: &BoardId,
        token: Option<&ConcurrencyToken>,
        delta: AggregateDelta,
    ) -> Result<ConcurrencyToken, RepositoryError> {
        self.inner.write_aggregate(board_id, token, delta).await
    }

    async fn delete_aggregate(&self, board_id: &BoardId) -> Result<(), RepositoryError> {
        self.inner.delete_aggregate(board_id).await
    }

    async fn query_boards_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<Board>, RepositoryError> {
        if self.fail_boards {
            return Err(RepositoryError::Database("boards index unavailable".to_string()));
        }
        self.inner.query_boards_for_user(user_id, params).await
    }

    async fn query_invites_for_user(
        &self,
        user_id: &UserId,
        params: &QueryParams,
    ) -> Result<Vec<InviteForUser>, RepositoryError> {
        if self.fail_invites {
            return Err(RepositoryError::Database("invite index unavailable".to_string()));
        }
        self.inner.query_invites_for_user(user_id, params).await
    }
}

fn flaky_access(fail_boards: bool, fail_invites: bool) -> BoardAccessService {
    let store: Arc<dyn BoardAggregateStore> = Arc::new(FlakyStore {
        inner: InMemoryBoardStore::new(),
        fail_boards,
        fail_invites,
    });
    BoardAccessService::new(
        Arc::new(StandardBoardService::new(store.clone())),
        AuthorizationEngine::new(
            Arc::new(MemberRoleResolver::new(store)),
            Arc::new(RoleScopeTable::default()),
        ),
    )
}

#[tokio::test]
async fn boards_and_invites_together() {
    let h = Harness::new();
    let board_id = staffed_board(&h).await;
    h.service
        .create_invite(&board_id, BoardRole::Viewer, Some(user("u-dave")), &user("u-alice"))
        .await
        .unwrap();

    let alice = h.access.boards_and_invites(&ctx("u-alice")).await.unwrap();
    assert_eq!(alice.boards.map(|b| b.len()), Some(1));
    assert_eq!(alice.invites.map(|i| i.len()), Some(0));
    assert!(alice.boards_error.is_none());

    let dave = h.access.boards_and_invites(&ctx("u-dave")).await.unwrap();
    assert_eq!(dave.boards.map(|b| b.len()), Some(0));
    assert_eq!(dave.invites.map(|i| i.len()), Some(1));
}

#[tokio::test]
async fn boards_and_invites_partial_failure() {
    let result = flaky_access(true, false)
        .boards_and_invites(&ctx("u-alice"))
        .await
        .unwrap();
    assert!(result.boards.is_none());
    assert_eq!(result.boards_error.as_deref(), Some("could not load boards"));
    assert_eq!(result.invites, Some(Vec::new()));

    let result = flaky_access(false, true)
        .boards_and_invites(&ctx("u-alice"))
        .await
        .unwrap();
    assert!(result.invites.is_none());
    assert!(result.invites_error.is_some());

    let err = flaky_access(true, true)
        .boards_and_invites(&ctx("u-alice"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[tokio::test]
async fn store_failures_stay_private() {
    let err = flaky_access(true, false)
        .boards(&ctx("u-alice"), &QueryParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let public = PublicError::from(&err);
    assert_eq!(public.kind, ErrorKind::Internal);
    assert!(!public.message.contains("boards index unavailable"));
}
