// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Board Error Taxonomy
//!
//! Every failure surfaced by the board and link services is a [`BoardError`]. Each
//! variant maps to one coarse [`ErrorKind`] and, for business-rule
//! violations, one stable [`ErrorCode`] that clients can match on.
//!
//! [`PublicError`] is the user-visible projection: kind, optional code and a
//! message with no storage or infrastructure detail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::board::BoardId;
use crate::domain::invite::InviteId;
use crate::domain::link::LinkId;
use crate::domain::repository::RepositoryError;

/// Coarse failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, rejected before any store access.
    InvalidArgument,
    /// Referenced board, invite or link is absent.
    NotFound,
    /// Authorization failed, or the caller has no standing on the board.
    PermissionDenied,
    /// Business rule violated by the current state, or a stale concurrency token.
    FailedPrecondition,
    /// Store or infrastructure failure.
    Internal,
    /// No caller identity.
    Unauthenticated,
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::FailedPrecondition => "failed_precondition",
            Self::Internal => "internal",
            Self::Unauthenticated => "unauthenticated",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        };
        f.write_str(s)
    }
}

/// Stable machine-readable sub-codes, one per business rule.
///
/// The numeric values are part of the public contract and must never be
/// reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum ErrorCode {
    BoardNameEmpty = 1,
    BoardNameTooLong = 2,
    BoardDescriptionTooLong = 3,
    InvalidRole = 4,
    MaxInvitesReached = 5,
    MaxBoardUsersReached = 6,
    UserAlreadyInvited = 7,
    UserAlreadyOnBoard = 8,
    InviteExpired = 9,
    WrongUserForInvite = 10,
    CannotDeclinePublicInvite = 11,
    UserNotOnBoard = 12,
    BoardOwnerCannotBeRemoved = 13,
    OnlyCreatorCanBeOwner = 14,
    CannotChangeRoleOfOwner = 15,
    /// The aggregate changed between read and write; re-read and retry.
    ConcurrentModification = 16,
    LinkTitleEmpty = 17,
    LinkTitleTooLong = 18,
    LinkUrlEmpty = 19,
    LinkUrlInvalid = 20,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board name cannot be empty")]
    BoardNameEmpty,

    #[error("board name exceeds {max} bytes")]
    BoardNameTooLong { max: usize },

    #[error("board description exceeds {max} bytes")]
    BoardDescriptionTooLong { max: usize },

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("user id cannot be empty")]
    EmptyUserId,

    #[error("empty update")]
    EmptyUpdate,

    #[error("invalid invite response: {0}")]
    InvalidInviteResponse(String),

    #[error("maximum number of invites reached")]
    MaxInvitesReached,

    #[error("board already has the maximum number of users")]
    MaxBoardUsersReached,

    #[error("user already invited")]
    UserAlreadyInvited,

    #[error("user is already on the board")]
    UserAlreadyOnBoard,

    #[error("invite expired")]
    InviteExpired,

    #[error("invite is meant for a different user")]
    WrongUserForInvite,

    #[error("only invites targeted at a specific user can be declined")]
    CannotDeclinePublicInvite,

    #[error("user is not on the board")]
    UserNotOnBoard,

    #[error("board owner cannot be removed")]
    BoardOwnerCannotBeRemoved,

    #[error("only the creator of a board can be its owner")]
    OnlyCreatorCanBeOwner,

    #[error("cannot change the role of the board owner")]
    CannotChangeRoleOfOwner,

    #[error("link title cannot be empty")]
    LinkTitleEmpty,

    #[error("link title exceeds {max} bytes")]
    LinkTitleTooLong { max: usize },

    #[error("link url cannot be empty")]
    LinkUrlEmpty,

    #[error("invalid link url: {0}")]
    LinkUrlInvalid(String),

    #[error("board {0} not found")]
    BoardNotFound(BoardId),

    #[error("invite {0} not found")]
    InviteNotFound(InviteId),

    #[error("link {0} not found")]
    LinkNotFound(LinkId),

    #[error("board {0} was modified concurrently")]
    ConcurrentModification(BoardId),

    #[error("permission denied")]
    PermissionDenied,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("storage failure: {0}")]
    Store(#[source] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BoardNameEmpty
            | Self::BoardNameTooLong { .. }
            | Self::BoardDescriptionTooLong { .. }
            | Self::InvalidRole(_)
            | Self::EmptyUserId
            | Self::EmptyUpdate
            | Self::InvalidInviteResponse(_)
            | Self::LinkTitleEmpty
            | Self::LinkTitleTooLong { .. }
            | Self::LinkUrlEmpty
            | Self::LinkUrlInvalid(_) => ErrorKind::InvalidArgument,

            Self::MaxInvitesReached
            | Self::MaxBoardUsersReached
            | Self::UserAlreadyInvited
            | Self::UserAlreadyOnBoard
            | Self::InviteExpired
            | Self::WrongUserForInvite
            | Self::CannotDeclinePublicInvite
            | Self::UserNotOnBoard
            | Self::BoardOwnerCannotBeRemoved
            | Self::OnlyCreatorCanBeOwner
            | Self::CannotChangeRoleOfOwner
            | Self::ConcurrentModification(_) => ErrorKind::FailedPrecondition,

            Self::BoardNotFound(_) | Self::InviteNotFound(_) | Self::LinkNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::Store(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            Self::BoardNameEmpty => ErrorCode::BoardNameEmpty,
            Self::BoardNameTooLong { .. } => ErrorCode::BoardNameTooLong,
            Self::BoardDescriptionTooLong { .. } => ErrorCode::BoardDescriptionTooLong,
            Self::InvalidRole(_) => ErrorCode::InvalidRole,
            Self::MaxInvitesReached => ErrorCode::MaxInvitesReached,
            Self::MaxBoardUsersReached => ErrorCode::MaxBoardUsersReached,
            Self::UserAlreadyInvited => ErrorCode::UserAlreadyInvited,
            Self::UserAlreadyOnBoard => ErrorCode::UserAlreadyOnBoard,
            Self::InviteExpired => ErrorCode::InviteExpired,
            Self::WrongUserForInvite => ErrorCode::WrongUserForInvite,
            Self::CannotDeclinePublicInvite => ErrorCode::CannotDeclinePublicInvite,
            Self::UserNotOnBoard => ErrorCode::UserNotOnBoard,
            Self::BoardOwnerCannotBeRemoved => ErrorCode::BoardOwnerCannotBeRemoved,
            Self::OnlyCreatorCanBeOwner => ErrorCode::OnlyCreatorCanBeOwner,
            Self::CannotChangeRoleOfOwner => ErrorCode::CannotChangeRoleOfOwner,
            Self::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            Self::LinkTitleEmpty => ErrorCode::LinkTitleEmpty,
            Self::LinkTitleTooLong { .. } => ErrorCode::LinkTitleTooLong,
            Self::LinkUrlEmpty => ErrorCode::LinkUrlEmpty,
            Self::LinkUrlInvalid(_) => ErrorCode::LinkUrlInvalid,
            _ => return None,
        };
        Some(code)
    }

    /// True when re-reading the aggregate and re-attempting may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

/// User-visible error projection. Never carries store or infrastructure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicError {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl From<&BoardError> for PublicError {
    fn from(err: &BoardError) -> Self {
        let message = match err.kind() {
            ErrorKind::Internal => "internal error".to_string(),
            _ => err.to_string(),
        };
        Self {
            kind: err.kind(),
            code: err.code(),
            message,
        }
    }
}

impl std::fmt::Display for PublicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} ({}): {}", self.kind, code.as_u16(), self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for PublicError {}
