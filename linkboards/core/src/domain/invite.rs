// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Invite Lifecycle
//!
//! ```text
//!            accept (target or anyone, not expired)
//!   Issued ─────────────────────────────────────────► Accepted
//!     │  ╲  decline (targeted only, by target)
//!     │   ╲──────────────────────────────────────────► Declined
//!     │    revoke (delete)
//!     ├──────────────────────────────────────────────► Revoked
//!     │ time passes expires_time
//!     ▼
//!   Expired ── decline / revoke only
//! ```
//!
//! All terminal transitions remove the invite from the aggregate. `Expired`
//! is logical: an expired invite stays stored until it is removed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::BoardError;
use crate::domain::role::BoardRole;
use crate::domain::user::{User, UserId};

/// Unique identifier for an invite, `i-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(pub String);

impl InviteId {
    pub fn new() -> Self {
        Self(format!("i-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InviteId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for InviteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    /// Not expired, acceptable by any user.
    Open,
    /// Not expired, acceptable only by the target user.
    Targeted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteTransition {
    Accept,
    Decline,
    Revoke,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInvite {
    pub invite_id: InviteId,
    pub role: BoardRole,
    /// When set, only this user may accept or decline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<User>,
    pub created_time: DateTime<Utc>,
    pub created_by: User,
    pub expires_time: DateTime<Utc>,
}

impl BoardInvite {
    pub fn new(
        role: BoardRole,
        target_user: Option<User>,
        created_by: User,
        now: DateTime<Utc>,
        expiry: Duration,
    ) -> Result<Self, BoardError> {
        if !role.is_assignable() {
            return Err(BoardError::InvalidRole(role.to_string()));
        }
        if let Some(target) = &target_user {
            target.ensure_identified()?;
        }
        let expires_time = now
            .checked_add_signed(expiry)
            .ok_or_else(|| BoardError::Internal(format!("invite expiry {expiry} out of range")))?;

        Ok(Self {
            invite_id: InviteId::new(),
            role,
            target_user,
            created_time: now,
            created_by,
            expires_time,
        })
    }

    pub fn target_id(&self) -> Option<&UserId> {
        self.target_user.as_ref().map(|u| &u.user_id)
    }

    pub fn is_open(&self) -> bool {
        self.target_user.is_none()
    }

    pub fn is_for(&self, user_id: &UserId) -> bool {
        self.target_id() == Some(user_id)
    }

    /// Expiry is exclusive: the invite is still valid at exactly `expires_time`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_time
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> InviteState {
        if self.is_expired_at(now) {
            InviteState::Expired
        } else if self.is_open() {
            InviteState::Open
        } else {
            InviteState::Targeted
        }
    }

    /// Check whether `actor` may perform `transition` at `now`.
    ///
    /// Revocation is authorized by scope, not by the invite, so it is always
    /// allowed here.
    pub fn check_transition(
        &self,
        transition: InviteTransition,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        match transition {
            InviteTransition::Accept => {
                if self.is_expired_at(now) {
                    return Err(BoardError::InviteExpired);
                }
                match self.target_id() {
                    Some(target) if target != actor => Err(BoardError::WrongUserForInvite),
                    _ => Ok(()),
                }
            }
            InviteTransition::Decline => match self.target_id() {
                None => Err(BoardError::CannotDeclinePublicInvite),
                Some(target) if target != actor => Err(BoardError::WrongUserForInvite),
                Some(_) => Ok(()),
            },
            InviteTransition::Revoke => Ok(()),
        }
    }
}
