// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Board Aggregate
//!
//! A board together with its members and invites: the unit of consistency.
//! Member and invite counts per board are bounded by [`BoardLimits`], so the
//! whole aggregate is always loaded at once.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::board::{Board, BoardId};
use crate::domain::errors::BoardError;
use crate::domain::invite::{BoardInvite, InviteId};
use crate::domain::member::BoardMember;
use crate::domain::repository::AggregateDelta;
use crate::domain::role::BoardRole;
use crate::domain::user::UserId;

pub const DEFAULT_MAX_MEMBERS: usize = 32;
pub const DEFAULT_MAX_INVITES: usize = 32;
pub const DEFAULT_INVITE_EXPIRY_HOURS: i64 = 72;

/// Per-board capacity bounds and invite lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLimits {
    pub max_members: usize,
    pub max_invites: usize,
    pub invite_expiry: Duration,
}

impl Default for BoardLimits {
    fn default() -> Self {
        Self {
            max_members: DEFAULT_MAX_MEMBERS,
            max_invites: DEFAULT_MAX_INVITES,
            invite_expiry: Duration::hours(DEFAULT_INVITE_EXPIRY_HOURS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardAggregate {
    pub board: Board,
    pub members: BTreeMap<UserId, BoardMember>,
    pub invites: BTreeMap<InviteId, BoardInvite>,
}

impl BoardAggregate {
    /// A freshly created board whose only member is its creator, as owner.
    pub fn new(board: Board, owner: BoardMember) -> Self {
        let mut members = BTreeMap::new();
        members.insert(owner.user.user_id.clone(), owner);
        Self {
            board,
            members,
            invites: BTreeMap::new(),
        }
    }

    /// Starting point for a create write: the board with no members or
    /// invites yet, to which the create delta is applied.
    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            members: BTreeMap::new(),
            invites: BTreeMap::new(),
        }
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board.board_id
    }

    pub fn member(&self, user_id: &UserId) -> Option<&BoardMember> {
        self.members.get(user_id)
    }

    pub fn contains_member(&self, user_id: &UserId) -> bool {
        self.members.contains_key(user_id)
    }

    pub fn invite(&self, invite_id: &InviteId) -> Option<&BoardInvite> {
        self.invites.get(invite_id)
    }

    pub fn invite_for_user(&self, user_id: &UserId) -> Option<&BoardInvite> {
        self.invites.values().find(|i| i.is_for(user_id))
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn invite_count(&self) -> usize {
        self.invites.len()
    }

    pub fn owner(&self) -> Option<&BoardMember> {
        self.members.values().find(|m| m.is_owner())
    }

    /// Roles `user_id` holds on this board. Empty when not a member.
    pub fn roles_of(&self, user_id: &UserId) -> Vec<BoardRole> {
        self.members
            .get(user_id)
            .map(|m| vec![m.role])
            .unwrap_or_default()
    }

    /// Capacity and uniqueness checks for issuing a new invite, in order:
    /// invite capacity, member capacity, then for targeted invites an
    /// existing invite and an existing membership.
    pub fn ensure_can_issue(
        &self,
        target: Option<&UserId>,
        limits: &BoardLimits,
    ) -> Result<(), BoardError> {
        if self.invite_count() >= limits.max_invites {
            return Err(BoardError::MaxInvitesReached);
        }
        if self.member_count() >= limits.max_members {
            return Err(BoardError::MaxBoardUsersReached);
        }
        if let Some(user_id) = target {
            if self.invite_for_user(user_id).is_some() {
                return Err(BoardError::UserAlreadyInvited);
            }
            if self.contains_member(user_id) {
                return Err(BoardError::UserAlreadyOnBoard);
            }
        }
        Ok(())
    }

    /// Checks for `user_id` joining through an invite.
    pub fn ensure_can_join(&self, user_id: &UserId, limits: &BoardLimits) -> Result<(), BoardError> {
        if self.contains_member(user_id) {
            return Err(BoardError::UserAlreadyOnBoard);
        }
        if self.member_count() >= limits.max_members {
            return Err(BoardError::MaxBoardUsersReached);
        }
        Ok(())
    }

    /// Apply a delta in place. Removals run before upserts within each
    /// collection.
    pub fn apply(&mut self, delta: &AggregateDelta) {
        if let Some(board) = &delta.board {
            self.board = board.clone();
        }
        for user_id in &delta.remove_members {
            self.members.remove(user_id);
        }
        for member in &delta.upsert_members {
            self.members.insert(member.user.user_id.clone(), member.clone());
        }
        for invite_id in &delta.remove_invites {
            self.invites.remove(invite_id);
        }
        for invite in &delta.upsert_invites {
            self.invites.insert(invite.invite_id.clone(), invite.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::User;
    use chrono::Utc;

    fn aggregate() -> BoardAggregate {
        let alice = User::new("u-alice", "Alice");
        let now = Utc::now();
        let board = Board::new("b", "", alice.clone(), now).unwrap();
        BoardAggregate::new(board, BoardMember::owner(alice, now))
    }

    fn viewer_invite(target: Option<User>) -> BoardInvite {
        BoardInvite::new(
            BoardRole::Viewer,
            target,
            User::new("u-alice", "Alice"),
            Utc::now(),
            Duration::days(3),
        )
        .unwrap()
    }

    #[test]
    fn test_new_aggregate_has_single_owner() {
        let agg = aggregate();
        assert_eq!(agg.member_count(), 1);
        assert_eq!(agg.owner().unwrap().user.user_id, UserId::from("u-alice"));
        assert_eq!(agg.roles_of(&UserId::from("u-alice")), vec![BoardRole::Owner]);
        assert!(agg.roles_of(&UserId::from("u-bob")).is_empty());
    }

    #[test]
    fn test_issue_checks_invite_capacity_first() {
        let mut agg = aggregate();
        let limits = BoardLimits { max_members: 1, max_invites: 1, ..BoardLimits::default() };
        agg.apply(&AggregateDelta::new().upsert_invite(viewer_invite(None)));

        assert!(matches!(
            agg.ensure_can_issue(None, &limits),
            Err(BoardError::MaxInvitesReached)
        ));
    }

    #[test]
    fn test_issue_rejects_when_board_full() {
        let agg = aggregate();
        let limits = BoardLimits { max_members: 1, ..BoardLimits::default() };
        assert!(matches!(
            agg.ensure_can_issue(None, &limits),
            Err(BoardError::MaxBoardUsersReached)
        ));
    }

    #[test]
    fn test_issue_rejects_duplicate_target_and_member() {
        let mut agg = aggregate();
        let limits = BoardLimits::default();
        let bob = User::new("u-bob", "Bob");
        agg.apply(&AggregateDelta::new().upsert_invite(viewer_invite(Some(bob.clone()))));

        assert!(matches!(
            agg.ensure_can_issue(Some(&bob.user_id), &limits),
            Err(BoardError::UserAlreadyInvited)
        ));
        assert!(matches!(
            agg.ensure_can_issue(Some(&UserId::from("u-alice")), &limits),
            Err(BoardError::UserAlreadyOnBoard)
        ));
        assert!(agg.ensure_can_issue(Some(&UserId::from("u-carol")), &limits).is_ok());
    }

    #[test]
    fn test_join_checks() {
        let agg = aggregate();
        let limits = BoardLimits::default();
        assert!(matches!(
            agg.ensure_can_join(&UserId::from("u-alice"), &limits),
            Err(BoardError::UserAlreadyOnBoard)
        ));
        let full = BoardLimits { max_members: 1, ..limits };
        assert!(matches!(
            agg.ensure_can_join(&UserId::from("u-bob"), &full),
            Err(BoardError::MaxBoardUsersReached)
        ));
    }

    #[test]
    fn test_apply_accept_delta() {
        let mut agg = aggregate();
        let invite = viewer_invite(None);
        let invite_id = invite.invite_id.clone();
        agg.apply(&AggregateDelta::new().upsert_invite(invite.clone()));

        let bob = User::new("u-bob", "Bob");
        let member = BoardMember::joined(bob.clone(), invite.role, invite.created_by, Utc::now());
        agg.apply(&AggregateDelta::new().remove_invite(invite_id.clone()).upsert_member(member));

        assert!(agg.invite(&invite_id).is_none());
        assert_eq!(agg.member(&bob.user_id).unwrap().role, BoardRole::Viewer);
    }
}
