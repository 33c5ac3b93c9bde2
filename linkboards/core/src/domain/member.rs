// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::BoardError;
use crate::domain::role::BoardRole;
use crate::domain::user::User;

/// A user's membership on one board. Keyed by `user.user_id` within the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMember {
    pub user: User,
    pub role: BoardRole,
    pub created_time: DateTime<Utc>,
    pub invited_by: User,
    pub modified_time: DateTime<Utc>,
    pub modified_by: User,
}

impl BoardMember {
    /// The creator's own membership record.
    pub fn owner(creator: User, now: DateTime<Utc>) -> Self {
        Self {
            user: creator.clone(),
            role: BoardRole::Owner,
            created_time: now,
            invited_by: creator.clone(),
            modified_time: now,
            modified_by: creator,
        }
    }

    /// A membership created by accepting an invite issued by `invited_by`.
    pub fn joined(user: User, role: BoardRole, invited_by: User, now: DateTime<Utc>) -> Self {
        Self {
            user,
            role,
            created_time: now,
            invited_by: invited_by.clone(),
            modified_time: now,
            modified_by: invited_by,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == BoardRole::Owner
    }

    /// Change the member's role. The owner's role is fixed and nobody can be
    /// promoted to owner.
    pub fn change_role(
        &mut self,
        role: BoardRole,
        actor: User,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        if self.is_owner() {
            return Err(BoardError::CannotChangeRoleOfOwner);
        }
        if !role.is_assignable() {
            return Err(BoardError::OnlyCreatorCanBeOwner);
        }
        self.role = role;
        self.modified_time = now;
        self.modified_by = actor;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMemberEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<BoardRole>,
}

impl BoardMemberEdit {
    pub fn is_empty(&self) -> bool {
        self.role.is_none()
    }

    /// Structural check, run before any store access. Role rules depend on
    /// the stored member and are checked by [`BoardMember::change_role`].
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.is_empty() {
            return Err(BoardError::EmptyUpdate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_role_is_fixed() {
        let alice = User::new("u-alice", "Alice");
        let mut owner = BoardMember::owner(alice.clone(), Utc::now());

        assert!(matches!(
            owner.change_role(BoardRole::Viewer, alice.clone(), Utc::now()),
            Err(BoardError::CannotChangeRoleOfOwner)
        ));
        // owner check wins even when the target role is also owner
        assert!(matches!(
            owner.change_role(BoardRole::Owner, alice, Utc::now()),
            Err(BoardError::CannotChangeRoleOfOwner)
        ));
    }

    #[test]
    fn test_no_promotion_to_owner() {
        let alice = User::new("u-alice", "Alice");
        let bob = User::new("u-bob", "Bob");
        let mut member = BoardMember::joined(bob, BoardRole::Viewer, alice.clone(), Utc::now());

        assert!(matches!(
            member.change_role(BoardRole::Owner, alice.clone(), Utc::now()),
            Err(BoardError::OnlyCreatorCanBeOwner)
        ));
        member.change_role(BoardRole::Editor, alice.clone(), Utc::now()).unwrap();
        assert_eq!(member.role, BoardRole::Editor);
        assert_eq!(member.modified_by, alice);
    }

    #[test]
    fn test_edit_validation() {
        assert!(matches!(BoardMemberEdit::default().validate(), Err(BoardError::EmptyUpdate)));
        let edit = BoardMemberEdit { role: Some(BoardRole::Owner) };
        assert!(edit.validate().is_ok());
    }
}
