// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::BoardError;
use crate::domain::user::User;

pub const MAX_BOARD_NAME_BYTES: usize = 100;
pub const MAX_BOARD_DESCRIPTION_BYTES: usize = 1000;

// ============================================================================
// Value Objects
// ============================================================================

/// Unique identifier for a board, `b-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(pub String);

impl BoardId {
    pub fn new() -> Self {
        Self(format!("b-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for BoardId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for BoardId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for BoardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Partial update of a board's descriptive fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BoardEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

// ============================================================================
// Board
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub board_id: BoardId,
    pub name: String,
    pub description: String,
    pub created_time: DateTime<Utc>,
    pub created_by: User,
    pub modified_time: DateTime<Utc>,
    pub modified_by: User,
}

impl Board {
    /// Build a new board owned by `creator`. The modification stamp starts
    /// equal to the creation stamp.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        creator: User,
        now: DateTime<Utc>,
    ) -> Result<Self, BoardError> {
        let name = name.into();
        let description = description.into();
        validate_name(&name)?;
        validate_description(&description)?;
        creator.ensure_identified()?;

        Ok(Self {
            board_id: BoardId::new(),
            name,
            description,
            created_time: now,
            created_by: creator.clone(),
            modified_time: now,
            modified_by: creator,
        })
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        validate_name(&self.name)?;
        validate_description(&self.description)
    }

    /// Apply `edit` and stamp the modification. The edit must already be
    /// validated and non-empty.
    pub fn apply_edit(&mut self, edit: &BoardEdit, editor: User, now: DateTime<Utc>) {
        if let Some(name) = &edit.name {
            self.name = name.clone();
        }
        if let Some(description) = &edit.description {
            self.description = description.clone();
        }
        self.modified_time = now;
        self.modified_by = editor;
    }
}

fn validate_name(name: &str) -> Result<(), BoardError> {
    if name.is_empty() {
        return Err(BoardError::BoardNameEmpty);
    }
    if name.len() > MAX_BOARD_NAME_BYTES {
        return Err(BoardError::BoardNameTooLong { max: MAX_BOARD_NAME_BYTES });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), BoardError> {
    if description.len() > MAX_BOARD_DESCRIPTION_BYTES {
        return Err(BoardError::BoardDescriptionTooLong { max: MAX_BOARD_DESCRIPTION_BYTES });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("u-alice", "Alice")
    }

    #[test]
    fn test_board_creation() {
        let now = Utc::now();
        let board = Board::new("Reading list", "", alice(), now).unwrap();

        assert!(board.board_id.as_str().starts_with("b-"));
        assert_eq!(board.created_time, board.modified_time);
        assert_eq!(board.created_by, board.modified_by);
    }

    #[test]
    fn test_name_bounds() {
        let now = Utc::now();
        assert!(matches!(Board::new("", "", alice(), now), Err(BoardError::BoardNameEmpty)));
        assert!(Board::new("x".repeat(100), "", alice(), now).is_ok());
        assert!(matches!(
            Board::new("x".repeat(101), "", alice(), now),
            Err(BoardError::BoardNameTooLong { max: 100 })
        ));
    }

    #[test]
    fn test_name_limit_counts_bytes() {
        // 34 three-byte characters exceed 100 bytes while staying under 100 chars
        let name = "€".repeat(34);
        assert!(matches!(
            Board::new(name, "", alice(), Utc::now()),
            Err(BoardError::BoardNameTooLong { .. })
        ));
    }

    #[test]
    fn test_description_bounds() {
        let now = Utc::now();
        assert!(Board::new("b", "d".repeat(1000), alice(), now).is_ok());
        assert!(matches!(
            Board::new("b", "d".repeat(1001), alice(), now),
            Err(BoardError::BoardDescriptionTooLong { max: 1000 })
        ));
    }

    #[test]
    fn test_empty_creator_rejected() {
        assert!(matches!(
            Board::new("b", "", User::new("", "nobody"), Utc::now()),
            Err(BoardError::EmptyUserId)
        ));
    }

    #[test]
    fn test_apply_edit_stamps_modification() {
        let created = Utc::now();
        let mut board = Board::new("b", "old", alice(), created).unwrap();
        let bob = User::new("u-bob", "Bob");
        let later = created + chrono::Duration::minutes(5);

        let edit = BoardEdit { name: None, description: Some("new".to_string()) };
        board.apply_edit(&edit, bob.clone(), later);

        assert_eq!(board.name, "b");
        assert_eq!(board.description, "new");
        assert_eq!(board.modified_by, bob);
        assert_eq!(board.modified_time, later);
        assert_eq!(board.created_time, created);
    }

    #[test]
    fn test_edit_validation() {
        assert!(BoardEdit::default().is_empty());
        let edit = BoardEdit { name: Some(String::new()), description: None };
        assert!(!edit.is_empty());
        assert!(matches!(edit.validate(), Err(BoardError::BoardNameEmpty)));
    }
}
