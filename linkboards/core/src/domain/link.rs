// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Links
//!
//! A link is a titled `https` URL posted to one board. Links live outside
//! the board aggregate: they are stored per board in a [`LinkStore`] and are
//! never versioned, since creating or deleting one touches no board
//! invariant. Deleting a board removes its links through the `BoardDeleted`
//! event.
//!
//! [`LinkStore`]: crate::domain::repository::LinkStore

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::board::BoardId;
use crate::domain::errors::BoardError;
use crate::domain::user::User;

pub const MAX_LINK_TITLE_BYTES: usize = 200;

/// Unique identifier for a link, `l-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub String);

impl LinkId {
    pub fn new() -> Self {
        Self(format!("l-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for LinkId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub board_id: BoardId,
    pub link_id: LinkId,
    pub title: String,
    pub url: String,
    pub created_time: DateTime<Utc>,
    pub created_by: User,
}

impl Link {
    pub fn new(
        board_id: BoardId,
        title: impl Into<String>,
        url: impl Into<String>,
        created_by: User,
        now: DateTime<Utc>,
    ) -> Result<Self, BoardError> {
        let title = title.into();
        let url = url.into();
        validate_title(&title)?;
        validate_url(&url)?;

        Ok(Self {
            board_id,
            link_id: LinkId::new(),
            title,
            url,
            created_time: now,
            created_by,
        })
    }

    pub fn is_created_by(&self, user: &User) -> bool {
        self.created_by.user_id == user.user_id
    }
}

fn validate_title(title: &str) -> Result<(), BoardError> {
    if title.is_empty() {
        return Err(BoardError::LinkTitleEmpty);
    }
    if title.len() > MAX_LINK_TITLE_BYTES {
        return Err(BoardError::LinkTitleTooLong { max: MAX_LINK_TITLE_BYTES });
    }
    Ok(())
}

/// Only absolute `https` URLs are accepted.
fn validate_url(url: &str) -> Result<(), BoardError> {
    if url.is_empty() {
        return Err(BoardError::LinkUrlEmpty);
    }
    let parsed = Url::parse(url).map_err(|e| BoardError::LinkUrlInvalid(e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(BoardError::LinkUrlInvalid(format!(
            "scheme '{}' is not allowed",
            parsed.scheme()
        )));
    }
    Ok(())
}
