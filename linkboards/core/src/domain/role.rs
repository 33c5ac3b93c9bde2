// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Roles and Scopes
//!
//! A caller's capabilities on a board are the union of the scopes granted to
//! each of their roles. Grants are purely additive; there is no explicit deny.
//!
//! The [`RoleScopeTable`] is built once (defaults or configuration) and then
//! shared read-only behind an `Arc`.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::BoardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardRole {
    Owner,
    Editor,
    Viewer,
}

impl BoardRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Roles that can be granted through an invitation or a member edit.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::Owner)
    }
}

impl FromStr for BoardRole {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(BoardError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for BoardRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named permission, e.g. `boards:edit`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(Cow<'static, str>);

impl Scope {
    pub const CREATE_BOARD: Scope = Scope::from_static("boards:create");
    pub const DELETE_BOARD: Scope = Scope::from_static("boards:delete");
    pub const EDIT_BOARD: Scope = Scope::from_static("boards:edit");
    pub const VIEW_BOARD: Scope = Scope::from_static("boards:view");
    pub const VIEW_BOARD_USERS: Scope = Scope::from_static("boards:viewUsers");
    pub const VIEW_BOARD_INVITES: Scope = Scope::from_static("boards:viewInvites");
    pub const LIST_BOARDS: Scope = Scope::from_static("boards:list");
    pub const CREATE_INVITE: Scope = Scope::from_static("boards:invite");
    pub const DELETE_INVITE: Scope = Scope::from_static("boards:deleteInvite");
    pub const RESPOND_TO_INVITE: Scope = Scope::from_static("boards:respondToInvite");
    pub const LIST_USER_INVITES: Scope = Scope::from_static("boards:listUserInvites");
    pub const REMOVE_USER: Scope = Scope::from_static("boards:removeUser");
    pub const EDIT_BOARD_USERS: Scope = Scope::from_static("boards:editUsers");
    pub const CREATE_LINK: Scope = Scope::from_static("links:create");
    pub const DELETE_LINK: Scope = Scope::from_static("links:delete");
    pub const QUERY_LINKS: Scope = Scope::from_static("links:query");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(HashSet<Scope>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, scope: &Scope) -> bool {
        self.0.contains(scope)
    }

    pub fn insert(&mut self, scope: Scope) {
        self.0.insert(scope);
    }

    pub fn union_with(&mut self, other: &ScopeSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sorted scope names, for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(Scope::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Immutable role → scopes mapping, plus the scopes any identified caller
/// holds without a board lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleScopeTable {
    roles: HashMap<BoardRole, ScopeSet>,
    authenticated: ScopeSet,
}

impl RoleScopeTable {
    pub fn new(roles: HashMap<BoardRole, ScopeSet>, authenticated: ScopeSet) -> Self {
        Self { roles, authenticated }
    }

    /// Replace the scopes of the given roles, keeping the rest of the table.
    pub fn with_overrides(mut self, overrides: &HashMap<BoardRole, Vec<String>>) -> Self {
        for (role, names) in overrides {
            let scopes = names.iter().map(|n| Scope::new(n.clone())).collect();
            self.roles.insert(*role, scopes);
        }
        self
    }

    pub fn scopes_for(&self, role: BoardRole) -> Option<&ScopeSet> {
        self.roles.get(&role)
    }

    pub fn authenticated(&self) -> &ScopeSet {
        &self.authenticated
    }

    /// Union of the scopes of all `roles`. Unknown roles contribute nothing.
    pub fn resolve(&self, roles: &[BoardRole]) -> ScopeSet {
        let mut granted = ScopeSet::new();
        for role in roles {
            if let Some(scopes) = self.roles.get(role) {
                granted.union_with(scopes);
            }
        }
        granted
    }
}

impl Default for RoleScopeTable {
    fn default() -> Self {
        let editor: Vec<Scope> = vec![
            Scope::EDIT_BOARD,
            Scope::VIEW_BOARD,
            Scope::VIEW_BOARD_USERS,
            Scope::VIEW_BOARD_INVITES,
            Scope::REMOVE_USER,
            Scope::EDIT_BOARD_USERS,
            Scope::CREATE_INVITE,
            Scope::DELETE_INVITE,
            Scope::RESPOND_TO_INVITE,
            Scope::CREATE_LINK,
            Scope::DELETE_LINK,
            Scope::QUERY_LINKS,
        ];
        let owner: ScopeSet = editor
            .iter()
            .cloned()
            .chain(std::iter::once(Scope::DELETE_BOARD))
            .collect();

        let mut roles = HashMap::new();
        roles.insert(BoardRole::Owner, owner);
        roles.insert(BoardRole::Editor, editor.into_iter().collect());
        roles.insert(
            BoardRole::Viewer,
            [
                Scope::VIEW_BOARD,
                Scope::RESPOND_TO_INVITE,
                Scope::CREATE_LINK,
                Scope::QUERY_LINKS,
            ]
            .into_iter()
            .collect(),
        );

        let authenticated = [
            Scope::CREATE_BOARD,
            Scope::LIST_BOARDS,
            Scope::RESPOND_TO_INVITE,
            Scope::LIST_USER_INVITES,
        ]
        .into_iter()
        .collect();

        Self { roles, authenticated }
    }
}
