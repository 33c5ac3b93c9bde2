// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Authorization Engine
//!
//! Resolves a caller's roles on a board through a [`RoleResolver`] and maps
//! them to the union of their scopes using the shared [`RoleScopeTable`].
//! An absent board and a caller without a role on it are indistinguishable:
//! both are `PermissionDenied`.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::board::BoardId;
use crate::domain::errors::BoardError;
use crate::domain::repository::{BoardAggregateStore, RepositoryError};
use crate::domain::role::{BoardRole, RoleScopeTable, ScopeSet};
use crate::domain::user::UserId;

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("role lookup failed: {0}")]
    Internal(String),
}

impl From<AuthorizationError> for BoardError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::PermissionDenied => BoardError::PermissionDenied,
            AuthorizationError::Internal(msg) => BoardError::Internal(msg),
        }
    }
}

/// Looks up the roles a user holds on a board.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Fails with `PermissionDenied` when the board does not exist or the
    /// user holds no role on it.
    async fn roles(&self, board_id: &BoardId, user_id: &UserId) -> Result<Vec<BoardRole>, AuthorizationError>;
}

/// Derives roles from the member records of the aggregate store.
pub struct MemberRoleResolver {
    store: Arc<dyn BoardAggregateStore>,
}

impl MemberRoleResolver {
    pub fn new(store: Arc<dyn BoardAggregateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleResolver for MemberRoleResolver {
    async fn roles(&self, board_id: &BoardId, user_id: &UserId) -> Result<Vec<BoardRole>, AuthorizationError> {
        let (aggregate, _) = match self.store.read_aggregate(board_id).await {
            Ok(found) => found,
            Err(RepositoryError::NotFound(_)) => return Err(AuthorizationError::PermissionDenied),
            Err(e) => {
                error!(board_id = %board_id, "Role lookup failed: {}", e);
                return Err(AuthorizationError::Internal(e.to_string()));
            }
        };

        let roles = aggregate.roles_of(user_id);
        if roles.is_empty() {
            return Err(AuthorizationError::PermissionDenied);
        }
        Ok(roles)
    }
}

#[derive(Clone)]
pub struct AuthorizationEngine {
    resolver: Arc<dyn RoleResolver>,
    table: Arc<RoleScopeTable>,
}

impl AuthorizationEngine {
    pub fn new(resolver: Arc<dyn RoleResolver>, table: Arc<RoleScopeTable>) -> Self {
        Self { resolver, table }
    }

    /// Scopes `user_id` holds on `board_id`.
    pub async fn authorize(&self, board_id: &BoardId, user_id: &UserId) -> Result<ScopeSet, AuthorizationError> {
        let roles = self.resolver.roles(board_id, user_id).await?;
        if roles.is_empty() {
            return Err(AuthorizationError::PermissionDenied);
        }
        let scopes = self.table.resolve(&roles);
        debug!(
            board_id = %board_id,
            user_id = %user_id,
            roles = ?roles,
            scopes = scopes.len(),
            "Authorized caller on board"
        );
        Ok(scopes)
    }

    /// Scopes every identified caller holds, without a board lookup.
    pub fn authenticated_scopes(&self) -> &ScopeSet {
        self.table.authenticated()
    }
}
