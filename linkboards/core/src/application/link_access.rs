// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Link Access Service
//!
//! Caller-facing layer for links, guarded the same way as
//! `BoardAccessService`: authentication, a scope check on the board, then
//! delegation to the [`LinkService`] under the caller's cancellation and
//! deadline.

use std::sync::Arc;
use std::time::Duration;

use crate::application::access::{
    authenticate, guarded, require_scope, RequestContext, DEFAULT_OPERATION_TIMEOUT,
};
use crate::application::authorization::AuthorizationEngine;
use crate::application::link_service::LinkService;
use crate::domain::board::BoardId;
use crate::domain::errors::BoardError;
use crate::domain::link::{Link, LinkId};
use crate::domain::repository::QueryParams;
use crate::domain::role::Scope;

pub struct LinkAccessService {
    links: Arc<dyn LinkService>,
    authorization: AuthorizationEngine,
    operation_timeout: Duration,
}

impl LinkAccessService {
    pub fn new(links: Arc<dyn LinkService>, authorization: AuthorizationEngine) -> Self {
        Self {
            links,
            authorization,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn create_link(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        title: &str,
        url: &str,
    ) -> Result<Link, BoardError> {
        guarded(ctx, self.operation_timeout, "create_link", async {
            let caller = authenticate(ctx)?;
            require_scope(&self.authorization, board_id, caller, &Scope::CREATE_LINK).await?;
            self.links.create_link(board_id, title, url, caller).await
        })
        .await
    }

    pub async fn link(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        link_id: &LinkId,
    ) -> Result<Link, BoardError> {
        guarded(ctx, self.operation_timeout, "link", async {
            let caller = authenticate(ctx)?;
            require_scope(&self.authorization, board_id, caller, &Scope::QUERY_LINKS).await?;
            self.links.get_link(board_id, link_id).await
        })
        .await
    }

    /// Links on the board, newest first.
    pub async fn links(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        params: &QueryParams,
    ) -> Result<Vec<Link>, BoardError> {
        guarded(ctx, self.operation_timeout, "links", async {
            let caller = authenticate(ctx)?;
            require_scope(&self.authorization, board_id, caller, &Scope::QUERY_LINKS).await?;
            self.links.links(board_id, params).await
        })
        .await
    }

    /// Delete a link. Its creator may always delete it; anyone else needs
    /// `links:delete`. Whether a link exists is only revealed to callers
    /// holding `links:query`.
    pub async fn delete_link(
        &self,
        ctx: &RequestContext,
        board_id: &BoardId,
        link_id: &LinkId,
    ) -> Result<(), BoardError> {
        guarded(ctx, self.operation_timeout, "delete_link", async {
            let caller = authenticate(ctx)?;
            let scopes = require_scope(&self.authorization, board_id, caller, &Scope::QUERY_LINKS).await?;
            let link = self.links.get_link(board_id, link_id).await?;
            if !link.is_created_by(caller) && !scopes.has(&Scope::DELETE_LINK) {
                return Err(BoardError::PermissionDenied);
            }
            self.links.delete_link(board_id, link_id, caller).await
        })
        .await
    }
}
