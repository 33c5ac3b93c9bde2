// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Link Domain Service
//!
//! Validates and stores links on top of a [`LinkStore`]. Like
//! `StandardBoardService` it performs no authorization; `LinkAccessService`
//! does that. It also does not check that the board exists: links are
//! reached through the board's scopes, which only members of an existing
//! board hold.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::domain::board::BoardId;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::errors::BoardError;
use crate::domain::events::{BoardEvent, EventPublisher, NoopEventPublisher};
use crate::domain::link::{Link, LinkId};
use crate::domain::repository::{LinkStore, QueryParams, RepositoryError};
use crate::domain::user::User;

#[async_trait]
pub trait LinkService: Send + Sync {
    async fn create_link(
        &self,
        board_id: &BoardId,
        title: &str,
        url: &str,
        creator: &User,
    ) -> Result<Link, BoardError>;

    async fn get_link(&self, board_id: &BoardId, link_id: &LinkId) -> Result<Link, BoardError>;

    /// Fails with `LinkNotFound` when nothing was removed.
    async fn delete_link(
        &self,
        board_id: &BoardId,
        link_id: &LinkId,
        actor: &User,
    ) -> Result<(), BoardError>;

    /// Links on the board, newest first.
    async fn links(&self, board_id: &BoardId, params: &QueryParams) -> Result<Vec<Link>, BoardError>;

    /// Drop every link of a deleted board. Returns how many were removed.
    async fn remove_board_links(&self, board_id: &BoardId) -> Result<usize, BoardError>;
}

pub struct StandardLinkService {
    store: Arc<dyn LinkStore>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl StandardLinkService {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self {
            store,
            event_publisher: Arc::new(NoopEventPublisher),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = publisher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn publish(&self, event: BoardEvent) {
        debug!(event = event.name(), board_id = %event.board_id(), "Publishing link event");
        self.event_publisher.publish(event);
    }
}

fn map_link_error(
    operation: &'static str,
    board_id: &BoardId,
    link_id: Option<&LinkId>,
    err: RepositoryError,
) -> BoardError {
    match (err, link_id) {
        (RepositoryError::NotFound(_), Some(link_id)) => BoardError::LinkNotFound(link_id.clone()),
        (other, _) => {
            error!(operation, board_id = %board_id, "Link store failure: {}", other);
            BoardError::Store(other)
        }
    }
}

#[async_trait]
impl LinkService for StandardLinkService {
    async fn create_link(
        &self,
        board_id: &BoardId,
        title: &str,
        url: &str,
        creator: &User,
    ) -> Result<Link, BoardError> {
        let link = Link::new(board_id.clone(), title, url, creator.clone(), self.clock.now())?;
        self.store
            .insert_link(&link)
            .await
            .map_err(|e| map_link_error("create_link", board_id, None, e))?;

        info!(board_id = %board_id, link_id = %link.link_id, user_id = %creator.user_id, "Link created");
        self.publish(BoardEvent::LinkCreated {
            board_id: board_id.clone(),
            link_id: link.link_id.clone(),
            title: link.title.clone(),
            url: link.url.clone(),
            created_by: creator.clone(),
        });
        Ok(link)
    }

    async fn get_link(&self, board_id: &BoardId, link_id: &LinkId) -> Result<Link, BoardError> {
        self.store
            .read_link(board_id, link_id)
            .await
            .map_err(|e| map_link_error("get_link", board_id, Some(link_id), e))
    }

    async fn delete_link(
        &self,
        board_id: &BoardId,
        link_id: &LinkId,
        actor: &User,
    ) -> Result<(), BoardError> {
        let removed = self
            .store
            .delete_link(board_id, link_id)
            .await
            .map_err(|e| map_link_error("delete_link", board_id, Some(link_id), e))?;
        if !removed {
            return Err(BoardError::LinkNotFound(link_id.clone()));
        }

        info!(board_id = %board_id, link_id = %link_id, user_id = %actor.user_id, "Link deleted");
        self.publish(BoardEvent::LinkDeleted {
            board_id: board_id.clone(),
            link_id: link_id.clone(),
            deleted_by: actor.clone(),
        });
        Ok(())
    }

    async fn links(&self, board_id: &BoardId, params: &QueryParams) -> Result<Vec<Link>, BoardError> {
        self.store
            .query_links(board_id, params)
            .await
            .map_err(|e| map_link_error("links", board_id, None, e))
    }

    async fn remove_board_links(&self, board_id: &BoardId) -> Result<usize, BoardError> {
        self.store
            .delete_links_for_board(board_id)
            .await
            .map_err(|e| map_link_error("remove_board_links", board_id, None, e))
    }
}
