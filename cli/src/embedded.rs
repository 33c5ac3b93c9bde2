// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Embedded mode execution
//!
//! Creates the stores and services in-process for a single command and
//! tears them down afterwards. Events published during the command are
//! applied to the link cascade on shutdown, so a deleted board's links go
//! with it before the store is flushed.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use linkboards_core::application::metrics::describe_metrics;
use linkboards_core::application::repository_factory::{create_stores, Stores};
use linkboards_core::application::{
    AuthorizationEngine, BoardAccessService, BoardLinkCascade, LinkAccessService,
    MemberRoleResolver, StandardBoardService, StandardLinkService,
};
use linkboards_core::domain::config::LinkboardsConfig;
use linkboards_core::domain::events::BoardEvent;
use linkboards_core::infrastructure::{EventBus, EventReceiver};

pub struct EmbeddedBoards {
    access: BoardAccessService,
    links: LinkAccessService,
    cascade: BoardLinkCascade,
    stores: Stores,
    events: EventReceiver,
}

impl EmbeddedBoards {
    pub fn new(config: &LinkboardsConfig) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;
        describe_metrics();

        let stores = create_stores(&config.storage_backend())
            .context("Failed to open stores")?;
        let event_bus = Arc::new(EventBus::new(config.events.bus_capacity));
        let events = event_bus.subscribe();

        let service = Arc::new(
            StandardBoardService::new(stores.boards.clone())
                .with_event_publisher(event_bus.clone())
                .with_limits(config.board_limits()),
        );
        let link_service = Arc::new(
            StandardLinkService::new(stores.links.clone()).with_event_publisher(event_bus),
        );
        let authorization = AuthorizationEngine::new(
            Arc::new(MemberRoleResolver::new(stores.boards.clone())),
            Arc::new(config.role_table()),
        );
        let access = BoardAccessService::new(service, authorization.clone())
            .with_operation_timeout(config.operation_timeout());
        let links = LinkAccessService::new(link_service.clone(), authorization)
            .with_operation_timeout(config.operation_timeout());

        Ok(Self {
            access,
            links,
            cascade: BoardLinkCascade::new(link_service),
            stores,
            events,
        })
    }

    pub fn access(&self) -> &BoardAccessService {
        &self.access
    }

    pub fn links(&self) -> &LinkAccessService {
        &self.links
    }

    /// Apply pending events, flush the stores and return the events
    /// published during this run.
    pub async fn shutdown(mut self) -> Result<Vec<BoardEvent>> {
        let mut published = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            debug!(event = event.name(), board_id = %event.board_id(), "Board event");
            self.cascade
                .handle(&event)
                .await
                .context("Failed to remove links of deleted board")?;
            published.push(event);
        }

        self.stores
            .boards
            .flush()
            .await
            .context("Failed to flush board store")?;
        self.stores
            .links
            .flush()
            .await
            .context("Failed to flush link store")?;
        Ok(published)
    }
}
