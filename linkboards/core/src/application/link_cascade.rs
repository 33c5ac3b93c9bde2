// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Board Link Cascade
//!
//! Removes a board's links after the board is deleted. Runs as a background
//! task on the event bus, so links disappear shortly after their board
//! rather than in the same commit. Callers that drain events themselves
//! (the embedded CLI) call [`BoardLinkCascade::handle`] directly.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::link_service::LinkService;
use crate::domain::errors::BoardError;
use crate::domain::events::BoardEvent;
use crate::infrastructure::event_bus::{EventBus, EventBusError};

// ============================================================================
// Service
// ============================================================================

pub struct BoardLinkCascade {
    links: Arc<dyn LinkService>,
}

impl BoardLinkCascade {
    pub fn new(links: Arc<dyn LinkService>) -> Self {
        Self { links }
    }

    /// Apply one event. Returns the number of links removed.
    pub async fn handle(&self, event: &BoardEvent) -> Result<usize, BoardError> {
        let BoardEvent::BoardDeleted { board_id, .. } = event else {
            return Ok(0);
        };
        let removed = self.links.remove_board_links(board_id).await?;
        if removed > 0 {
            info!(board_id = %board_id, removed, "Removed links of deleted board");
        }
        Ok(removed)
    }

    /// Subscribe to `event_bus` and apply events until `shutdown` fires or
    /// the bus closes. The subscription is taken before this returns, so no
    /// event published afterwards is missed.
    pub fn start(self: Arc<Self>, event_bus: &EventBus, shutdown: CancellationToken) -> JoinHandle<()> {
        info!("Starting board link cascade");
        let mut receiver = event_bus.subscribe();

        tokio::spawn(async move {
            let mut failures = 0u64;
            loop {
                let next = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = receiver.recv() => next,
                };

                match next {
                    Ok(event) => {
                        if let Err(e) = self.handle(&event).await {
                            failures += 1;
                            error!(
                                event = event.name(),
                                board_id = %event.board_id(),
                                error = %e,
                                "Failed to remove links of deleted board"
                            );
                        }
                    }
                    Err(EventBusError::Closed) => {
                        debug!("Event bus closed");
                        break;
                    }
                    Err(EventBusError::Lagged(n)) => {
                        warn!("Board link cascade lagged by {} events, some links may remain", n);
                    }
                    Err(e) => {
                        error!(error = %e, "Unexpected error receiving event from bus");
                    }
                }
            }
            info!(failures, "Board link cascade stopped");
        })
    }
}
