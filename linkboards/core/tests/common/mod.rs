// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use linkboards_core::application::{
    AuthorizationEngine, BoardAccessService, LinkAccessService, MemberRoleResolver,
    StandardBoardService, StandardLinkService,
};
use linkboards_core::domain::aggregate::BoardLimits;
use linkboards_core::domain::board::{Board, BoardId};
use linkboards_core::domain::clock::ManualClock;
use linkboards_core::domain::member::BoardMember;
use linkboards_core::domain::repository::{
    AggregateDelta, BoardAggregateStore, ConcurrencyToken, LinkStore,
};
use linkboards_core::domain::role::RoleScopeTable;
use linkboards_core::domain::user::User;
use linkboards_core::infrastructure::repositories::{InMemoryBoardStore, InMemoryLinkStore};
use linkboards_core::infrastructure::EventBus;

pub fn user(id: &str) -> User {
    User::new(id, id.trim_start_matches("u-"))
}

/// Fixed instant `secs` seconds after an arbitrary epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

/// Create a board owned by `owner` directly through the store.
pub async fn seed_board(
    store: &dyn BoardAggregateStore,
    owner: &User,
    name: &str,
    created: DateTime<Utc>,
) -> (BoardId, ConcurrencyToken) {
    let board = Board::new(name, "", owner.clone(), created).unwrap();
    let board_id = board.board_id.clone();
    let delta = AggregateDelta::new()
        .with_board(board)
        .upsert_member(BoardMember::owner(owner.clone(), created));
    let token = store.write_aggregate(&board_id, None, delta).await.unwrap();
    (board_id, token)
}

pub struct Harness {
    pub store: Arc<dyn BoardAggregateStore>,
    pub clock: Arc<ManualClock>,
    pub events: EventBus,
    pub service: Arc<StandardBoardService>,
    pub access: BoardAccessService,
    pub link_store: Arc<dyn LinkStore>,
    pub links: Arc<StandardLinkService>,
    pub link_access: LinkAccessService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(BoardLimits::default())
    }

    pub fn with_limits(limits: BoardLimits) -> Self {
        let store: Arc<dyn BoardAggregateStore> = Arc::new(InMemoryBoardStore::new());
        let clock = Arc::new(ManualClock::new(at(0)));
        let events = EventBus::new(64);
        let service = Arc::new(
            StandardBoardService::new(store.clone())
                .with_clock(clock.clone())
                .with_event_publisher(Arc::new(events.clone()))
                .with_limits(limits),
        );
        let authorization = AuthorizationEngine::new(
            Arc::new(MemberRoleResolver::new(store.clone())),
            Arc::new(RoleScopeTable::default()),
        );
        let access = BoardAccessService::new(service.clone(), authorization.clone());

        let link_store: Arc<dyn LinkStore> = Arc::new(InMemoryLinkStore::new());
        let links = Arc::new(
            StandardLinkService::new(link_store.clone())
                .with_clock(clock.clone())
                .with_event_publisher(Arc::new(events.clone())),
        );
        let link_access = LinkAccessService::new(links.clone(), authorization);
        Self {
            store,
            clock,
            events,
            service,
            access,
            link_store,
            links,
            link_access,
        }
    }
}
