// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::board::BoardId;
use crate::domain::invite::InviteId;
use crate::domain::link::LinkId;
use crate::domain::role::BoardRole;
use crate::domain::user::{User, UserId};

/// Domain events emitted after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoardEvent {
    BoardCreated {
        board_id: BoardId,
        name: String,
        description: String,
        created_time: DateTime<Utc>,
        created_by: User,
    },
    BoardEdited {
        board_id: BoardId,
        modified_time: DateTime<Utc>,
        modified_by: User,
    },
    BoardDeleted {
        board_id: BoardId,
        deleted_by: User,
    },
    InviteCreated {
        board_id: BoardId,
        invite_id: InviteId,
        role: BoardRole,
        target_user: Option<UserId>,
        created_by: User,
        expires_time: DateTime<Utc>,
    },
    InviteAccepted {
        board_id: BoardId,
        invite_id: InviteId,
        user: User,
        role: BoardRole,
    },
    InviteDeclined {
        board_id: BoardId,
        invite_id: InviteId,
        user: User,
    },
    InviteDeleted {
        board_id: BoardId,
        invite_id: InviteId,
    },
    MemberRemoved {
        board_id: BoardId,
        user_id: UserId,
    },
    MemberRoleChanged {
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
        modified_by: User,
    },
    LinkCreated {
        board_id: BoardId,
        link_id: LinkId,
        title: String,
        url: String,
        created_by: User,
    },
    LinkDeleted {
        board_id: BoardId,
        link_id: LinkId,
        deleted_by: User,
    },
}

impl BoardEvent {
    pub fn board_id(&self) -> &BoardId {
        match self {
            Self::BoardCreated { board_id, .. }
            | Self::BoardEdited { board_id, .. }
            | Self::BoardDeleted { board_id, .. }
            | Self::InviteCreated { board_id, .. }
            | Self::InviteAccepted { board_id, .. }
            | Self::InviteDeclined { board_id, .. }
            | Self::InviteDeleted { board_id, .. }
            | Self::MemberRemoved { board_id, .. }
            | Self::MemberRoleChanged { board_id, .. }
            | Self::LinkCreated { board_id, .. }
            | Self::LinkDeleted { board_id, .. } => board_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BoardCreated { .. } => "board_created",
            Self::BoardEdited { .. } => "board_edited",
            Self::BoardDeleted { .. } => "board_deleted",
            Self::InviteCreated { .. } => "invite_created",
            Self::InviteAccepted { .. } => "invite_accepted",
            Self::InviteDeclined { .. } => "invite_declined",
            Self::InviteDeleted { .. } => "invite_deleted",
            Self::MemberRemoved { .. } => "member_removed",
            Self::MemberRoleChanged { .. } => "member_role_changed",
            Self::LinkCreated { .. } => "link_created",
            Self::LinkDeleted { .. } => "link_deleted",
        }
    }
}

/// Fire-and-forget event sink. Publishing never fails the calling operation.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: BoardEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

impl EventPublisher for NoopEventPublisher {
    fn publish(&self, _event: BoardEvent) {}
}
