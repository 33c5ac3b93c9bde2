// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod authorization;
pub mod board_service;
pub mod access;
pub mod link_access;
pub mod link_cascade;
pub mod link_service;
pub mod metrics;
pub mod repository_factory;

pub use access::{BoardAccessService, BoardView, BoardsAndInvites, InviteResponse, RequestContext};
pub use authorization::{AuthorizationEngine, AuthorizationError, MemberRoleResolver, RoleResolver};
pub use board_service::{BoardService, StandardBoardService};
pub use link_access::LinkAccessService;
pub use link_cascade::BoardLinkCascade;
pub use link_service::{LinkService, StandardLinkService};
