// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;

use linkboards_core::application::{InviteResponse, RequestContext};
use linkboards_core::domain::board::BoardId;
use linkboards_core::domain::invite::InviteId;
use linkboards_core::domain::role::BoardRole;
use linkboards_core::domain::user::User;

use super::{parse_role, PageArgs};
use crate::embedded::EmbeddedBoards;
use crate::output::{print_json, print_ok, public};

#[derive(Subcommand)]
pub enum InviteCommand {
    /// Invite a user, or anyone when no target is given
    Create {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        /// Role granted on acceptance (editor or viewer)
        #[arg(long, value_parser = parse_role, default_value = "viewer")]
        role: BoardRole,

        /// User id the invite is reserved for
        #[arg(long, value_name = "USER_ID")]
        target: Option<String>,

        /// Display name of the target user
        #[arg(long, requires = "target")]
        target_name: Option<String>,
    },

    /// Accept an invite and join the board
    Accept {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "INVITE_ID")]
        invite_id: String,
    },

    /// Decline an invite addressed to the caller
    Decline {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "INVITE_ID")]
        invite_id: String,
    },

    /// Revoke a pending invite
    Delete {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "INVITE_ID")]
        invite_id: String,
    },

    /// List invites addressed to the caller, newest first
    List {
        #[command(flatten)]
        page: PageArgs,
    },
}

pub async fn handle_command(
    command: InviteCommand,
    boards: &EmbeddedBoards,
    ctx: &RequestContext,
) -> Result<()> {
    let access = boards.access();
    match command {
        InviteCommand::Create {
            board_id,
            role,
            target,
            target_name,
        } => {
            let target = target.map(|id| {
                let name = target_name.unwrap_or_else(|| id.clone());
                User::new(id, name)
            });
            let invite = access
                .create_invite(ctx, &BoardId::from(board_id.as_str()), role, target)
                .await
                .map_err(public)?;
            print_json(&invite)
        }
        InviteCommand::Accept { board_id, invite_id } => {
            respond(boards, ctx, &board_id, &invite_id, InviteResponse::Accept).await
        }
        InviteCommand::Decline { board_id, invite_id } => {
            respond(boards, ctx, &board_id, &invite_id, InviteResponse::Decline).await
        }
        InviteCommand::Delete { board_id, invite_id } => {
            access
                .delete_invite(
                    ctx,
                    &BoardId::from(board_id.as_str()),
                    &InviteId::from(invite_id.as_str()),
                )
                .await
                .map_err(public)?;
            print_ok()
        }
        InviteCommand::List { page } => {
            let invites = access.invites(ctx, &page.to_params()).await.map_err(public)?;
            print_json(&invites)
        }
    }
}

async fn respond(
    boards: &EmbeddedBoards,
    ctx: &RequestContext,
    board_id: &str,
    invite_id: &str,
    response: InviteResponse,
) -> Result<()> {
    boards
        .access()
        .respond_to_invite(ctx, &BoardId::from(board_id), &InviteId::from(invite_id), response)
        .await
        .map_err(public)?;
    print_ok()
}
