// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;

use linkboards_core::application::RequestContext;
use linkboards_core::domain::board::BoardId;
use linkboards_core::domain::member::BoardMemberEdit;
use linkboards_core::domain::role::BoardRole;
use linkboards_core::domain::user::UserId;

use super::parse_role;
use crate::embedded::EmbeddedBoards;
use crate::output::{print_json, print_ok, public};

#[derive(Subcommand)]
pub enum MemberCommand {
    /// Remove a member; any member may remove themselves
    Remove {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "USER_ID")]
        user_id: String,
    },

    /// Change a member's role
    Edit {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "USER_ID")]
        user_id: String,

        #[arg(long, value_parser = parse_role)]
        role: Option<BoardRole>,
    },
}

pub async fn handle_command(
    command: MemberCommand,
    boards: &EmbeddedBoards,
    ctx: &RequestContext,
) -> Result<()> {
    let access = boards.access();
    match command {
        MemberCommand::Remove { board_id, user_id } => {
            access
                .remove_user(
                    ctx,
                    &BoardId::from(board_id.as_str()),
                    &UserId::from(user_id.as_str()),
                )
                .await
                .map_err(public)?;
            print_ok()
        }
        MemberCommand::Edit {
            board_id,
            user_id,
            role,
        } => {
            let member = access
                .edit_board_user(
                    ctx,
                    &BoardId::from(board_id.as_str()),
                    &UserId::from(user_id.as_str()),
                    &BoardMemberEdit { role },
                )
                .await
                .map_err(public)?;
            print_json(&member)
        }
    }
}
