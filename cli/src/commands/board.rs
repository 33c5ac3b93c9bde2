// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;

use linkboards_core::application::RequestContext;
use linkboards_core::domain::board::{BoardEdit, BoardId};

use super::PageArgs;
use crate::embedded::EmbeddedBoards;
use crate::output::{print_json, print_ok, public};

#[derive(Subcommand)]
pub enum BoardCommand {
    /// Create a board owned by the caller
    Create {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Show a board as the caller is allowed to see it
    Show {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,
    },

    /// List the caller's boards, newest membership first
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Change a board's name or description
    Edit {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a board with all its members and invites
    Delete {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,
    },
}

pub async fn handle_command(
    command: BoardCommand,
    boards: &EmbeddedBoards,
    ctx: &RequestContext,
) -> Result<()> {
    let access = boards.access();
    match command {
        BoardCommand::Create { name, description } => {
            let aggregate = access.create_board(ctx, &name, &description).await.map_err(public)?;
            print_json(&aggregate.board)
        }
        BoardCommand::Show { board_id } => {
            let view = access.board(ctx, &BoardId::from(board_id.as_str())).await.map_err(public)?;
            print_json(&view)
        }
        BoardCommand::List { page } => {
            let list = access.boards(ctx, &page.to_params()).await.map_err(public)?;
            print_json(&list)
        }
        BoardCommand::Edit {
            board_id,
            name,
            description,
        } => {
            let edit = BoardEdit { name, description };
            let board = access
                .edit_board(ctx, &BoardId::from(board_id.as_str()), &edit)
                .await
                .map_err(public)?;
            print_json(&board)
        }
        BoardCommand::Delete { board_id } => {
            access
                .delete_board(ctx, &BoardId::from(board_id.as_str()))
                .await
                .map_err(public)?;
            print_ok()
        }
    }
}
