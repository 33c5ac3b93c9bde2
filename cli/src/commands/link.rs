// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;

use linkboards_core::application::RequestContext;
use linkboards_core::domain::board::BoardId;
use linkboards_core::domain::link::LinkId;

use super::PageArgs;
use crate::embedded::EmbeddedBoards;
use crate::output::{print_json, print_ok, public};

#[derive(Subcommand)]
pub enum LinkCommand {
    /// Post a link to a board
    Create {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(long)]
        title: String,

        /// Absolute https URL
        #[arg(long)]
        url: String,
    },

    Show {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "LINK_ID")]
        link_id: String,
    },

    /// List a board's links, newest first
    List {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Delete a link (always allowed for its creator)
    Delete {
        #[arg(value_name = "BOARD_ID")]
        board_id: String,

        #[arg(value_name = "LINK_ID")]
        link_id: String,
    },
}

pub async fn handle_command(
    command: LinkCommand,
    boards: &EmbeddedBoards,
    ctx: &RequestContext,
) -> Result<()> {
    let links = boards.links();
    match command {
        LinkCommand::Create { board_id, title, url } => {
            let link = links
                .create_link(ctx, &BoardId::from(board_id.as_str()), &title, &url)
                .await
                .map_err(public)?;
            print_json(&link)
        }
        LinkCommand::Show { board_id, link_id } => {
            let link = links
                .link(ctx, &BoardId::from(board_id.as_str()), &LinkId::from(link_id.as_str()))
                .await
                .map_err(public)?;
            print_json(&link)
        }
        LinkCommand::List { board_id, page } => {
            let list = links
                .links(ctx, &BoardId::from(board_id.as_str()), &page.to_params())
                .await
                .map_err(public)?;
            print_json(&list)
        }
        LinkCommand::Delete { board_id, link_id } => {
            links
                .delete_link(ctx, &BoardId::from(board_id.as_str()), &LinkId::from(link_id.as_str()))
                .await
                .map_err(public)?;
            print_ok()
        }
    }
}
