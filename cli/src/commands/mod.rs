// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the linkboards CLI

pub mod board;
pub mod config;
pub mod invite;
pub mod link;
pub mod member;

pub use self::board::BoardCommand;
pub use self::config::ConfigCommand;
pub use self::invite::InviteCommand;
pub use self::link::LinkCommand;
pub use self::member::MemberCommand;

use clap::Args;

use linkboards_core::domain::repository::QueryParams;
use linkboards_core::domain::role::BoardRole;

/// Paging flags shared by the listing commands.
#[derive(Debug, Clone, Default, Args)]
pub struct PageArgs {
    /// Maximum number of results (1-100, default 20)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only return entries created before this Unix timestamp in nanoseconds
    #[arg(long, value_name = "NANOS")]
    pub cursor: Option<i64>,
}

impl PageArgs {
    pub fn to_params(&self) -> QueryParams {
        let params = QueryParams::new(self.limit, None);
        match self.cursor {
            Some(nanos) => params.with_cursor_nanos(nanos),
            None => params,
        }
    }
}

pub(crate) fn parse_role(value: &str) -> Result<BoardRole, String> {
    value.parse::<BoardRole>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_args_to_params() {
        let params = PageArgs { limit: Some(5), cursor: Some(1_000_000_000) }.to_params();
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.cursor.map(|c| c.timestamp()), Some(1));
        assert_eq!(PageArgs::default().to_params(), QueryParams::default());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("editor"), Ok(BoardRole::Editor));
        assert!(parse_role("admin").is_err());
    }
}
