//! CLI parse tests.

use super::{Cli, CliCommand, RecentCommand};
use clap::Parser;
use quire_core::DEFAULT_RECENT_LIMIT;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn parses_resolve_with_grants() {
    let cli = parse(&["quire", "resolve", "notes.md", "--grant", "/pics", "--grant", "/more"]);
    match cli.command {
        CliCommand::Resolve { document, grants } => {
            assert_eq!(document, PathBuf::from("notes.md"));
            assert_eq!(grants, vec![PathBuf::from("/pics"), PathBuf::from("/more")]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert!(cli.config.is_none());
}

#[test]
fn parses_global_config() {
    let cli = parse(&["quire", "recent", "list", "--config", "/tmp/quire.json"]);
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/quire.json")));
    match cli.command {
        CliCommand::Recent(RecentCommand::List { limit }) => {
            assert_eq!(limit, DEFAULT_RECENT_LIMIT)
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_recent_open_with_images() {
    let cli = parse(&["quire", "recent", "open", "abc", "--images"]);
    match cli.command {
        CliCommand::Recent(RecentCommand::Open { id, images }) => {
            assert_eq!(id, "abc");
            assert!(images);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn rejects_missing_document() {
    assert!(Cli::try_parse_from(["quire", "resolve"]).is_err());
}
