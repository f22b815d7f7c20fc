//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn download_defaults() {
    match parse(&["sdm", "download", "https://example.com/file.iso"]) {
        CliCommand::Download {
            url,
            output,
            worker,
            config,
        } => {
            assert_eq!(url, "https://example.com/file.iso");
            assert!(output.is_none());
            assert_eq!(worker, 0);
            assert!(config.is_none());
        }
    }
}

#[test]
fn download_with_flags() {
    match parse(&[
        "sdm",
        "download",
        "https://example.com/file.iso",
        "--output",
        "/tmp/out.iso",
        "--worker",
        "8",
        "--config",
        "/tmp/sdm.toml",
    ]) {
        CliCommand::Download {
            output,
            worker,
            config,
            ..
        } => {
            assert_eq!(output, Some(PathBuf::from("/tmp/out.iso")));
            assert_eq!(worker, 8);
            assert_eq!(config, Some(PathBuf::from("/tmp/sdm.toml")));
        }
    }
}

#[test]
fn short_flags() {
    match parse(&["sdm", "download", "http://h/x", "-o", "dir", "-w", "3"]) {
        CliCommand::Download { output, worker, .. } => {
            assert_eq!(output, Some(PathBuf::from("dir")));
            assert_eq!(worker, 3);
        }
    }
}

#[test]
fn url_is_required() {
    assert!(Cli::try_parse_from(["sdm", "download"]).is_err());
}

#[test]
fn unknown_command_rejected() {
    assert!(Cli::try_parse_from(["sdm", "upload", "x"]).is_err());
}

#[test]
fn negative_worker_rejected() {
    assert!(Cli::try_parse_from(["sdm", "download", "http://h/x", "--worker", "-1"]).is_err());
}
