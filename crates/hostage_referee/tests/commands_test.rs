//! Tests for the referee commands.

use hostage_referee::{Cli, Command, CommandError, RefereeConfig, run};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("hostage_referee").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_cli_parses_play() {
    let cli = parse(&["play", "e2e4", "N@f3", "x0:1"]);
    assert_eq!(
        cli.command,
        Command::Play {
            state: None,
            actions: vec!["e2e4".into(), "N@f3".into(), "x0:1".into()]
        }
    );
    assert!(cli.config.is_none());
}

#[test]
fn test_cli_global_config_flag() {
    let cli = parse(&["show", "--config", "referee.toml"]);
    assert_eq!(cli.config.unwrap().to_str(), Some("referee.toml"));
}

#[test]
fn test_play_outputs_reports() {
    let command = parse(&["play", "e2e4", "d7d5", "e4d5"]).command;
    let output = run(&command, &RefereeConfig::default()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["reports"].as_array().unwrap().len(), 3);
    assert_eq!(json["reports"][2]["capture"]["piece"]["kind"], "pawn");
    assert_eq!(json["snapshot"]["side_to_move"], "black");
    assert!(json["snapshot"]["state"].as_str().unwrap().ends_with(" p/- -/-"));
}

#[test]
fn test_play_stops_at_illegal_action() {
    let command = parse(&["play", "e2e5"]).command;
    let result = run(&command, &RefereeConfig::default());
    assert!(matches!(result, Err(CommandError::Session(_))));
}

#[test]
fn test_play_rejects_bad_notation() {
    let command = parse(&["play", "castle"]).command;
    let result = run(&command, &RefereeConfig::default());
    assert!(matches!(result, Err(CommandError::Notation(_))));
}

#[test]
fn test_legal_lists_drops() {
    let command = Command::Legal {
        state: Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1 -/- P/-".to_string()),
    };
    let output = run(&command, &RefereeConfig::default()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert!(lines.contains(&"e1d1"));
    assert!(lines.contains(&"P@e4"));
    assert!(!lines.contains(&"P@e8"));
}

#[test]
fn test_show_renders_pools() {
    let command = Command::Show {
        state: Some("4k3/8/8/8/8/8/8/4K3 b - - 0 1 q/- N/-".to_string()),
    };
    let output = run(&command, &RefereeConfig::default()).unwrap();
    assert!(output.starts_with("8 . . . . k . . ."));
    assert!(output.contains("Side to move: black"));
    assert!(output.contains("Hostages held by white: q"));
    assert!(output.contains("Reserve of white: N"));
    assert!(output.contains("Status: in progress"));
}

#[test]
fn test_bad_state_is_codec_error() {
    let command = Command::Show {
        state: Some("8/8 w".to_string()),
    };
    assert!(matches!(
        run(&command, &RefereeConfig::default()),
        Err(CommandError::Codec(_))
    ));
}
