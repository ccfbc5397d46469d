//! Command implementations. Each returns the text to print.

use crate::cli::Command;
use crate::config::{ConfigError, RefereeConfig};
use crate::session::{SessionError, SessionManager, Snapshot};
use derive_more::{Display, Error, From};
use hostage_chess::{
    Action, ActionError, ActionReport, CodecError, Color, Game, GameState, NotationError, Piece,
    decode,
};
use serde::Serialize;
use tracing::{info, instrument};

/// Why a command failed.
#[derive(Debug, Display, Error, From)]
pub enum CommandError {
    /// Bad configuration.
    #[display("{}", _0)]
    Config(ConfigError),
    /// Bad encoded state.
    #[display("{}", _0)]
    Codec(CodecError),
    /// Bad action notation.
    #[display("{}", _0)]
    Notation(NotationError),
    /// Session registry failure, including rejected actions.
    #[display("{}", _0)]
    Session(SessionError),
    /// The engine refused the state or action.
    #[display("{}", _0)]
    Action(ActionError),
    /// Output could not be serialized.
    #[display("JSON error: {}", _0)]
    Json(serde_json::Error),
}

/// Output of `play`.
#[derive(Debug, Serialize)]
pub struct PlayOutput {
    /// One report per applied action.
    pub reports: Vec<ActionReport>,
    /// Final state of the session.
    pub snapshot: Snapshot,
}

fn starting_state(
    state: Option<&str>,
    config: &RefereeConfig,
) -> Result<Option<GameState>, CommandError> {
    match state {
        Some(text) => Ok(Some(decode(text)?)),
        None => Ok(config.starting_state()?),
    }
}

fn load_game(state: Option<&str>, config: &RefereeConfig) -> Result<Game, CommandError> {
    match starting_state(state, config)? {
        Some(state) => Ok(Game::from_state(state)?),
        None => Ok(Game::new()),
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CommandError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn pool_line(pieces: impl Iterator<Item = Piece>) -> String {
    let letters: Vec<String> = pieces.map(|p| p.to_char().to_string()).collect();
    if letters.is_empty() {
        "-".to_string()
    } else {
        letters.join(" ")
    }
}

/// Plays `actions` in a fresh session and reports every step.
#[instrument(skip(config))]
pub fn play(
    state: Option<&str>,
    actions: &[String],
    config: &RefereeConfig,
) -> Result<String, CommandError> {
    let mut manager = SessionManager::new(*config.max_sessions());
    if let Some(start) = starting_state(state, config)? {
        manager = manager.with_start(start);
    }
    let id = manager.create_session("cli".to_string())?;

    let mut reports = Vec::with_capacity(actions.len());
    for text in actions {
        let action: Action = text.parse()?;
        reports.push(manager.apply(&id, action, None)?);
    }

    let snapshot = manager.snapshot(&id)?;
    info!(applied = reports.len(), status = %snapshot.status, "Play finished");
    to_json(&PlayOutput { reports, snapshot }, *config.pretty_json())
}

/// Lists legal actions, one notation per line.
#[instrument(skip(config))]
pub fn legal(state: Option<&str>, config: &RefereeConfig) -> Result<String, CommandError> {
    let game = load_game(state, config)?;
    let lines: Vec<String> = game.legal_actions().iter().map(Action::to_string).collect();
    Ok(lines.join("\n"))
}

/// Renders board, pools and status.
#[instrument(skip(config))]
pub fn show(state: Option<&str>, config: &RefereeConfig) -> Result<String, CommandError> {
    let game = load_game(state, config)?;
    let ledger = game.state().ledger();
    let mut lines = vec![
        game.state().position().board().to_string(),
        String::new(),
        format!("Side to move: {}", game.side_to_move()),
    ];
    for color in [Color::White, Color::Black] {
        lines.push(format!(
            "Hostages held by {}: {}",
            color,
            pool_line(ledger.hostages(color).iter().copied())
        ));
        lines.push(format!(
            "Reserve of {}: {}",
            color,
            pool_line(ledger.reserves(color).iter().map(|k| Piece::new(*k, color)))
        ));
    }
    lines.push(format!("Status: {}", game.status()));
    Ok(lines.join("\n"))
}

/// Dispatches a parsed command.
pub fn run(command: &Command, config: &RefereeConfig) -> Result<String, CommandError> {
    match command {
        Command::Play { state, actions } => play(state.as_deref(), actions, config),
        Command::Legal { state } => legal(state.as_deref(), config),
        Command::Show { state } => show(state.as_deref(), config),
    }
}
