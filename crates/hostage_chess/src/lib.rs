//! Rule engine for Hostage Chess.
//!
//! Captured pieces are held as hostages instead of leaving play. Hostages can
//! be exchanged for the capturer's own pieces held by the opponent, and freed
//! pieces wait in a reserve until they are dropped back on the board.
//!
//! # Architecture
//!
//! - **Board core** ([`Board`], [`Position`], [`rules`]): placement, legal
//!   moves, attacks, mate and draw detection. Pools play no part here.
//! - **Ledger** ([`Ledger`]): hostage and reserve pools, exchange and drop
//!   validation.
//! - **Turn controller** ([`Game`]): the single entry point that applies one
//!   [`Action`] per ply atomically and derives the [`GameStatus`].
//! - **Codec** ([`codec`]): stable text encoding of a [`GameState`].
//! - **Contracts and invariants** ([`contracts`], [`invariants`]): pre- and
//!   postconditions checked around every action.
//!
//! # Example
//!
//! ```
//! use hostage_chess::{Action, Color, Game, GameStatus};
//!
//! let mut game = Game::new();
//! for notation in ["e2e4", "d7d5", "e4d5"] {
//!     let action: Action = notation.parse().unwrap();
//!     game.apply(action).unwrap();
//! }
//! assert_eq!(game.state().ledger().hostages(Color::White).len(), 1);
//! assert_eq!(*game.status(), GameStatus::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action;
pub mod board;
pub mod codec;
pub mod contracts;
pub mod game;
pub mod invariants;
pub mod ledger;
pub mod position;
pub mod rules;
pub mod state;
pub mod status;
pub mod types;

pub use action::{Action, ActionError, ActionKind, NotationError};
pub use board::{Board, BoardSizeError};
pub use codec::{CodecError, STARTING_STATE, decode, encode};
pub use contracts::{ActionContract, Contract};
pub use game::{ActionReport, CaptureReport, DropReport, Game, RecordedAction};
pub use invariants::{HostageChessInvariants, Invariant, InvariantSet, InvariantViolation};
pub use ledger::{DropError, ExchangeError, ExchangeOutcome, Ledger};
pub use position::{CastlingRights, Position};
pub use rules::{Capture, MoveError, MoveOutcome};
pub use state::GameState;
pub use status::{DrawReason, GameStatus};
pub use types::{Color, Piece, PieceKind, Square, SquareParseError};
