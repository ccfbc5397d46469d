//! Text encoding of a [`GameState`].
//!
//! Standard FEN extended with two fields:
//!
//! ```text
//! <placement> <side> <castling> <ep> <halfmove> <fullmove> <hostages> <reserves>
//! ```
//!
//! `<hostages>` is `<held-by-white>/<held-by-black>` and `<reserves>` is
//! `<white-reserve>/<black-reserve>`. Each list is a run of piece letters in
//! pool order (upper case white, lower case black) or `-` when empty.

use crate::board::Board;
use crate::ledger::Ledger;
use crate::position::{CastlingRights, Position};
use crate::rules::{can_capture_en_passant, en_passant_victim};
use crate::state::GameState;
use crate::types::{Color, Piece, PieceKind, Square};
use derive_more::{Display, Error};
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

/// Encoding of the standard starting state.
pub const STARTING_STATE: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 -/- -/-";

/// Why a state string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CodecError {
    /// Wrong number of space-separated fields.
    #[display("Expected 8 fields, found {}", _0)]
    FieldCount(#[error(not(source))] usize),

    /// Malformed piece placement.
    #[display("Bad piece placement: {}", _0)]
    Placement(#[error(not(source))] String),

    /// Side to move is not `w` or `b`.
    #[display("Bad side to move: {:?}", _0)]
    SideToMove(#[error(not(source))] String),

    /// Malformed castling field.
    #[display("Bad castling rights: {:?}", _0)]
    Castling(#[error(not(source))] String),

    /// Malformed en passant field.
    #[display("Bad en passant square: {:?}", _0)]
    EnPassant(#[error(not(source))] String),

    /// A clock field is not a valid number.
    #[display("Bad {} value: {:?}", field, value)]
    Clock {
        /// Field name.
        field: &'static str,
        /// Offending text.
        value: String,
    },

    /// Malformed or inconsistent hostage lists.
    #[display("Bad hostage pools: {}", _0)]
    Hostages(#[error(not(source))] String),

    /// Malformed or inconsistent reserve lists.
    #[display("Bad reserve pools: {}", _0)]
    Reserves(#[error(not(source))] String),

    /// A side does not have exactly one king on the board.
    #[display("{} has {} kings on the board", color, count)]
    KingCount {
        /// Side with the wrong king count.
        color: Color,
        /// Number found.
        count: usize,
    },
}

fn encode_placement(board: &Board) -> String {
    let mut out = String::new();
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            match Square::new(file, rank).and_then(|sq| board.get(sq)) {
                Some(piece) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }
    out
}

fn encode_castling(rights: &CastlingRights) -> String {
    let mut out = String::new();
    for (flag, c) in [
        (rights.white_kingside, 'K'),
        (rights.white_queenside, 'Q'),
        (rights.black_kingside, 'k'),
        (rights.black_queenside, 'q'),
    ] {
        if flag {
            out.push(c);
        }
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

fn encode_list(pieces: impl Iterator<Item = Piece>) -> String {
    let out: String = pieces.map(Piece::to_char).collect();
    if out.is_empty() { "-".to_string() } else { out }
}

fn encode_pools(ledger: &Ledger) -> (String, String) {
    let hostages = Color::iter()
        .map(|c| encode_list(ledger.hostages(c).iter().copied()))
        .collect::<Vec<_>>()
        .join("/");
    let reserves = Color::iter()
        .map(|c| encode_list(ledger.reserves(c).iter().map(|k| Piece::new(*k, c))))
        .collect::<Vec<_>>()
        .join("/");
    (hostages, reserves)
}

/// Encodes board, side, castling, en passant and pools, without clocks.
///
/// Two states with the same key are the same position for repetition purposes.
/// The en passant square only counts when a capture onto it is legal.
pub fn repetition_key(state: &GameState) -> String {
    let position = state.position();
    let (hostages, reserves) = encode_pools(state.ledger());
    let en_passant = position
        .en_passant()
        .filter(|_| can_capture_en_passant(position))
        .map_or_else(|| "-".to_string(), |sq| sq.to_string());
    format!(
        "{} {} {} {} {} {}",
        encode_placement(position.board()),
        position.side_to_move().to_char(),
        encode_castling(position.castling()),
        en_passant,
        hostages,
        reserves
    )
}

/// Encodes a full game state.
#[instrument(skip(state))]
pub fn encode(state: &GameState) -> String {
    let position = state.position();
    let (hostages, reserves) = encode_pools(state.ledger());
    format!(
        "{} {} {} {} {} {} {} {}",
        encode_placement(position.board()),
        position.side_to_move().to_char(),
        encode_castling(position.castling()),
        position
            .en_passant()
            .map_or_else(|| "-".to_string(), |sq| sq.to_string()),
        position.halfmove_clock(),
        position.fullmove_number(),
        hostages,
        reserves
    )
}

fn decode_placement(text: &str) -> Result<Board, CodecError> {
    let ranks: Vec<&str> = text.split('/').collect();
    if ranks.len() != 8 {
        return Err(CodecError::Placement(format!(
            "expected 8 ranks, found {}",
            ranks.len()
        )));
    }

    let mut board = Board::empty();
    for (i, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file: u8 = 0;
        for c in rank_text.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(CodecError::Placement(format!("bad skip {:?}", c)));
                }
                file += skip as u8;
            } else {
                let piece = Piece::from_char(c)
                    .ok_or_else(|| CodecError::Placement(format!("unknown piece {:?}", c)))?;
                let sq = Square::new(file, rank).ok_or_else(|| {
                    CodecError::Placement(format!("rank {} is too long", rank + 1))
                })?;
                board.set(sq, Some(piece));
                file += 1;
            }
            if file > 8 {
                return Err(CodecError::Placement(format!(
                    "rank {} is too long",
                    rank + 1
                )));
            }
        }
        if file != 8 {
            return Err(CodecError::Placement(format!(
                "rank {} has {} files",
                rank + 1,
                file
            )));
        }
    }
    Ok(board)
}

fn decode_castling(text: &str) -> Result<CastlingRights, CodecError> {
    let mut rights = CastlingRights::none();
    if text == "-" {
        return Ok(rights);
    }
    for c in text.chars() {
        let flag = match c {
            'K' => &mut rights.white_kingside,
            'Q' => &mut rights.white_queenside,
            'k' => &mut rights.black_kingside,
            'q' => &mut rights.black_queenside,
            _ => return Err(CodecError::Castling(text.to_string())),
        };
        if *flag {
            return Err(CodecError::Castling(text.to_string()));
        }
        *flag = true;
    }
    Ok(rights)
}

fn decode_clock(field: &'static str, text: &str) -> Result<u32, CodecError> {
    text.parse().map_err(|_| CodecError::Clock {
        field,
        value: text.to_string(),
    })
}

fn decode_list(text: &str) -> Option<Vec<Piece>> {
    if text == "-" {
        return Some(Vec::new());
    }
    text.chars().map(Piece::from_char).collect()
}

fn split_pair(text: &str) -> Option<(&str, &str)> {
    let (white, black) = text.split_once('/')?;
    (!white.is_empty() && !black.is_empty()).then_some((white, black))
}

fn decode_hostages(text: &str) -> Result<[Vec<Piece>; 2], CodecError> {
    let err = |msg: &str| CodecError::Hostages(format!("{} in {:?}", msg, text));
    let (white, black) = split_pair(text).ok_or_else(|| err("expected <white>/<black>"))?;
    let mut pools = [Vec::new(), Vec::new()];
    for (holder, list) in [(Color::White, white), (Color::Black, black)] {
        let pieces = decode_list(list).ok_or_else(|| err("unknown piece letter"))?;
        for piece in &pieces {
            if piece.kind == PieceKind::King {
                return Err(err("a king cannot be a hostage"));
            }
            if piece.color == holder {
                return Err(err("a side cannot hold its own piece hostage"));
            }
        }
        pools[holder.index()] = pieces;
    }
    Ok(pools)
}

fn decode_reserves(text: &str) -> Result<[Vec<PieceKind>; 2], CodecError> {
    let err = |msg: &str| CodecError::Reserves(format!("{} in {:?}", msg, text));
    let (white, black) = split_pair(text).ok_or_else(|| err("expected <white>/<black>"))?;
    let mut pools = [Vec::new(), Vec::new()];
    for (owner, list) in [(Color::White, white), (Color::Black, black)] {
        let pieces = decode_list(list).ok_or_else(|| err("unknown piece letter"))?;
        let mut kinds = Vec::with_capacity(pieces.len());
        for piece in pieces {
            if piece.kind == PieceKind::King {
                return Err(err("a king cannot be in reserve"));
            }
            if piece.color != owner {
                return Err(err("a reserve holds only its owner's pieces"));
            }
            kinds.push(piece.kind);
        }
        pools[owner.index()] = kinds;
    }
    Ok(pools)
}

/// Decodes a full game state.
///
/// # Errors
///
/// Returns a [`CodecError`] naming the first malformed or inconsistent field.
#[instrument]
pub fn decode(text: &str) -> Result<GameState, CodecError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 8 {
        warn!(found = fields.len(), "Wrong field count");
        return Err(CodecError::FieldCount(fields.len()));
    }

    let board = decode_placement(fields[0])?;
    for color in Color::iter() {
        let count = board.king_count(color);
        if count != 1 {
            return Err(CodecError::KingCount { color, count });
        }
    }

    let side = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(CodecError::SideToMove(other.to_string())),
    };
    let castling = decode_castling(fields[2])?;
    let en_passant = match fields[3] {
        "-" => None,
        label => {
            let sq: Square = label
                .parse()
                .map_err(|_| CodecError::EnPassant(label.to_string()))?;
            // The skipped square lies behind a pawn the opponent just pushed.
            let expected_rank = match side {
                Color::White => 5,
                Color::Black => 2,
            };
            if sq.rank() != expected_rank {
                return Err(CodecError::EnPassant(label.to_string()));
            }
            Some(sq)
        }
    };
    let halfmove = decode_clock("halfmove clock", fields[4])?;
    let fullmove = decode_clock("fullmove number", fields[5])?;
    if fullmove == 0 {
        return Err(CodecError::Clock {
            field: "fullmove number",
            value: fields[5].to_string(),
        });
    }

    let hostages = decode_hostages(fields[6])?;
    let reserves = decode_reserves(fields[7])?;

    let position = Position::from_parts(board, side, castling, en_passant, halfmove, fullmove);
    if en_passant.is_some() && en_passant_victim(&position).is_none() {
        warn!(target = fields[3], "En passant square has no pawn behind it");
        return Err(CodecError::EnPassant(fields[3].to_string()));
    }
    let state = GameState::from_parts(position, Ledger::from_pools(hostages, reserves));
    debug!("State decoded");
    Ok(state)
}
