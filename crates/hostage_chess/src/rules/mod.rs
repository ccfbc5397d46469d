//! Chess rules for the board core.
//!
//! Pure functions over [`Position`](crate::Position): attack maps, legal move
//! generation, mate/stalemate and draw detection. Rules are kept apart from
//! the hostage ledger so the turn controller can compose both.

pub mod attacks;
pub mod draw;
pub mod movegen;
pub mod terminal;

pub use attacks::{is_in_check, is_square_attacked};
pub use draw::{fifty_move_rule, insufficient_material, threefold_repetition};
pub use movegen::{
    Capture, MoveError, MoveOutcome, all_legal_moves, apply_move, can_capture_en_passant,
    en_passant_victim, has_legal_move, legal_moves,
};
pub use terminal::{is_checkmate, is_stalemate};
