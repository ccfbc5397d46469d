//! Game session registry.
//!
//! Each session owns one [`Game`] behind its own mutex, so actions on one
//! game never wait on another. The registry map is locked only long enough
//! to look a session up.

use derive_more::{Display, Error, From};
use hostage_chess::{
    Action, ActionError, ActionReport, Color, Game, GameState, GameStatus, RecordedAction, encode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Why a registry operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SessionError {
    /// A session with this id already exists.
    #[display("Session {} already exists", _0)]
    #[from(skip)]
    AlreadyExists(#[error(not(source))] SessionId),

    /// No session with this id.
    #[display("Session {} not found", _0)]
    #[from(skip)]
    NotFound(#[error(not(source))] SessionId),

    /// The registry is full.
    #[display("Session limit of {} reached", _0)]
    #[from(skip)]
    CapacityReached(#[error(not(source))] usize),

    /// A thread panicked while holding a session lock.
    #[display("Session lock poisoned")]
    #[from(skip)]
    LockPoisoned,

    /// The engine rejected the action.
    #[display("{}", _0)]
    Action(ActionError),
}

/// Copy of a session's state, taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Session id.
    pub id: SessionId,
    /// Encoded game state.
    pub state: String,
    /// Current status.
    pub status: GameStatus,
    /// Side whose action is next.
    pub side_to_move: Color,
    /// Actions played so far.
    pub record: Vec<RecordedAction>,
}

type SharedGame = Arc<Mutex<Game>>;

/// Manages all game sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<SessionId, SharedGame>>>,
    capacity: usize,
    start: Option<GameState>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, SessionError> {
    mutex.lock().map_err(|_| SessionError::LockPoisoned)
}

impl SessionManager {
    /// Creates a registry holding at most `capacity` sessions.
    #[instrument]
    pub fn new(capacity: usize) -> Self {
        info!(capacity, "Creating session manager");
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            capacity,
            start: None,
        }
    }

    /// New sessions start from `state` instead of the standard position.
    pub fn with_start(mut self, state: GameState) -> Self {
        self.start = Some(state);
        self
    }

    fn fresh_game(&self) -> Result<Game, SessionError> {
        match &self.start {
            Some(state) => Ok(Game::from_state(state.clone())?),
            None => Ok(Game::new()),
        }
    }

    fn session(&self, id: &str) -> Result<SharedGame, SessionError> {
        lock(&self.sessions)?.get(id).cloned().ok_or_else(|| {
            warn!(session_id = %id, "Session not found");
            SessionError::NotFound(id.to_string())
        })
    }

    /// Creates a new game session.
    #[instrument(skip(self))]
    pub fn create_session(&self, id: SessionId) -> Result<SessionId, SessionError> {
        let game = self.fresh_game()?;
        let mut sessions = lock(&self.sessions)?;

        if sessions.contains_key(&id) {
            warn!(session_id = %id, "Session already exists");
            return Err(SessionError::AlreadyExists(id));
        }
        if sessions.len() >= self.capacity {
            warn!(session_id = %id, capacity = self.capacity, "Session limit reached");
            return Err(SessionError::CapacityReached(self.capacity));
        }

        sessions.insert(id.clone(), Arc::new(Mutex::new(game)));
        info!(session_id = %id, total = sessions.len(), "Session created");
        Ok(id)
    }

    /// Applies an action, optionally on behalf of a specific colour.
    ///
    /// Without `color` the action is played for whoever is on move.
    #[instrument(skip(self))]
    pub fn apply(
        &self,
        id: &str,
        action: Action,
        color: Option<Color>,
    ) -> Result<ActionReport, SessionError> {
        let session = self.session(id)?;
        let mut game = lock(&session)?;
        let report = match color {
            Some(color) => game.apply_as(color, action),
            None => game.apply(action),
        }
        .map_err(|e| {
            warn!(session_id = %id, %action, error = %e, "Action rejected");
            e
        })?;
        debug!(session_id = %id, %action, status = %report.status, "Action applied");
        Ok(report)
    }

    /// Copies the session's current state.
    #[instrument(skip(self))]
    pub fn snapshot(&self, id: &str) -> Result<Snapshot, SessionError> {
        let session = self.session(id)?;
        let game = lock(&session)?;
        Ok(Snapshot {
            id: id.to_string(),
            state: encode(game.state()),
            status: *game.status(),
            side_to_move: game.side_to_move(),
            record: game.record().clone(),
        })
    }

    /// Every legal action in the session.
    #[instrument(skip(self))]
    pub fn legal_actions(&self, id: &str) -> Result<Vec<Action>, SessionError> {
        let session = self.session(id)?;
        let game = lock(&session)?;
        Ok(game.legal_actions())
    }

    /// Takes back the last action, returning it.
    #[instrument(skip(self))]
    pub fn undo(&self, id: &str) -> Result<Option<RecordedAction>, SessionError> {
        let session = self.session(id)?;
        let mut game = lock(&session)?;
        Ok(game.undo()?)
    }

    /// Restarts the session from the registry's starting state.
    #[instrument(skip(self))]
    pub fn reset(&self, id: &str) -> Result<(), SessionError> {
        let session = self.session(id)?;
        let fresh = self.fresh_game()?;
        *lock(&session)? = fresh;
        info!(session_id = %id, "Session reset");
        Ok(())
    }

    /// Lists session ids in sorted order.
    #[instrument(skip(self))]
    pub fn list_sessions(&self) -> Result<Vec<SessionId>, SessionError> {
        let mut ids: Vec<SessionId> = lock(&self.sessions)?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Removes a session.
    #[instrument(skip(self))]
    pub fn remove_session(&self, id: &str) -> Result<(), SessionError> {
        match lock(&self.sessions)?.remove(id) {
            Some(_) => {
                info!(session_id = %id, "Session removed");
                Ok(())
            }
            None => Err(SessionError::NotFound(id.to_string())),
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(64)
    }
}
