use crate::models::identity::ClientIdentity;
use crate::models::views::{GameSnapshot, Phase, PlayerView};

/// Client-side gating derived from `(current_turn_player_id, phase)`.
///
/// Recomputed on every snapshot, never stored between them. Being the current
/// player outside of the draw or play phase leaves nothing to do, so it maps
/// to `NotMyTurn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    NotMyTurn,
    MyTurnDraw,
    MyTurnPlay,
}

impl TurnState {
    pub fn can_draw(&self) -> bool {
        *self == TurnState::MyTurnDraw
    }

    pub fn can_play(&self) -> bool {
        *self == TurnState::MyTurnPlay
    }
}

/// Presentation flags for one snapshot as seen by one client.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub is_my_turn: bool,
    pub is_play_phase: bool,
    pub is_draw_phase: bool,
    pub turn_state: TurnState,
    /// The player matching the client's username, if the server lists one.
    pub me: Option<&'a PlayerView>,
}

pub fn derive_view_context<'a>(
    snapshot: &'a GameSnapshot,
    identity: &ClientIdentity,
) -> ViewContext<'a> {
    let is_my_turn = snapshot.current_turn_player_id == identity.player_id();
    let is_play_phase = snapshot.phase == Phase::Play;
    let is_draw_phase = snapshot.phase == Phase::Draw;

    let turn_state = match (is_my_turn, &snapshot.phase) {
        (true, Phase::Draw) => TurnState::MyTurnDraw,
        (true, Phase::Play) => TurnState::MyTurnPlay,
        _ => TurnState::NotMyTurn,
    };

    ViewContext {
        is_my_turn,
        is_play_phase,
        is_draw_phase,
        turn_state,
        me: snapshot.player_by_username(identity.username()),
    }
}

/// Holds the single current snapshot. Last write wins, no merging.
#[derive(Debug, Default)]
pub struct RenderCache {
    current: Option<GameSnapshot>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored snapshot unconditionally.
    pub fn ingest(&mut self, snapshot: GameSnapshot) -> &GameSnapshot {
        self.current.insert(snapshot)
    }

    pub fn current(&self) -> Option<&GameSnapshot> {
        self.current.as_ref()
    }
}
