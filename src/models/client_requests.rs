use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DrawCardRequest {
    pub game_code: String,
    pub player_id: String,
}

/// Both ids are resolved against the current snapshot before this is built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayCardRequest {
    pub game_code: String,
    pub player_id: String,
    pub card_id: String,
    pub target_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateGameRequest {
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JoinGameRequest {
    pub game_code: String,
    pub username: String,
}

/// A user action that passed client-side gating and is ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Draw(DrawCardRequest),
    Play(PlayCardRequest),
}

impl GameAction {
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::Draw(_) => "draw",
            GameAction::Play(_) => "play_card",
        }
    }

    pub fn game_code(&self) -> &str {
        match self {
            GameAction::Draw(request) => &request.game_code,
            GameAction::Play(request) => &request.game_code,
        }
    }
}
