use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Round phase as reported by the server.
///
/// Unknown phases are preserved verbatim so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    #[default]
    Setup,
    Draw,
    Play,
    Resolve,
    End,
    Other(String),
}

impl From<String> for Phase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "setup" => Phase::Setup,
            "draw" => Phase::Draw,
            "play" => Phase::Play,
            "resolve" => Phase::Resolve,
            "end" => Phase::End,
            _ => Phase::Other(value),
        }
    }
}

impl From<Phase> for String {
    fn from(value: Phase) -> Self {
        value.to_string()
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Phase::Setup => "setup",
            Phase::Draw => "draw",
            Phase::Play => "play",
            Phase::Resolve => "resolve",
            Phase::End => "end",
            Phase::Other(other) => other.as_str(),
        };

        write!(f, "{}", str)
    }
}

/// Complete, self-contained game state pushed or pulled from the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    #[serde(default)]
    pub phase: Phase,
    #[serde(alias = "currentTurnPlayerId", default)]
    pub current_turn_player_id: String,
    #[serde(default)]
    pub players: Vec<PlayerView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl GameSnapshot {
    pub fn player_by_username(&self, username: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.username == username)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PlayerView {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub hand: Vec<CardView>,

    #[serde(default)]
    pub eliminated: bool,
    #[serde(default)]
    pub snakebit: bool,
    #[serde(default)]
    pub entranced: bool,
    #[serde(alias = "isPrimed", default)]
    pub is_primed: bool,
    #[serde(default)]
    pub shield: u32,
    #[serde(alias = "isRoyal", default)]
    pub is_royal: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CardView {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "type", default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "isPrimed", default)]
    pub is_primed: bool,
}

impl CardView {
    /// Symbol when the server sends one, the card name otherwise.
    pub fn label(&self) -> &str {
        match &self.symbol {
            Some(symbol) if !symbol.is_empty() => symbol,
            _ if !self.name.is_empty() => &self.name,
            _ => "?",
        }
    }
}

/// Card and player ids arrive as strings from the game server but as plain
/// numbers from some fixtures.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}
