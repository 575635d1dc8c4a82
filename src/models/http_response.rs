use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CreateGameResponse {
    pub game_code: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct LobbyPlayer {
    pub username: String,
}

/// Body of a successful draw/play call. Only logged, the next pull is trusted instead.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ActionAck {
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the game server on 4xx responses.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: String,
}

impl ErrorDetail {
    /// Extracts `detail` from a response body, falling back to the raw text.
    pub fn from_body(body: &str) -> String {
        match serde_json::from_str::<ErrorDetail>(body) {
            Ok(parsed) if !parsed.detail.is_empty() => parsed.detail,
            _ if body.trim().is_empty() => "NO MESSAGE".to_string(),
            _ => body.trim().to_string(),
        }
    }
}
