use crate::logger;
use crate::models::client_requests::{
    CreateGameRequest, DrawCardRequest, JoinGameRequest, PlayCardRequest,
};
use crate::models::http_response::{ActionAck, CreateGameResponse, ErrorDetail, LobbyPlayer};
use crate::models::views::GameSnapshot;
use crate::utils::errors::{ActionError, LobbyError, TransportError};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};

/// Request/response side of the game server.
///
/// Implemented over HTTP by [`HttpGameServer`]; tests substitute in-memory fakes.
#[async_trait]
pub trait GameServer: Send + Sync {
    /// Fetches the current snapshot of a game.
    async fn fetch_state(&self, game_code: &str) -> Result<GameSnapshot, TransportError>;

    async fn draw_card(&self, request: &DrawCardRequest) -> Result<ActionAck, ActionError>;

    async fn play_card(&self, request: &PlayCardRequest) -> Result<ActionAck, ActionError>;
}

#[async_trait]
pub trait LobbyServer: Send + Sync {
    async fn create_game(&self, request: &CreateGameRequest) -> Result<String, LobbyError>;

    async fn join_game(&self, request: &JoinGameRequest) -> Result<(), LobbyError>;

    async fn list_players(&self, game_code: &str) -> Result<Vec<LobbyPlayer>, LobbyError>;
}

pub struct HttpGameServer {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGameServer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Maps an action response to an acknowledgement, surfacing the server's
    /// `detail` when the status is not a success.
    async fn read_ack(action: &str, response: Response) -> Result<ActionAck, ActionError> {
        let status = response.status();
        if status.is_success() {
            // A body that is not an ack is still a success, the next pull tells the truth.
            let ack = response.json::<ActionAck>().await.unwrap_or_default();
            logger!(DEBUG, "[ACTION] `{action}` acknowledged: {}", ack.message);
            return Ok(ack);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = ErrorDetail::from_body(&body);
        logger!(WARN, "[ACTION] `{action}` rejected with {status}: {detail}");
        Err(ActionError::Rejected(detail))
    }

    async fn lobby_error(response: Response) -> LobbyError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        LobbyError::Status {
            status,
            detail: ErrorDetail::from_body(&body),
        }
    }
}

#[async_trait]
impl GameServer for HttpGameServer {
    async fn fetch_state(&self, game_code: &str) -> Result<GameSnapshot, TransportError> {
        let api_url = self.url(&format!("game_state/{game_code}"));
        match self.client.get(api_url).send().await {
            Err(error) => Err(TransportError::Request(error.to_string())),
            Ok(response) => match response.status() {
                StatusCode::OK => {
                    let body = response
                        .text()
                        .await
                        .map_err(|e| TransportError::Request(e.to_string()))?;
                    serde_json::from_str::<GameSnapshot>(&body)
                        .map_err(|e| TransportError::Parse(e.to_string()))
                }
                status => Err(TransportError::Status(status.as_u16())),
            },
        }
    }

    async fn draw_card(&self, request: &DrawCardRequest) -> Result<ActionAck, ActionError> {
        let response = self
            .client
            .post(self.url("draw"))
            .json(request)
            .send()
            .await
            .map_err(|e| ActionError::Transport(e.to_string()))?;
        HttpGameServer::read_ack("draw", response).await
    }

    async fn play_card(&self, request: &PlayCardRequest) -> Result<ActionAck, ActionError> {
        let response = self
            .client
            .post(self.url("play_card"))
            .json(request)
            .send()
            .await
            .map_err(|e| ActionError::Transport(e.to_string()))?;
        HttpGameServer::read_ack("play_card", response).await
    }
}

#[async_trait]
impl LobbyServer for HttpGameServer {
    async fn create_game(&self, request: &CreateGameRequest) -> Result<String, LobbyError> {
        match self.client.post(self.url("create_game")).json(request).send().await {
            Err(error) => Err(LobbyError::Request(error.to_string())),
            Ok(response) if response.status().is_success() => {
                let created = response
                    .json::<CreateGameResponse>()
                    .await
                    .map_err(|_| LobbyError::Parse("CreateGameResponse".to_string()))?;
                Ok(created.game_code)
            }
            Ok(response) => Err(HttpGameServer::lobby_error(response).await),
        }
    }

    async fn join_game(&self, request: &JoinGameRequest) -> Result<(), LobbyError> {
        match self.client.post(self.url("join_game")).json(request).send().await {
            Err(error) => Err(LobbyError::Request(error.to_string())),
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(HttpGameServer::lobby_error(response).await),
        }
    }

    async fn list_players(&self, game_code: &str) -> Result<Vec<LobbyPlayer>, LobbyError> {
        let api_url = self.url(&format!("players/{game_code}"));
        match self.client.get(api_url).send().await {
            Err(error) => Err(LobbyError::Request(error.to_string())),
            Ok(response) if response.status().is_success() => response
                .json::<Vec<LobbyPlayer>>()
                .await
                .map_err(|_| LobbyError::Parse("Vec<LobbyPlayer>".to_string())),
            Ok(response) => Err(HttpGameServer::lobby_error(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let server = HttpGameServer::new("http://localhost:8000/");
        assert_eq!(
            server.url("game_state/ABCD"),
            "http://localhost:8000/game_state/ABCD"
        );
    }
}
