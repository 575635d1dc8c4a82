use crate::logger;
use crate::models::client_requests::{CreateGameRequest, JoinGameRequest};
use crate::models::http_response::LobbyPlayer;
use crate::models::identity::{ClientIdentity, IdentityStore};
use crate::transport::http::LobbyServer;
use crate::utils::errors::LobbyError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Pre-game flow: create or join a game, then watch who else joined.
pub struct Lobby {
    server: Arc<dyn LobbyServer>,
    store: IdentityStore,
}

impl Lobby {
    pub fn new(server: Arc<dyn LobbyServer>, store: IdentityStore) -> Self {
        Self { server, store }
    }

    /// Creates a game hosted by `username` and joins it.
    ///
    /// # Returns
    /// * `Ok(ClientIdentity)` - The identity for the new game, already persisted.
    /// * `Err(LobbyError)` - Blank username, or the server refused either step.
    pub async fn create_game(&self, username: &str) -> Result<ClientIdentity, LobbyError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LobbyError::InvalidInput("username is empty".to_string()));
        }

        let request = CreateGameRequest {
            username: username.to_string(),
        };
        let game_code = self.server.create_game(&request).await?;
        logger!(INFO, "[LOBBY] Created game `{game_code}`");

        self.join_game(&game_code, username).await
    }

    /// Joins an existing game. The code is trimmed and upper-cased first.
    pub async fn join_game(
        &self,
        game_code: &str,
        username: &str,
    ) -> Result<ClientIdentity, LobbyError> {
        let game_code = game_code.trim().to_uppercase();
        let username = username.trim();
        if game_code.is_empty() || username.is_empty() {
            return Err(LobbyError::InvalidInput(
                "enter a valid code and name".to_string(),
            ));
        }

        let request = JoinGameRequest {
            game_code: game_code.clone(),
            username: username.to_string(),
        };
        self.server.join_game(&request).await?;

        let identity = ClientIdentity::new(game_code, username);
        self.store.save(&identity)?;
        logger!(INFO, "[LOBBY] Joined `{}` as `{}`", identity.game_code(), identity.username());
        Ok(identity)
    }

    pub async fn list_players(&self, game_code: &str) -> Result<Vec<LobbyPlayer>, LobbyError> {
        self.server.list_players(game_code).await
    }

    /// Polls the player list and forwards every successful fetch.
    ///
    /// Stops once the receiving side is dropped.
    pub fn watch_players(
        &self,
        game_code: &str,
        interval: Duration,
        sender: Sender<Vec<LobbyPlayer>>,
    ) -> JoinHandle<()> {
        let server = Arc::clone(&self.server);
        let game_code = game_code.to_string();
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match server.list_players(&game_code).await {
                    Ok(players) => {
                        if sender.send(players).await.is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        logger!(ERROR, "[LOBBY] Failed to fetch players for `{game_code}` ({error})");
                    }
                }
            }
        })
    }
}

/// Player names one per line, as shown in the waiting room.
pub fn format_players(players: &[LobbyPlayer]) -> String {
    let mut out = String::from("Players:");
    for player in players {
        out.push('\n');
        out.push_str(&player.username);
    }
    out
}
