use crate::logger;
use crate::models::client_requests::GameAction;
use crate::transport::adapter::Poller;
use crate::transport::http::GameServer;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Sends validated actions to the server off the render loop.
///
/// The response body is never trusted as state: every action is followed by a
/// fresh pull, and failures come back as notices.
#[derive(Clone)]
pub struct ActionDispatcher {
    server: Arc<dyn GameServer>,
    poller: Poller,
    notices: Sender<String>,
}

impl ActionDispatcher {
    pub fn new(server: Arc<dyn GameServer>, poller: Poller, notices: Sender<String>) -> Self {
        Self {
            server,
            poller,
            notices,
        }
    }

    pub fn dispatch(&self, action: GameAction) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let name = action.name();
            logger!(INFO, "[ACTION] Sending `{name}` for `{}`", action.game_code());

            let result = match &action {
                GameAction::Draw(request) => dispatcher.server.draw_card(request).await,
                GameAction::Play(request) => dispatcher.server.play_card(request).await,
            };

            if let Err(error) = result {
                logger!(WARN, "[ACTION] `{name}` failed ({error})");
                let notice = match name {
                    "draw" => format!("Failed to draw card: {error}"),
                    _ => format!("Failed to play card: {error}"),
                };
                let _ = dispatcher.notices.send(notice).await;
            }

            dispatcher.poller.poll_once().await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client_requests::{DrawCardRequest, PlayCardRequest};
    use crate::models::http_response::ActionAck;
    use crate::models::views::GameSnapshot;
    use crate::utils::errors::{ActionError, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct RejectingServer {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl GameServer for RejectingServer {
        async fn fetch_state(&self, _game_code: &str) -> Result<GameSnapshot, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_str(r#"{"phase":"play","current_turn_player_id":"x"}"#).unwrap())
        }

        async fn draw_card(&self, _request: &DrawCardRequest) -> Result<ActionAck, ActionError> {
            Ok(ActionAck {
                message: "Cards drawn".to_string(),
            })
        }

        async fn play_card(&self, _request: &PlayCardRequest) -> Result<ActionAck, ActionError> {
            Err(ActionError::Rejected("Not in play phase".to_string()))
        }
    }

    fn play() -> GameAction {
        GameAction::Play(PlayCardRequest {
            game_code: "ABCD".to_string(),
            player_id: "ABCD_alice".to_string(),
            card_id: "c1".to_string(),
            target_id: "ABCD_bob".to_string(),
        })
    }

    #[tokio::test]
    async fn test_rejected_action_becomes_notice_and_refetches() {
        let server = Arc::new(RejectingServer {
            fetches: AtomicUsize::new(0),
        });
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel(4);
        let (notice_tx, mut notice_rx) = mpsc::channel(4);
        let dispatcher = ActionDispatcher::new(
            server.clone(),
            Poller::new("ABCD", server.clone(), snapshot_tx),
            notice_tx,
        );

        dispatcher.dispatch(play()).await.unwrap();

        assert_eq!(
            notice_rx.recv().await.unwrap(),
            "Failed to play card: Not in play phase"
        );
        assert!(snapshot_rx.recv().await.is_some());
        assert_eq!(server.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_action_only_refetches() {
        let server = Arc::new(RejectingServer {
            fetches: AtomicUsize::new(0),
        });
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel(4);
        let (notice_tx, mut notice_rx) = mpsc::channel(4);
        let dispatcher = ActionDispatcher::new(
            server.clone(),
            Poller::new("ABCD", server.clone(), snapshot_tx),
            notice_tx,
        );

        let draw = GameAction::Draw(DrawCardRequest {
            game_code: "ABCD".to_string(),
            player_id: "ABCD_alice".to_string(),
        });
        dispatcher.dispatch(draw).await.unwrap();

        assert!(snapshot_rx.recv().await.is_some());
        assert!(notice_rx.try_recv().is_err());
    }
}
