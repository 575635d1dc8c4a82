use super::http::GameServer;
use super::push::PushConnector;
use crate::logger;
use crate::models::views::GameSnapshot;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// One-shot pull of the current snapshot, shared with the action dispatcher.
#[derive(Clone)]
pub struct Poller {
    game_code: String,
    server: Arc<dyn GameServer>,
    sender: Sender<GameSnapshot>,
}

impl Poller {
    pub fn new(game_code: &str, server: Arc<dyn GameServer>, sender: Sender<GameSnapshot>) -> Self {
        Self {
            game_code: game_code.to_string(),
            server,
            sender,
        }
    }

    /// Fetches the snapshot once and forwards it downstream.
    ///
    /// Failures are logged and swallowed, the next poll retries.
    ///
    /// # Returns
    /// `true` if a snapshot was delivered.
    pub async fn poll_once(&self) -> bool {
        match self.server.fetch_state(&self.game_code).await {
            Ok(snapshot) => self.sender.send(snapshot).await.is_ok(),
            Err(error) => {
                logger!(
                    ERROR,
                    "[POLL] Failed to fetch game state for `{}` ({error})",
                    self.game_code
                );
                false
            }
        }
    }
}

/// Feeds snapshots from the push channel and the fallback poll into one queue.
///
/// Every spawned loop is owned here and aborted on [`TransportAdapter::shutdown`]
/// or when the adapter is dropped.
pub struct TransportAdapter {
    poller: Poller,
    connector: Arc<dyn PushConnector>,
    reconnect_delay: Duration,
    push_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
}

impl TransportAdapter {
    pub fn new(
        game_code: &str,
        server: Arc<dyn GameServer>,
        connector: Arc<dyn PushConnector>,
        sender: Sender<GameSnapshot>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            poller: Poller::new(game_code, server, sender),
            connector,
            reconnect_delay,
            push_task: None,
            poll_task: None,
        }
    }

    pub fn poller(&self) -> Poller {
        self.poller.clone()
    }

    /// Opens the push channel and keeps it open.
    ///
    /// Each text frame is parsed as a [`GameSnapshot`]; frames that fail to
    /// parse are dropped. Whenever the channel closes or cannot be opened, the
    /// loop waits `reconnect_delay` and tries again, without a retry limit.
    pub fn connect(&mut self) {
        if let Some(task) = self.push_task.take() {
            task.abort();
        }

        let connector = Arc::clone(&self.connector);
        let sender = self.poller.sender.clone();
        let game_code = self.poller.game_code.clone();
        let delay = self.reconnect_delay;

        self.push_task = Some(tokio::spawn(async move {
            loop {
                match connector.open(&game_code).await {
                    Err(error) => {
                        logger!(WARN, "[PUSH] Could not open channel for `{game_code}` ({error})");
                    }
                    Ok(mut frames) => {
                        logger!(DEBUG, "[PUSH] Channel open for `{game_code}`");
                        while let Some(frame) = frames.next().await {
                            let text = match frame {
                                Ok(text) => text,
                                Err(error) => {
                                    logger!(WARN, "[PUSH] Channel error ({error})");
                                    break;
                                }
                            };

                            match serde_json::from_str::<GameSnapshot>(&text) {
                                Ok(snapshot) => {
                                    if sender.send(snapshot).await.is_err() {
                                        // Nobody is rendering anymore.
                                        return;
                                    }
                                }
                                Err(error) => {
                                    logger!(WARN, "[PUSH] Dropped malformed snapshot ({error})");
                                }
                            }
                        }
                        logger!(INFO, "[PUSH] Channel for `{game_code}` closed");
                    }
                }

                if sender.is_closed() {
                    return;
                }
                logger!(DEBUG, "[PUSH] Reconnecting in {}ms", delay.as_millis());
                time::sleep(delay).await;
            }
        }));
    }

    /// Polls on a fixed period regardless of push-channel health.
    pub fn start_fallback_polling(&mut self, interval: Duration) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }

        let poller = self.poller.clone();
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if poller.sender.is_closed() {
                    return;
                }
                poller.poll_once().await;
            }
        }));
    }

    /// Stops the push loop, any pending reconnect and the poll loop.
    pub fn shutdown(&mut self) {
        for task in [self.push_task.take(), self.poll_task.take()].into_iter().flatten() {
            task.abort();
        }
        logger!(DEBUG, "[TRANSPORT] Transport for `{}` shut down", self.poller.game_code);
    }
}

impl Drop for TransportAdapter {
    fn drop(&mut self) {
        for task in [self.push_task.take(), self.poll_task.take()].into_iter().flatten() {
            task.abort();
        }
    }
}
