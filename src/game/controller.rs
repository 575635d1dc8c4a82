use super::dispatcher::ActionDispatcher;
use super::session::{GameSession, Reaction};
use crate::logger;
use crate::models::views::GameSnapshot;
use crate::transport::adapter::Poller;
use std::str::FromStr;
use tokio::task::JoinHandle;

/// Line commands accepted by the terminal front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Draw,
    Card(usize),
    Target(usize),
    Cancel,
    Refresh,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let index = |arg: Option<&str>| -> Result<usize, String> {
            arg.ok_or_else(|| format!("`{verb}` needs a position"))?
                .parse::<usize>()
                .map_err(|_| format!("`{verb}` needs a numeric position"))
        };

        match verb.as_str() {
            "draw" | "d" => Ok(Command::Draw),
            "card" | "c" => Ok(Command::Card(index(parts.next())?)),
            "target" | "t" => Ok(Command::Target(index(parts.next())?)),
            "cancel" => Ok(Command::Cancel),
            "refresh" | "r" => Ok(Command::Refresh),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command `{other}`")),
        }
    }
}

pub const HELP: &str = "commands: draw | card <n> | target <n> | cancel | refresh | quit";

/// Single consumer of snapshots, notices and user commands.
///
/// Everything that touches the session goes through here one event at a time.
pub struct Controller {
    session: GameSession,
    dispatcher: ActionDispatcher,
    poller: Poller,
}

impl Controller {
    pub fn new(session: GameSession, dispatcher: ActionDispatcher, poller: Poller) -> Self {
        Self {
            session,
            dispatcher,
            poller,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn on_snapshot(&mut self, snapshot: GameSnapshot) {
        self.session.ingest(snapshot);
    }

    pub fn on_notice(&mut self, notice: String) {
        self.session.notify(notice);
    }

    /// Applies a command. Returns the spawned network task, if any.
    pub fn on_command(&mut self, command: Command) -> Option<JoinHandle<()>> {
        let element = match &command {
            Command::Draw => "drawButton".to_string(),
            Command::Card(index) => format!("hand-card-{index}"),
            Command::Target(index) => format!("target-{index}"),
            Command::Cancel => "cancelTarget".to_string(),
            Command::Refresh => {
                let poller = self.poller.clone();
                return Some(tokio::spawn(async move {
                    poller.poll_once().await;
                }));
            }
            Command::Help => {
                self.session.notify(HELP);
                return None;
            }
            Command::Quit => return None,
        };

        let Some(handle) = self.session.find(&element) else {
            if self.session.view().is_some() {
                self.session.notify(format!("Nothing to click at `{element}`."));
            } else {
                logger!(WARN, "[SESSION] No game state received yet");
            }
            return None;
        };

        match self.session.click(&handle) {
            Reaction::Submit(action) => Some(self.dispatcher.dispatch(action)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client_requests::{DrawCardRequest, PlayCardRequest};
    use crate::models::http_response::ActionAck;
    use crate::models::identity::ClientIdentity;
    use crate::transport::http::GameServer;
    use crate::utils::errors::{ActionError, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingServer {
        draws: AtomicUsize,
        plays: AtomicUsize,
    }

    #[async_trait]
    impl GameServer for CountingServer {
        async fn fetch_state(&self, _game_code: &str) -> Result<GameSnapshot, TransportError> {
            Err(TransportError::Status(503))
        }

        async fn draw_card(&self, _request: &DrawCardRequest) -> Result<ActionAck, ActionError> {
            self.draws.fetch_add(1, Ordering::SeqCst);
            Ok(ActionAck::default())
        }

        async fn play_card(&self, _request: &PlayCardRequest) -> Result<ActionAck, ActionError> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(ActionAck::default())
        }
    }

    fn controller(server: Arc<CountingServer>) -> Controller {
        let (snapshot_tx, _) = mpsc::channel(4);
        let (notice_tx, _) = mpsc::channel(4);
        let poller = Poller::new("ABCD", server.clone(), snapshot_tx);
        let dispatcher = ActionDispatcher::new(server, poller.clone(), notice_tx);
        Controller::new(
            GameSession::new(ClientIdentity::new("ABCD", "alice")),
            dispatcher,
            poller,
        )
    }

    fn snapshot(phase: &str, turn: &str) -> GameSnapshot {
        serde_json::from_value(serde_json::json!({
            "phase": phase,
            "current_turn_player_id": turn,
            "players": [
                {"id": "ABCD_alice", "username": "alice", "hand": [{"id": "c1", "type": "Dagger"}]},
                {"id": "ABCD_bob", "username": "bob"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("draw".parse::<Command>(), Ok(Command::Draw));
        assert_eq!("card 2".parse::<Command>(), Ok(Command::Card(2)));
        assert_eq!("T 0".parse::<Command>(), Ok(Command::Target(0)));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert!("card".parse::<Command>().is_err());
        assert!("card x".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("   ".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_out_of_turn_actions_never_reach_the_server() {
        let server = Arc::new(CountingServer::default());
        let mut controller = controller(server.clone());

        for (phase, turn) in [("play", "ABCD_bob"), ("draw", "ABCD_bob"), ("resolve", "ABCD_alice")] {
            controller.on_snapshot(snapshot(phase, turn));
            assert!(controller.on_command(Command::Draw).is_none());
            assert!(controller.on_command(Command::Card(0)).is_none());
        }

        assert_eq!(server.draws.load(Ordering::SeqCst), 0);
        assert_eq!(server.plays.load(Ordering::SeqCst), 0);
        let notice = controller.session().view().unwrap().find("notice").unwrap();
        assert_eq!(notice.text, "Not your turn or not in play phase.");
    }

    #[tokio::test]
    async fn test_actions_on_my_turn_are_sent() {
        let server = Arc::new(CountingServer::default());
        let mut controller = controller(server.clone());

        controller.on_snapshot(snapshot("draw", "ABCD_alice"));
        controller.on_command(Command::Draw).unwrap().await.unwrap();
        assert_eq!(server.draws.load(Ordering::SeqCst), 1);

        controller.on_snapshot(snapshot("play", "ABCD_alice"));
        assert!(controller.on_command(Command::Card(0)).is_none());
        controller.on_command(Command::Target(0)).unwrap().await.unwrap();
        assert_eq!(server.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_element_is_reported() {
        let server = Arc::new(CountingServer::default());
        let mut controller = controller(server);

        // No snapshot yet, nothing to click
        assert!(controller.on_command(Command::Card(0)).is_none());
        assert!(controller.session().view().is_none());

        controller.on_snapshot(snapshot("play", "ABCD_alice"));
        assert!(controller.on_command(Command::Card(5)).is_none());
        assert_eq!(
            controller.session().view().unwrap().find("notice").unwrap().text,
            "Nothing to click at `hand-card-5`."
        );
    }
}
