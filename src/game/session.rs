use super::render_cache::{derive_view_context, RenderCache, TurnState};
use super::renderer::{render, Interaction, TargetPrompt, UiState, ViewTree};
use crate::logger;
use crate::models::client_requests::{DrawCardRequest, GameAction, PlayCardRequest};
use crate::models::identity::ClientIdentity;
use crate::models::views::GameSnapshot;
use crate::utils::errors::ValidationError;

/// Reference to an element of one particular render.
///
/// Handles from earlier renders resolve to nothing once the tree is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    generation: u64,
    path: Vec<usize>,
}

/// Result of a click, for the caller to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Stale handle, or an element without a handler.
    Inert,
    /// Rejected client-side; nothing must be sent.
    Notice(String),
    PromptOpened,
    PromptClosed,
    /// Passed gating and validation, ready for the server.
    Submit(GameAction),
}

/// One player's view of one game: the snapshot cache, the UI state around it
/// and the tree produced by the latest render.
pub struct GameSession {
    identity: ClientIdentity,
    cache: RenderCache,
    ui: UiState,
    view: Option<ViewTree>,
    generation: u64,
}

impl GameSession {
    pub fn new(identity: ClientIdentity) -> Self {
        Self {
            identity,
            cache: RenderCache::new(),
            ui: UiState::default(),
            view: None,
            generation: 0,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn view(&self) -> Option<&ViewTree> {
        self.view.as_ref()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn turn_state(&self) -> Option<TurnState> {
        self.cache
            .current()
            .map(|snapshot| derive_view_context(snapshot, &self.identity).turn_state)
    }

    /// Stores the snapshot and renders it once.
    ///
    /// An open target prompt survives only while its card is still in hand
    /// and it is still this client's play turn. A notice is dropped as soon as
    /// the turn state it was raised in changes.
    pub fn ingest(&mut self, snapshot: GameSnapshot) -> Option<&ViewTree> {
        let previous = self.turn_state();
        let snapshot = self.cache.ingest(snapshot);
        let current = derive_view_context(snapshot, &self.identity).turn_state;

        if self.ui.notice.is_some() && previous != Some(current) {
            logger!(DEBUG, "[SESSION] Turn state is now {current:?}, clearing notice");
            self.ui.notice = None;
        }

        if let Some(prompt) = &self.ui.prompt {
            let ctx = derive_view_context(snapshot, &self.identity);
            let still_in_hand = ctx
                .me
                .is_some_and(|me| me.hand.iter().any(|card| card.id == prompt.card_id));
            if !ctx.turn_state.can_play() || !still_in_hand {
                logger!(DEBUG, "[SESSION] Closing target prompt for `{}`", prompt.card_id);
                self.ui.prompt = None;
            }
        }

        self.rerender();
        self.view.as_ref()
    }

    /// Shows a message from outside the render loop, e.g. a rejected action.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.ui.notice = Some(message.into());
        self.rerender();
    }

    pub fn find(&self, id: &str) -> Option<ElementHandle> {
        let path = self.view.as_ref()?.path_of(id)?;
        Some(ElementHandle {
            generation: self.generation,
            path,
        })
    }

    /// Handles a click on a rendered element.
    pub fn click(&mut self, handle: &ElementHandle) -> Reaction {
        if handle.generation != self.generation {
            logger!(DEBUG, "[SESSION] Ignoring click on stale render {}", handle.generation);
            return Reaction::Inert;
        }

        let interaction = self
            .view
            .as_ref()
            .and_then(|view| view.node_at(&handle.path))
            .and_then(|node| node.on_click.clone());

        let reaction = match interaction {
            None => return Reaction::Inert,
            Some(Interaction::SelectCard { card_id }) => match self.open_prompt(&card_id) {
                Ok(prompt) => {
                    self.ui.prompt = Some(prompt);
                    self.ui.notice = None;
                    Reaction::PromptOpened
                }
                Err(error) => self.reject(error),
            },
            Some(Interaction::ChooseTarget { target_id }) => match self.resolve_play(&target_id) {
                Ok(request) => {
                    self.ui.prompt = None;
                    self.ui.notice = None;
                    Reaction::Submit(GameAction::Play(request))
                }
                Err(error) => self.reject(error),
            },
            Some(Interaction::CancelTarget) => {
                self.ui.prompt = None;
                Reaction::PromptClosed
            }
            Some(Interaction::Draw) => match self.resolve_draw() {
                Ok(request) => {
                    self.ui.notice = None;
                    Reaction::Submit(GameAction::Draw(request))
                }
                Err(error) => self.reject(error),
            },
        };

        self.rerender();
        reaction
    }

    fn reject(&mut self, error: ValidationError) -> Reaction {
        // A missing target keeps the prompt open so another one can be picked.
        if error != ValidationError::MissingTarget {
            self.ui.prompt = None;
        }
        let message = error.to_string();
        logger!(INFO, "[SESSION] {message}");
        self.ui.notice = Some(message.clone());
        Reaction::Notice(message)
    }

    fn open_prompt(&self, card_id: &str) -> Result<TargetPrompt, ValidationError> {
        let snapshot = self.cache.current().ok_or(ValidationError::NotPlayPhase)?;
        let ctx = derive_view_context(snapshot, &self.identity);
        if !ctx.turn_state.can_play() {
            return Err(ValidationError::NotPlayPhase);
        }

        let card = ctx
            .me
            .and_then(|me| me.hand.iter().find(|card| card.id == card_id))
            .filter(|card| !card.id.is_empty())
            .ok_or(ValidationError::MissingCard)?;

        Ok(TargetPrompt {
            card_id: card.id.clone(),
            card_label: card.label().to_string(),
        })
    }

    /// Builds the play request from the open prompt, checking both ids
    /// against the current snapshot.
    fn resolve_play(&self, target_id: &str) -> Result<PlayCardRequest, ValidationError> {
        let prompt = self.ui.prompt.as_ref().ok_or(ValidationError::MissingCard)?;
        let snapshot = self.cache.current().ok_or(ValidationError::NotPlayPhase)?;
        let ctx = derive_view_context(snapshot, &self.identity);
        if !ctx.turn_state.can_play() {
            return Err(ValidationError::NotPlayPhase);
        }

        let me = ctx.me.ok_or(ValidationError::MissingCard)?;
        if prompt.card_id.is_empty() || !me.hand.iter().any(|c| c.id == prompt.card_id) {
            return Err(ValidationError::MissingCard);
        }

        let target_exists = snapshot
            .players
            .iter()
            .any(|p| p.id == target_id && p.username != me.username);
        if target_id.is_empty() || !target_exists {
            return Err(ValidationError::MissingTarget);
        }

        Ok(PlayCardRequest {
            game_code: self.identity.game_code().to_string(),
            player_id: self.identity.player_id().to_string(),
            card_id: prompt.card_id.clone(),
            target_id: target_id.to_string(),
        })
    }

    fn resolve_draw(&self) -> Result<DrawCardRequest, ValidationError> {
        match self.turn_state() {
            Some(TurnState::MyTurnDraw) => Ok(DrawCardRequest {
                game_code: self.identity.game_code().to_string(),
                player_id: self.identity.player_id().to_string(),
            }),
            _ => Err(ValidationError::NotDrawPhase),
        }
    }

    fn rerender(&mut self) {
        let Some(snapshot) = self.cache.current() else {
            return;
        };
        let ctx = derive_view_context(snapshot, &self.identity);
        self.view = Some(render(snapshot, &ctx, &self.ui));
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ClientIdentity {
        ClientIdentity::new("ABCD", "alice")
    }

    fn snapshot(phase: &str, turn: &str, hand: &[&str]) -> GameSnapshot {
        let hand: Vec<_> = hand
            .iter()
            .map(|id| serde_json::json!({"id": id, "type": format!("Card {id}")}))
            .collect();
        serde_json::from_value(serde_json::json!({
            "phase": phase,
            "current_turn_player_id": turn,
            "players": [
                {"id": "ABCD_alice", "username": "alice", "health": 5, "hand": hand},
                {"id": "ABCD_bob", "username": "bob", "health": 4},
                {"id": "ABCD_carol", "username": "carol", "health": 3}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_last_ingest_wins_in_either_order() {
        let first = snapshot("draw", "ABCD_alice", &["c1"]);
        let second = snapshot("play", "ABCD_bob", &["c2"]);

        let mut forward = GameSession::new(alice());
        forward.ingest(first.clone());
        forward.ingest(second.clone());

        let mut backward = GameSession::new(alice());
        backward.ingest(second.clone());
        backward.ingest(first.clone());

        let mut only_second = GameSession::new(alice());
        only_second.ingest(second);
        let mut only_first = GameSession::new(alice());
        only_first.ingest(first);

        assert_eq!(forward.view().unwrap().to_text(), only_second.view().unwrap().to_text());
        assert_eq!(backward.view().unwrap().to_text(), only_first.view().unwrap().to_text());
    }

    #[test]
    fn test_ingesting_twice_is_idempotent() {
        let mut session = GameSession::new(alice());
        let state = snapshot("play", "ABCD_alice", &["c1", "c2"]);

        let first = session.ingest(state.clone()).unwrap().to_text();
        let second = session.ingest(state).unwrap().to_text();
        assert_eq!(first, second);
        // Each snapshot still triggers exactly one render
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn test_not_my_turn_rejects_before_submitting() {
        let mut session = GameSession::new(alice());
        session.ingest(snapshot("play", "ABCD_bob", &["c1"]));

        let card = session.find("hand-card-0").unwrap();
        assert_eq!(
            session.click(&card),
            Reaction::Notice("Not your turn or not in play phase.".to_string())
        );
        assert!(session.view().unwrap().find("targetModal").is_none());

        let draw = session.find("drawButton").unwrap();
        assert_eq!(
            session.click(&draw),
            Reaction::Notice("Not your turn or not in draw phase.".to_string())
        );
        assert_eq!(
            session.view().unwrap().find("notice").unwrap().text,
            "Not your turn or not in draw phase."
        );
    }

    #[test]
    fn test_notice_clears_when_turn_changes() {
        let mut session = GameSession::new(alice());
        session.ingest(snapshot("play", "ABCD_bob", &["c1"]));
        let card = session.find("hand-card-0").unwrap();
        assert!(matches!(session.click(&card), Reaction::Notice(_)));

        // Still bob's turn: the notice stays
        session.ingest(snapshot("play", "ABCD_bob", &["c1"]));
        assert!(session.view().unwrap().find("notice").is_some());

        session.ingest(snapshot("play", "ABCD_alice", &["c1"]));
        session.ingest(snapshot("play", "ABCD_alice", &["c1"]));
        let view = session.view().unwrap();
        assert_eq!(view.find("turnIndicator").unwrap().text, "Turn: Your Turn");
        assert!(view.find("notice").is_none());
    }

    #[test]
    fn test_draw_only_in_draw_phase() {
        let mut session = GameSession::new(alice());
        session.ingest(snapshot("draw", "ABCD_alice", &["c1"]));

        let draw = session.find("drawButton").unwrap();
        assert_eq!(
            session.click(&draw),
            Reaction::Submit(GameAction::Draw(DrawCardRequest {
                game_code: "ABCD".to_string(),
                player_id: "ABCD_alice".to_string(),
            }))
        );

        // Card play is disabled while drawing
        let card = session.find("hand-card-0").unwrap();
        assert!(matches!(session.click(&card), Reaction::Notice(_)));
    }

    #[test]
    fn test_play_card_flow() {
        let mut session = GameSession::new(alice());
        session.ingest(snapshot("play", "ABCD_alice", &["c1", "c2"]));

        let card = session.find("hand-card-1").unwrap();
        assert_eq!(session.click(&card), Reaction::PromptOpened);

        let view = session.view().unwrap();
        assert_eq!(view.find("targetModal").unwrap().text, "Play Card c2 on:");
        assert_eq!(view.find("targetList").unwrap().children.len(), 2);

        let carol = session.find("target-1").unwrap();
        assert_eq!(
            session.click(&carol),
            Reaction::Submit(GameAction::Play(PlayCardRequest {
                game_code: "ABCD".to_string(),
                player_id: "ABCD_alice".to_string(),
                card_id: "c2".to_string(),
                target_id: "ABCD_carol".to_string(),
            }))
        );
        assert!(session.view().unwrap().find("targetModal").is_none());
    }

    #[test]
    fn test_handlers_from_previous_render_are_inert() {
        let mut session = GameSession::new(alice());
        session.ingest(snapshot("play", "ABCD_alice", &["a1", "a2", "a3"]));

        let view = session.view().unwrap();
        let cards: Vec<_> = view
            .clickable()
            .into_iter()
            .filter_map(|node| match &node.on_click {
                Some(Interaction::SelectCard { card_id }) => Some(card_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(cards, vec!["a1", "a2", "a3"]);
        let stale = session.find("hand-card-0").unwrap();

        session.ingest(snapshot("play", "ABCD_alice", &["b1", "b2"]));
        assert_eq!(session.click(&stale), Reaction::Inert);
        assert!(session.view().unwrap().find("targetModal").is_none());

        // The fresh handle is bound to the new hand
        let fresh = session.find("hand-card-0").unwrap();
        assert_eq!(session.click(&fresh), Reaction::PromptOpened);
        assert_eq!(
            session.view().unwrap().find("targetModal").unwrap().text,
            "Play Card b1 on:"
        );
        assert!(session.find("hand-card-2").is_none());
    }

    #[test]
    fn test_prompt_closes_when_card_leaves_hand() {
        let mut session = GameSession::new(alice());
        session.ingest(snapshot("play", "ABCD_alice", &["c1"]));
        let card = session.find("hand-card-0").unwrap();
        session.click(&card);
        assert!(session.view().unwrap().find("targetModal").is_some());

        // Same turn, card still held: prompt stays
        session.ingest(snapshot("play", "ABCD_alice", &["c1", "c9"]));
        assert!(session.view().unwrap().find("targetModal").is_some());

        session.ingest(snapshot("play", "ABCD_alice", &["c9"]));
        assert!(session.view().unwrap().find("targetModal").is_none());
    }

    #[test]
    fn test_target_without_id_is_rejected() {
        let state: GameSnapshot = serde_json::from_value(serde_json::json!({
            "phase": "play",
            "current_turn_player_id": "ABCD_alice",
            "players": [
                {"id": "ABCD_alice", "username": "alice", "hand": [{"id": "c1", "type": "Dagger"}]},
                {"username": "ghost"}
            ]
        }))
        .unwrap();
        let mut session = GameSession::new(alice());
        session.ingest(state);
        let card = session.find("hand-card-0").unwrap();
        session.click(&card);

        let ghost = session.find("target-0").unwrap();
        assert_eq!(
            session.click(&ghost),
            Reaction::Notice("Select a valid target player.".to_string())
        );
        // Prompt stays open for another pick
        assert!(session.view().unwrap().find("targetModal").is_some());

        let cancel = session.find("cancelTarget").unwrap();
        assert_eq!(session.click(&cancel), Reaction::PromptClosed);
        assert!(session.view().unwrap().find("targetModal").is_none());
    }

    #[test]
    fn test_notify_rerenders() {
        let mut session = GameSession::new(alice());
        session.notify("ignored until a snapshot arrives");
        assert!(session.view().is_none());

        session.ingest(snapshot("draw", "ABCD_bob", &[]));
        session.notify("Failed to draw: Not in draw phase");
        assert_eq!(
            session.view().unwrap().find("notice").unwrap().text,
            "Failed to draw: Not in draw phase"
        );
    }
}
