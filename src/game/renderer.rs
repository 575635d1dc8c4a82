use super::render_cache::ViewContext;
use crate::models::views::{CardView, GameSnapshot, PlayerView};
use std::fmt::Write;

/// What a click on an element asks for. Handlers carry values, not references,
/// so a node from an older render can never act on newer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    SelectCard { card_id: String },
    ChooseTarget { target_id: String },
    CancelTarget,
    Draw,
}

/// Open target-selection prompt for a card from the client's hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPrompt {
    pub card_id: String,
    pub card_label: String,
}

/// Session-owned display state that is not part of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub prompt: Option<TargetPrompt>,
    pub notice: Option<String>,
}

/// DOM-equivalent element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewNode {
    pub id: Option<String>,
    pub class: String,
    pub text: String,
    pub title: Option<String>,
    pub on_click: Option<Interaction>,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    pub fn new(class: &str) -> Self {
        Self {
            id: None,
            class: class.to_string(),
            text: String::new(),
            title: None,
            on_click: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.is_empty() {
            self.title = Some(title);
        }
        self
    }

    pub fn on_click(mut self, interaction: Interaction) -> Self {
        self.on_click = Some(interaction);
        self
    }

    pub fn child(mut self, child: ViewNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ViewNode>) -> Self {
        self.children.extend(children);
        self
    }

    fn write_text(&self, depth: usize, out: &mut String) {
        let _ = write!(out, "{}{}", "  ".repeat(depth), self.class);
        if let Some(id) = &self.id {
            let _ = write!(out, "#{id}");
        }
        if self.on_click.is_some() {
            out.push('*');
        }
        if !self.text.is_empty() {
            let _ = write!(out, ": {}", self.text);
        }
        if let Some(title) = &self.title {
            let _ = write!(out, " ({title})");
        }
        out.push('\n');

        for child in &self.children {
            child.write_text(depth + 1, out);
        }
    }
}

/// Output of one render. Replaced wholesale on the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTree {
    pub root: ViewNode,
}

impl ViewTree {
    /// Node at a child-index path from the root.
    pub fn node_at(&self, path: &[usize]) -> Option<&ViewNode> {
        path.iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    /// Child-index path of the first node with the given id.
    pub fn path_of(&self, id: &str) -> Option<Vec<usize>> {
        fn search(node: &ViewNode, id: &str, path: &mut Vec<usize>) -> bool {
            if node.id.as_deref() == Some(id) {
                return true;
            }
            for (index, child) in node.children.iter().enumerate() {
                path.push(index);
                if search(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.root, id, &mut path).then_some(path)
    }

    pub fn find(&self, id: &str) -> Option<&ViewNode> {
        self.path_of(id).and_then(|path| self.node_at(&path))
    }

    /// Every node that carries a click handler, in document order.
    #[cfg(test)]
    pub fn clickable(&self) -> Vec<&ViewNode> {
        fn collect<'a>(node: &'a ViewNode, out: &mut Vec<&'a ViewNode>) {
            if node.on_click.is_some() {
                out.push(node);
            }
            for child in &node.children {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    /// Deterministic plain-text rendering, one node per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.root.write_text(0, &mut out);
        out
    }
}

/// Status markers in their fixed display order.
pub fn status_text(player: &PlayerView) -> String {
    let mut status = Vec::new();
    if player.eliminated {
        status.push("💀 Eliminated".to_string());
    }
    if player.snakebit {
        status.push("🐍 Snakebit".to_string());
    }
    if player.entranced {
        status.push("🔮 Entranced".to_string());
    }
    if player.is_primed {
        status.push("💣 Primed".to_string());
    }
    if player.shield > 0 {
        status.push(format!("🛡️ Shield x{}", player.shield));
    }
    status.join(" | ")
}

/// Long-form effect descriptions shown under the client's own hand.
pub fn effects_text(player: &PlayerView) -> String {
    let mut effects = Vec::new();
    if player.snakebit {
        effects.push("🐍 Snakebit: skip next play".to_string());
    }
    if player.entranced {
        effects.push("🔮 Entranced: play face up".to_string());
    }
    if player.is_primed {
        effects.push("💣 Primed: bomb will explode".to_string());
    }
    if player.shield > 0 {
        effects.push(format!("🛡️ Shield x{}", player.shield));
    }
    effects.join(" | ")
}

fn is_me(player: &PlayerView, ctx: &ViewContext) -> bool {
    ctx.me.is_some_and(|me| me.username == player.username)
}

fn render_player(player: &PlayerView) -> ViewNode {
    let avatar = player.username.chars().next().map(String::from).unwrap_or_default();
    let username = if player.is_royal {
        format!("{} 👑", player.username)
    } else {
        player.username.clone()
    };

    let hand = player.hand.iter().map(|card| {
        let label = if card.is_primed {
            format!("{} 🔥", card.label())
        } else {
            card.label().to_string()
        };
        ViewNode::new("card")
            .with_text(label)
            .with_title(card.description.as_str())
    });

    ViewNode::new("playerArea")
        .with_id(format!("player-{}", player.username))
        .child(ViewNode::new("avatar").with_text(avatar))
        .child(ViewNode::new("username").with_text(username))
        .child(ViewNode::new("health").with_text(format!("❤️ {}", player.health)))
        .child(ViewNode::new("status").with_text(status_text(player)))
        .child(ViewNode::new("hand").children(hand))
}

fn render_own_card(index: usize, card: &CardView) -> ViewNode {
    let class = if card.is_primed { "card primed" } else { "card" };
    ViewNode::new(class)
        .with_id(format!("hand-card-{index}"))
        .with_text(card.label())
        .with_title(card.description.as_str())
        .on_click(Interaction::SelectCard {
            card_id: card.id.clone(),
        })
}

fn render_bottom_hand(ctx: &ViewContext) -> ViewNode {
    let mut bottom = ViewNode::new("bottomHand").with_id("bottomHand");
    if let Some(me) = ctx.me {
        bottom = bottom.children(
            me.hand
                .iter()
                .enumerate()
                .map(|(index, card)| render_own_card(index, card)),
        );

        let effects = effects_text(me);
        if !effects.is_empty() {
            bottom = bottom.child(ViewNode::new("effects").with_text(effects));
        }
    }
    bottom
}

fn render_target_modal(snapshot: &GameSnapshot, ctx: &ViewContext, prompt: &TargetPrompt) -> ViewNode {
    let targets = snapshot
        .players
        .iter()
        .filter(|player| !is_me(player, ctx))
        .enumerate()
        .map(|(index, player)| {
            ViewNode::new("button")
                .with_id(format!("target-{index}"))
                .with_text(player.username.as_str())
                .on_click(Interaction::ChooseTarget {
                    target_id: player.id.clone(),
                })
        });

    ViewNode::new("modal")
        .with_id("targetModal")
        .with_text(format!("Play {} on:", prompt.card_label))
        .child(ViewNode::new("targetList").with_id("targetList").children(targets))
        .child(
            ViewNode::new("button")
                .with_id("cancelTarget")
                .with_text("Cancel")
                .on_click(Interaction::CancelTarget),
        )
}

/// Projects a snapshot into a fresh view tree.
///
/// The whole tree is rebuilt on every call; nothing from a previous render
/// is reused.
pub fn render(snapshot: &GameSnapshot, ctx: &ViewContext, ui: &UiState) -> ViewTree {
    let turn = if ctx.is_my_turn {
        "Your Turn".to_string()
    } else {
        snapshot.current_turn_player_id.clone()
    };

    let mut root = ViewNode::new("game")
        .child(
            ViewNode::new("indicator")
                .with_id("phaseIndicator")
                .with_text(format!("Phase: {}", snapshot.phase)),
        )
        .child(
            ViewNode::new("indicator")
                .with_id("turnIndicator")
                .with_text(format!("Turn: {turn}")),
        );

    if let Some(round) = snapshot.round {
        root = root.child(
            ViewNode::new("indicator")
                .with_id("round")
                .with_text(format!("Round: {round}")),
        );
    }

    if let Some(winner) = &snapshot.winner {
        root = root.child(
            ViewNode::new("indicator")
                .with_id("winner")
                .with_text(format!("Winner: {winner}")),
        );
    }

    if let Some(me) = ctx.me {
        root = root.child(
            ViewNode::new("health")
                .with_id("health")
                .with_text(format!("❤️ {}", me.health)),
        );
    }

    let areas = snapshot
        .players
        .iter()
        .filter(|player| !is_me(player, ctx))
        .map(render_player);
    root = root
        .child(ViewNode::new("gameArea").with_id("gameArea").children(areas))
        .child(render_bottom_hand(ctx));

    let draw_class = if ctx.turn_state.can_draw() {
        "button"
    } else {
        "button disabled"
    };
    root = root.child(
        ViewNode::new(draw_class)
            .with_id("drawButton")
            .with_text("Draw")
            .on_click(Interaction::Draw),
    );

    if let Some(prompt) = &ui.prompt {
        root = root.child(render_target_modal(snapshot, ctx, prompt));
    }

    if let Some(notice) = &ui.notice {
        root = root.child(ViewNode::new("notice").with_id("notice").with_text(notice.as_str()));
    }

    ViewTree { root }
}
