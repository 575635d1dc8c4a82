use thiserror::Error;

/// Failures on the snapshot channels (push socket and one-shot pull).
///
/// None of these are fatal: the push loop reconnects and the poll loop
/// retries on its next tick.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected response status: {0}")]
    Status(u16),
    #[error("malformed snapshot: {0}")]
    Parse(String),
    #[error("push channel error: {0}")]
    Socket(String),
}

/// Outcome of a draw or play request that did not go through.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    Rejected(String),
    #[error("action could not be sent ({0})")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("lobby request failed: {0}")]
    Request(String),
    #[error("lobby server answered {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid lobby response body ({0})")]
    Parse(String),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("unable to access identity file: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity file is corrupted: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no game joined yet, run `create` or `join` first")]
    Missing,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings: {0}")]
    Config(#[from] config::ConfigError),
}

/// Client-side rejections raised before anything reaches the network.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Not your turn or not in play phase.")]
    NotPlayPhase,
    #[error("Not your turn or not in draw phase.")]
    NotDrawPhase,
    #[error("That card is no longer in your hand.")]
    MissingCard,
    #[error("Select a valid target player.")]
    MissingTarget,
}
