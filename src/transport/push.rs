use crate::logger;
use crate::utils::errors::TransportError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

/// Raw text frames of one push-channel connection. The stream ending means
/// the connection closed.
pub type PushStream = BoxStream<'static, Result<String, TransportError>>;

/// Opens push channels scoped to a game code.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn open(&self, game_code: &str) -> Result<PushStream, TransportError>;
}

/// WebSocket push channel at `{ws_base}/ws/{game_code}`.
pub struct WsConnector {
    url_for: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl WsConnector {
    pub fn new(url_for: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            url_for: Box::new(url_for),
        }
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn open(&self, game_code: &str) -> Result<PushStream, TransportError> {
        let url = (self.url_for)(game_code);
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Socket(e.to_string()))?;

        // Only the read half is used, the server never expects client frames.
        let (_write, read) = socket.split();
        let frames = read
            .take_while(|frame| futures::future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(|frame| futures::future::ready(frame_text(frame)));

        Ok(frames.boxed())
    }
}

/// Text carried by one frame. Control frames and binary frames that are not
/// UTF-8 carry none; only socket errors end the connection.
fn frame_text(
    frame: Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<String, TransportError>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text.to_string())),
        Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(Ok(text)),
            Err(error) => {
                logger!(WARN, "[PUSH] Dropped binary frame ({error})");
                None
            }
        },
        Ok(_) => None,
        Err(error) => Some(Err(TransportError::Socket(error.to_string()))),
    }
}
