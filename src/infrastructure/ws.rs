use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::errors::DomainError;
use crate::domain::ports::{ChannelConnector, ChannelSession};

pub const PERMISSIONS_PATH: &str = "/ws/permissions/";

/// Opens websocket sessions against the permissions endpoint.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(ws_base_url: &str) -> Self {
        Self {
            url: format!("{}{}", ws_base_url.trim_end_matches('/'), PERMISSIONS_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(&self, bearer: &str) -> Result<Box<dyn ChannelSession>, DomainError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| DomainError::InvalidInput(e.to_string()))?;
        let credential = HeaderValue::from_str(&format!("Bearer {}", bearer))
            .map_err(|e| DomainError::InvalidInput(e.to_string()))?;
        request.headers_mut().insert("Authorization", credential);

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| DomainError::Network(e.to_string()))?;
        Ok(Box::new(WsSession { stream }))
    }
}

struct WsSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl ChannelSession for WsSession {
    async fn next_text(&mut self) -> Option<Result<String, DomainError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(
                        String::from_utf8(bytes).map_err(|e| DomainError::Decode(e.to_string())),
                    )
                }
                Ok(Message::Close(_)) => return None,
                // ping/pong are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Some(Err(DomainError::Network(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            log::debug!("WebSocket close handshake failed: {}", e);
        }
    }
}
