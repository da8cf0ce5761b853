//! Opening the event stream.

use crate::frame::Envelope;
use async_trait::async_trait;
use eventsource_client::{self as es, Client};
use futures::stream::{BoxStream, StreamExt};
use log::*;
use std::fmt;

#[derive(Debug)]
pub enum TransportError {
    /// The request could not be built (bad URL or header).
    Build(String),
    /// The server could not be reached or refused the stream.
    Connect(String),
    /// An open stream failed.
    Stream(String),
    /// The server ended the stream.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Build(e) => write!(f, "invalid stream request: {e}"),
            TransportError::Connect(e) => write!(f, "could not open stream: {e}"),
            TransportError::Stream(e) => write!(f, "stream failed: {e}"),
            TransportError::Closed => write!(f, "stream closed by server"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type FrameStream = BoxStream<'static, Result<Envelope, TransportError>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves once the server has accepted the stream.
    async fn connect(&self) -> Result<FrameStream, TransportError>;
}

/// `GET {base_url}/notifications/stream` with a bearer session token.
pub struct EventSourceTransport {
    url: String,
    token: String,
}

impl EventSourceTransport {
    pub fn new(base_url: &str, token: impl Into<String>) -> Self {
        Self {
            url: format!("{}/notifications/stream", base_url.trim_end_matches('/')),
            token: token.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for EventSourceTransport {
    async fn connect(&self) -> Result<FrameStream, TransportError> {
        let client = es::ClientBuilder::for_url(&self.url)
            .map_err(|e| TransportError::Build(e.to_string()))?
            .header("Authorization", &format!("Bearer {}", self.token))
            .map_err(|e| TransportError::Build(e.to_string()))?
            // Reconnecting is the controller's job
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let mut stream = client.stream();

        loop {
            match stream.next().await {
                Some(Ok(es::SSE::Connected(_))) => break,
                Some(Ok(es::SSE::Comment(_))) => continue,
                Some(Ok(es::SSE::Event(event))) => {
                    warn!("Dropping frame received before the stream opened: {}", event.data);
                }
                Some(Err(e)) => return Err(TransportError::Connect(e.to_string())),
                None => return Err(TransportError::Closed),
            }
        }

        debug!("Stream open at {}", self.url);

        let frames = stream.filter_map(|item| async move {
            match item {
                Ok(es::SSE::Event(event)) => match Envelope::parse(&event.data) {
                    Ok(envelope) => Some(Ok(envelope)),
                    Err(e) => {
                        warn!("Skipping unreadable frame: {e}");
                        None
                    }
                },
                Ok(es::SSE::Comment(_)) | Ok(es::SSE::Connected(_)) => None,
                Err(e) => Some(Err(TransportError::Stream(e.to_string()))),
            }
        });

        Ok(frames.boxed())
    }
}
