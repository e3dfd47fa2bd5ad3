//! Framed text transport to the rules server.
//!
//! A [`Connector`] opens one [`Connection`] per attempt, the session decides
//! when and how often to retry.

mod codec;
mod tcp;

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Sink;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

pub use codec::FrameCodec;
pub use tcp::TcpConnector;

/// Frames are capped at this many bytes unless configured otherwise.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connect to {address} failed: {source}")]
    Connect { address: String, source: io::Error },

    #[error("frame exceeds {max} bytes")]
    FrameTooLong { max: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type FrameSink = Pin<Box<dyn Sink<String, Error = Error> + Send>>;
pub type FrameStream = BoxStream<'static, Result<String, Error>>;

/// An open, bidirectional stream of text frames.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Human readable peer, only used in logs.
    fn peer(&self) -> &str;

    async fn connect(&self) -> Result<Connection, Error>;
}

pub(crate) fn codec_error(err: LinesCodecError, max: usize) -> Error {
    match err {
        LinesCodecError::MaxLineLengthExceeded => Error::FrameTooLong { max },
        LinesCodecError::Io(err) => Error::Io(err),
    }
}
