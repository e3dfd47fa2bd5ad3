use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use super::{Connection, Connector, DEFAULT_MAX_FRAME_LENGTH, Error, FrameCodec, codec_error};

/// Newline delimited frames over plain TCP.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    address: String,
    max_frame_length: usize,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    pub const fn max_frame_length(mut self, max: usize) -> Self {
        self.max_frame_length = max;
        self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    fn peer(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<Connection, Error> {
        let stream =
            TcpStream::connect(&self.address)
                .await
                .map_err(|source| Error::Connect {
                    address: self.address.clone(),
                    source,
                })?;

        if let Err(err) = stream.set_nodelay(true) {
            warn!(message = "Failed configuring TCP_NODELAY on connection", %err);
        }

        let max = self.max_frame_length;
        let framed = Framed::new(stream, FrameCodec::new(max));
        let (sink, stream) = framed.split::<String>();

        Ok(Connection {
            sink: Box::pin(sink.sink_map_err(move |err| codec_error(err, max))),
            stream: stream
                .map(move |result| match result {
                    Ok(frame) => frame,
                    Err(err) => Err(codec_error(err, max)),
                })
                .boxed(),
        })
    }
}
