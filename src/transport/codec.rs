use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use super::Error;

/// Newline delimited text frames.
///
/// A line longer than the limit is reported as [`Error::FrameTooLong`] and
/// skipped, decoding carries on with the next line. A plain `LinesCodec`
/// error would end the framed stream instead.
#[derive(Clone, Debug)]
pub struct FrameCodec {
    lines: LinesCodec,
    max: usize,
}

impl FrameCodec {
    pub fn new(max: usize) -> Self {
        FrameCodec {
            lines: LinesCodec::new_with_max_length(max),
            max,
        }
    }

    fn skip_oversized(
        &self,
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Result<String, Error>>, LinesCodecError> {
        match result {
            Ok(frame) => Ok(frame.map(Ok)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Err(Error::FrameTooLong { max: self.max })))
            }
            Err(err) => Err(err),
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Result<String, Error>;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = self.lines.decode(buf);
        self.skip_oversized(result)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = self.lines.decode_eof(buf);
        self.skip_oversized(result)
    }
}

impl<T: AsRef<str>> Encoder<T> for FrameCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.lines.encode(line, dst)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn frames(codec: &mut FrameCodec, buf: &mut BytesMut) -> Vec<Result<String, String>> {
        let mut out = vec![];
        while let Some(frame) = codec.decode(buf).unwrap() {
            out.push(frame.map_err(|err| err.to_string()));
        }
        out
    }

    #[test]
    fn skips_oversized_line_and_continues() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from("first\n0123456789abcdef\nsecond\n");

        assert_eq!(
            frames(&mut codec, &mut buf),
            vec![
                Ok("first".to_string()),
                Err("frame exceeds 8 bytes".to_string()),
                Ok("second".to_string()),
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn oversized_line_split_across_reads() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from("0123456789");

        assert_eq!(
            frames(&mut codec, &mut buf),
            vec![Err("frame exceeds 8 bytes".to_string())]
        );

        buf.extend_from_slice(b"abcdef\nnext\n");
        assert_eq!(frames(&mut codec, &mut buf), vec![Ok("next".to_string())]);
    }

    #[test]
    fn encodes_lines() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::new();

        codec.encode("hello", &mut buf).unwrap();
        assert_eq!(&buf[..], b"hello\n");
    }
}
