//! Incremental RESP Request Decoder
//!
//! This module turns a stream of byte chunks into complete requests. Requests
//! are arrays of bulk strings, e.g. `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`.
//!
//! ## How the Decoder Works
//!
//! TCP delivers bytes in chunks of arbitrary size. A chunk may end in the
//! middle of a length line, in the middle of a payload, or carry several
//! requests at once. The decoder therefore keeps every byte it has not yet
//! turned into a request:
//!
//! 1. `feed()` appends a chunk to the internal buffer
//! 2. `next_frame()` tries to cut one complete request off the front
//! 3. If the request is incomplete it returns `Ok(None)` and keeps the bytes
//! 4. If the bytes are malformed it returns an error and drops the buffer
//!
//! Elements of a request are taken off the buffer as soon as each one is
//! complete, and the decoder remembers how many are still missing. A large
//! request that trickles in is therefore parsed once, not once per chunk.
//!
//! The decoder never waits for input itself; the caller decides when to read.
//!
//! ## Error Recovery
//!
//! After a malformed frame there is no reliable way to find the start of the
//! next one, so the buffered bytes are discarded. The decoder itself stays
//! usable and decodes whatever arrives next.

use crate::protocol::types::{prefix, Tokens, CRLF};
use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Errors that can occur while decoding requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A type prefix byte was expected but something else was found
    #[error("expected '{}', got '{}'", .expected.escape_ascii(), .found.escape_ascii())]
    UnexpectedByte { expected: u8, found: u8 },

    /// A length or count line did not hold an integer
    #[error("invalid length: '{0}'")]
    InvalidInteger(String),

    /// Array count is negative
    #[error("invalid multibulk length: {0}")]
    InvalidArrayLength(i64),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk length: {0}")]
    InvalidBulkLength(i64),

    /// A count or length exceeds the configured maximum
    #[error("{what} too large: {size} (max: {max})")]
    TooLarge {
        what: &'static str,
        size: u64,
        max: u64,
    },

    /// A length line grew past its maximum without a terminating CRLF
    #[error("length line too long")]
    LineTooLong,

    /// The bytes after a bulk payload were not CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingCrlf,

    /// The request array had no elements, so there is no command name
    #[error("empty command")]
    EmptyCommand,

    /// End of stream arrived in the middle of a request
    #[error("stream ended inside a request ({buffered} bytes buffered)")]
    Truncated { buffered: usize },

    /// Input was fed after end of stream
    #[error("decoder is closed")]
    Closed,
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: u64 = 512 * 1024 * 1024;

/// Maximum number of elements in one request array
pub const MAX_ARRAY_LEN: u64 = 1024 * 1024;

/// Maximum length of a `*<count>` or `$<length>` line, sigil and CRLF excluded
pub const MAX_LINE_LEN: usize = 32;

/// Everything one call to [`FrameDecoder::decode`] produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Complete requests, in arrival order
    pub frames: Vec<Tokens>,
    /// The error that stopped decoding, if any
    pub error: Option<DecodeError>,
}

/// An incremental request decoder.
///
/// # Example
///
/// ```
/// use ttlkv::protocol::FrameDecoder;
/// use bytes::Bytes;
///
/// let mut decoder = FrameDecoder::new();
///
/// // The first chunk stops in the middle of the key
/// let decoded = decoder.decode(b"*2\r\n$3\r\nGET\r\n$4\r\nna");
/// assert!(decoded.frames.is_empty());
///
/// let decoded = decoder.decode(b"me\r\n");
/// assert_eq!(decoded.frames, vec![vec![Bytes::from("GET"), Bytes::from("name")]]);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes received but not yet decoded
    buffer: BytesMut,
    /// The request currently being assembled, once its header is read
    partial: Option<Partial>,
    /// Set once end of stream has been signalled
    closed: bool,
}

/// A request whose header has been read but not all of its elements.
#[derive(Debug)]
struct Partial {
    /// Elements still to come
    remaining: u64,
    /// Elements decoded so far
    tokens: Tokens,
    /// Bytes already taken off the buffer for this request
    consumed: usize,
}

impl FrameDecoder {
    /// Creates a new decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of input.
    pub fn feed(&mut self, chunk: &[u8]) -> DecodeResult<()> {
        if self.closed {
            return Err(DecodeError::Closed);
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// Attempts to decode one request from the buffered input.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(tokens))` - A complete request; its bytes are consumed
    /// - `Ok(None)` - Incomplete request, need more input
    /// - `Err(e)` - Malformed input; the buffer has been cleared
    pub fn next_frame(&mut self) -> DecodeResult<Option<Tokens>> {
        match self.resume() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.buffer.clear();
                self.partial = None;
                Err(e)
            }
        }
    }

    /// Continues the current request from where the last call stopped.
    fn resume(&mut self) -> DecodeResult<Option<Tokens>> {
        if self.partial.is_none() {
            let (count, used) = match parse_header(&self.buffer)? {
                Some(header) => header,
                None => return Ok(None),
            };
            self.buffer.advance(used);
            self.partial = Some(Partial {
                remaining: count,
                // Capped so a large announced count cannot pre-allocate much
                tokens: Vec::with_capacity(count.min(16) as usize),
                consumed: used,
            });
        }

        let Some(partial) = self.partial.as_mut() else {
            return Ok(None);
        };
        while partial.remaining > 0 {
            match parse_bulk_string(&self.buffer)? {
                Some((token, used)) => {
                    self.buffer.advance(used);
                    partial.tokens.push(token);
                    partial.remaining -= 1;
                    partial.consumed += used;
                }
                None => return Ok(None),
            }
        }

        Ok(self.partial.take().map(|partial| partial.tokens))
    }

    /// Feeds a chunk and drains every request it completes.
    ///
    /// Requests decoded before an error are still returned; the error is
    /// reported alongside them and any bytes after it are discarded.
    pub fn decode(&mut self, chunk: &[u8]) -> Decoded {
        let mut decoded = Decoded::default();
        if let Err(e) = self.feed(chunk) {
            decoded.error = Some(e);
            return decoded;
        }

        for item in self.frames() {
            match item {
                Ok(tokens) => decoded.frames.push(tokens),
                Err(e) => {
                    decoded.error = Some(e);
                    break;
                }
            }
        }
        decoded
    }

    /// Returns an iterator over the requests that are complete right now.
    ///
    /// The iterator ends when the buffer holds no further complete request,
    /// and ends right after yielding an error.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            decoder: self,
            failed: false,
        }
    }

    /// Signals end of stream.
    ///
    /// The decoder cannot be fed afterwards. Returns an error if a partial
    /// request was still buffered.
    pub fn finish(&mut self) -> DecodeResult<()> {
        self.closed = true;
        let buffered = self.buffered();
        self.buffer.clear();
        self.partial = None;
        if buffered > 0 {
            return Err(DecodeError::Truncated { buffered });
        }
        Ok(())
    }

    /// Number of bytes waiting to complete a request.
    pub fn buffered(&self) -> usize {
        let pending = self.partial.as_ref().map_or(0, |partial| partial.consumed);
        pending + self.buffer.len()
    }

    /// Returns true once [`finish`](Self::finish) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Iterator returned by [`FrameDecoder::frames`].
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
    failed: bool,
}

impl Iterator for Frames<'_> {
    type Item = DecodeResult<Tokens>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.decoder.next_frame() {
            Ok(Some(tokens)) => Some(Ok(tokens)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parses the `*<count>\r\n` header of a request array.
///
/// Returns the element count and the length of the header line.
fn parse_header(buf: &[u8]) -> DecodeResult<Option<(u64, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }
    expect_prefix(buf[0], prefix::ARRAY)?;

    let (count, consumed) = match parse_length_line(buf)? {
        Some(line) => line,
        None => return Ok(None),
    };

    if count < 0 {
        return Err(DecodeError::InvalidArrayLength(count));
    }
    let count = count as u64;
    if count > MAX_ARRAY_LEN {
        return Err(DecodeError::TooLarge {
            what: "multibulk length",
            size: count,
            max: MAX_ARRAY_LEN,
        });
    }
    if count == 0 {
        return Err(DecodeError::EmptyCommand);
    }

    Ok(Some((count, consumed)))
}

/// Parses a bulk string: `$<length>\r\n<data>\r\n`, or `$-1\r\n` for null.
///
/// A null bulk string decodes to an empty token.
fn parse_bulk_string(buf: &[u8]) -> DecodeResult<Option<(Bytes, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }
    expect_prefix(buf[0], prefix::BULK_STRING)?;

    let (length, data_start) = match parse_length_line(buf)? {
        Some(line) => line,
        None => return Ok(None),
    };

    if length == -1 {
        return Ok(Some((Bytes::new(), data_start)));
    }
    if length < 0 {
        return Err(DecodeError::InvalidBulkLength(length));
    }
    let length = length as u64;
    if length > MAX_BULK_SIZE {
        return Err(DecodeError::TooLarge {
            what: "bulk length",
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let data_end = data_start + length as usize;
    let total = data_end + CRLF.len();
    if buf.len() < total {
        return Ok(None);
    }
    if &buf[data_end..total] != CRLF {
        return Err(DecodeError::MissingCrlf);
    }

    let data = Bytes::copy_from_slice(&buf[data_start..data_end]);
    Ok(Some((data, total)))
}

/// Parses the integer on a `<sigil><digits>\r\n` line.
///
/// Returns the integer and the number of bytes the whole line occupies.
fn parse_length_line(buf: &[u8]) -> DecodeResult<Option<(i64, usize)>> {
    let line = &buf[1..];
    // Never scan further than the longest legal line
    let window = &line[..line.len().min(MAX_LINE_LEN + CRLF.len())];
    let end = match find_crlf(window) {
        Some(pos) => pos,
        None if line.len() > MAX_LINE_LEN + 1 => return Err(DecodeError::LineTooLong),
        None => return Ok(None),
    };
    if end > MAX_LINE_LEN {
        return Err(DecodeError::LineTooLong);
    }

    let digits = &line[..end];
    let n = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| DecodeError::InvalidInteger(String::from_utf8_lossy(digits).into_owned()))?;

    // sigil + digits + CRLF
    Ok(Some((n, 1 + end + CRLF.len())))
}

#[inline]
fn expect_prefix(found: u8, expected: u8) -> DecodeResult<()> {
    if found == expected {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedByte { expected, found })
    }
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::encode_request;

    fn tokens(parts: &[&str]) -> Tokens {
        parts.iter().map(|p| Bytes::copy_from_slice(p.as_bytes())).collect()
    }

    fn decode_all(input: &[u8]) -> Decoded {
        FrameDecoder::new().decode(input)
    }

    #[test]
    fn test_decode_get_command() {
        let decoded = decode_all(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
        assert_eq!(decoded.frames, vec![tokens(&["GET", "name"])]);
        assert!(decoded.error.is_none());
    }

    #[test]
    fn test_decode_set_with_expiry() {
        let decoded =
            decode_all(b"*5\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n$2\r\nEX\r\n$1\r\n2\r\n");
        assert_eq!(decoded.frames, vec![tokens(&["SET", "key", "value", "EX", "2"])]);
    }

    #[test]
    fn test_decode_multiple_frames_in_one_chunk() {
        let mut input = encode_request(&["SET", "k1", "v1"]);
        input.extend(encode_request(&["GET", "k1"]));
        let decoded = decode_all(&input);
        assert_eq!(
            decoded.frames,
            vec![tokens(&["SET", "k1", "v1"]), tokens(&["GET", "k1"])]
        );
    }

    #[test]
    fn test_incomplete_frame_is_kept() {
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.decode(b"*2\r\n$3\r\nGET\r\n$4\r\nna");
        assert!(decoded.frames.is_empty());
        assert!(decoded.error.is_none());
        assert_eq!(decoder.buffered(), 19);

        let decoded = decoder.decode(b"me\r\n");
        assert_eq!(decoded.frames, vec![tokens(&["GET", "name"])]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_split_at_every_boundary() {
        let frame = encode_request(&["SET", "name", "Alice"]);
        let expected = tokens(&["SET", "name", "Alice"]);

        for split in 0..=frame.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.decode(&frame[..split]).frames;
            frames.extend(decoder.decode(&frame[split..]).frames);
            assert_eq!(frames, vec![expected.clone()], "split at {}", split);
            assert_eq!(decoder.buffered(), 0);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let frame = encode_request(&["GET", "user:101"]);
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in &frame {
            frames.extend(decoder.decode(std::slice::from_ref(byte)).frames);
        }
        assert_eq!(frames, vec![tokens(&["GET", "user:101"])]);
    }

    #[test]
    fn test_large_request_in_socket_sized_chunks() {
        const ELEMENTS: usize = 200_000;
        let mut frame = format!("*{}\r\n", ELEMENTS).into_bytes();
        for _ in 0..ELEMENTS {
            frame.extend_from_slice(b"$1\r\na\r\n");
        }

        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for chunk in frame.chunks(4096) {
            let decoded = decoder.decode(chunk);
            assert!(decoded.error.is_none());
            frames.extend(decoded.frames);
            // Finished elements leave the buffer; only the tail of a chunk stays
            assert!(decoder.buffer.len() < 4096 + 8);
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), ELEMENTS);
        assert!(frames[0].iter().all(|token| token == &b"a"[..]));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_error_inside_partial_request_resets_decoder() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"*3\r\n$3\r\nSET\r\n").frames.is_empty());
        assert_eq!(decoder.buffered(), 13);

        let decoded = decoder.decode(b":1\r\n");
        assert!(matches!(
            decoded.error,
            Some(DecodeError::UnexpectedByte { expected: b'$', found: b':' })
        ));
        assert_eq!(decoder.buffered(), 0);

        let decoded = decoder.decode(&encode_request(&["GET", "k"]));
        assert_eq!(decoded.frames, vec![tokens(&["GET", "k"])]);
    }

    #[test]
    fn test_set_request_roundtrip() {
        let pairs = [("name", "Alice"), ("", ""), ("user:101", "hello world"), ("k\r\n", "$5\r\n")];
        for (key, value) in pairs {
            let decoded = decode_all(&encode_request(&["SET", key, value]));
            assert_eq!(decoded.frames, vec![tokens(&["SET", key, value])]);
        }
    }

    #[test]
    fn test_binary_safe_bulk_string() {
        let decoded = decode_all(b"*2\r\n$3\r\nGET\r\n$5\r\nhel\x00o\r\n");
        assert_eq!(decoded.frames[0][1], Bytes::from(&b"hel\x00o"[..]));
    }

    #[test]
    fn test_null_bulk_string_is_empty_token() {
        let decoded = decode_all(b"*2\r\n$3\r\nGET\r\n$-1\r\n");
        assert_eq!(decoded.frames, vec![vec![Bytes::from("GET"), Bytes::new()]]);
    }

    #[test]
    fn test_wrong_leading_sigil() {
        let decoded = decode_all(b"+OK\r\n");
        assert_eq!(
            decoded.error,
            Some(DecodeError::UnexpectedByte {
                expected: b'*',
                found: b'+'
            })
        );
    }

    #[test]
    fn test_wrong_element_sigil() {
        let decoded = decode_all(b"*1\r\n:1\r\n");
        assert!(matches!(
            decoded.error,
            Some(DecodeError::UnexpectedByte { expected: b'$', .. })
        ));
    }

    #[test]
    fn test_non_numeric_count() {
        let decoded = decode_all(b"*x\r\n");
        assert_eq!(decoded.error, Some(DecodeError::InvalidInteger("x".to_string())));
    }

    #[test]
    fn test_non_numeric_bulk_length() {
        let decoded = decode_all(b"*1\r\n$abc\r\nGET\r\n");
        assert!(matches!(decoded.error, Some(DecodeError::InvalidInteger(_))));
    }

    #[test]
    fn test_negative_array_count() {
        assert_eq!(
            decode_all(b"*-1\r\n").error,
            Some(DecodeError::InvalidArrayLength(-1))
        );
        assert_eq!(
            decode_all(b"*-5\r\n").error,
            Some(DecodeError::InvalidArrayLength(-5))
        );
    }

    #[test]
    fn test_negative_bulk_length() {
        let decoded = decode_all(b"*1\r\n$-2\r\n");
        assert_eq!(decoded.error, Some(DecodeError::InvalidBulkLength(-2)));
    }

    #[test]
    fn test_oversized_counts() {
        let decoded = decode_all(b"*99999999\r\n");
        assert!(matches!(decoded.error, Some(DecodeError::TooLarge { .. })));

        let decoded = decode_all(b"*1\r\n$9999999999\r\n");
        assert!(matches!(decoded.error, Some(DecodeError::TooLarge { .. })));
    }

    #[test]
    fn test_unterminated_length_line() {
        let decoded = decode_all(b"*1111111111111111111111111111111111111111");
        assert_eq!(decoded.error, Some(DecodeError::LineTooLong));
    }

    #[test]
    fn test_missing_trailing_crlf() {
        let decoded = decode_all(b"*1\r\n$3\r\nGETxx");
        assert_eq!(decoded.error, Some(DecodeError::MissingCrlf));
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(decode_all(b"*0\r\n").error, Some(DecodeError::EmptyCommand));
    }

    #[test]
    fn test_decoder_recovers_after_error() {
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.decode(b"*x\r\n$3\r\nGET\r\n");
        assert!(decoded.error.is_some());
        assert_eq!(decoder.buffered(), 0);

        let decoded = decoder.decode(&encode_request(&["GET", "name"]));
        assert_eq!(decoded.frames, vec![tokens(&["GET", "name"])]);
        assert!(decoded.error.is_none());
    }

    #[test]
    fn test_frames_before_error_are_kept() {
        let mut input = encode_request(&["GET", "a"]);
        input.extend_from_slice(b"*?\r\n");
        let decoded = decode_all(&input);
        assert_eq!(decoded.frames, vec![tokens(&["GET", "a"])]);
        assert!(decoded.error.is_some());
    }

    #[test]
    fn test_frames_iterator_is_lazy() {
        let mut decoder = FrameDecoder::new();
        let mut input = encode_request(&["GET", "a"]);
        input.extend(encode_request(&["GET", "b"]));
        decoder.feed(&input).unwrap();

        let mut frames = decoder.frames();
        assert_eq!(frames.next(), Some(Ok(tokens(&["GET", "a"]))));
        drop(frames);
        // The second request is still buffered until asked for
        assert!(decoder.buffered() > 0);
        assert_eq!(decoder.frames().count(), 1);
    }

    #[test]
    fn test_finish_clean() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(&encode_request(&["GET", "a"]));
        assert!(decoder.finish().is_ok());
        assert!(decoder.is_closed());
    }

    #[test]
    fn test_finish_truncated() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(b"*2\r\n$3\r\nGE");
        assert_eq!(decoder.finish(), Err(DecodeError::Truncated { buffered: 10 }));
    }

    #[test]
    fn test_closed_decoder_rejects_input() {
        let mut decoder = FrameDecoder::new();
        decoder.finish().unwrap();
        assert_eq!(decoder.feed(b"*1\r\n"), Err(DecodeError::Closed));
        assert_eq!(decoder.decode(b"*1\r\n").error, Some(DecodeError::Closed));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DecodeError::UnexpectedByte {
                expected: b'*',
                found: b'+'
            }
            .to_string(),
            "expected '*', got '+'"
        );
        assert_eq!(
            DecodeError::InvalidArrayLength(-1).to_string(),
            "invalid multibulk length: -1"
        );
    }
}
