//! RESP Wire Types and Encoders
//!
//! This module defines the values that flow out of the command layer and the
//! functions that turn them into bytes on the wire.
//!
//! ## Protocol Format
//!
//! Each RESP primitive starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `$` Bulk String
//! - `*` Array
//!
//! All primitives are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-ERR unknown command 'FOO'\r\n`
//! Bulk String: `$5\r\nAlice\r\n`
//! Null Bulk String: `$-1\r\n`
//! Request Array: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// One decoded request: the command name followed by its arguments.
pub type Tokens = Vec<Bytes>;

/// The protocol-agnostic result of executing one command.
///
/// Outcomes carry no transport or storage types. They are produced by the
/// command dispatcher and rendered to bytes by [`Outcome::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command succeeded and has nothing to return.
    /// Format: `+OK\r\n`
    Ok,

    /// The command produced a value.
    /// Format: `$<length>\r\n<data>\r\n`
    Value(Bytes),

    /// The command looked something up and found nothing.
    /// Format: `$-1\r\n`
    Null,

    /// The request was malformed or unsupported.
    /// Format: `-ERR <message>\r\n`
    Error(String),
}

impl Outcome {
    /// Creates a value outcome.
    ///
    /// # Example
    /// ```
    /// use ttlkv::protocol::Outcome;
    /// let value = Outcome::value("Alice");
    /// assert_eq!(value.encode(), b"$5\r\nAlice\r\n");
    /// ```
    pub fn value(data: impl Into<Bytes>) -> Self {
        Outcome::Value(data.into())
    }

    /// Creates an error outcome. The `ERR` tag is added when encoding.
    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error(message.into())
    }

    /// Encodes the outcome into its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encodes the outcome into an existing buffer.
    ///
    /// This is the one the session loop uses so the output buffer can be reused
    /// across responses.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Outcome::Ok => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(b"OK");
                buf.extend_from_slice(CRLF);
            }
            Outcome::Value(data) => write_bulk(buf, data),
            Outcome::Null => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            Outcome::Error(message) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(b"ERR ");
                // An error line ends at the first CRLF, so the message must not carry one.
                buf.extend(
                    message
                        .bytes()
                        .map(|b| if b == b'\r' || b == b'\n' { b' ' } else { b }),
                );
                buf.extend_from_slice(CRLF);
            }
        }
    }

    /// Returns true if this outcome is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok => write!(f, "OK"),
            Outcome::Value(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            Outcome::Null => write!(f, "(nil)"),
            Outcome::Error(message) => write!(f, "(error) ERR {}", message),
        }
    }
}

/// Encodes a request as an array of bulk strings.
///
/// This is what a client puts on the wire; the server only ever decodes it.
///
/// # Example
/// ```
/// use ttlkv::protocol::encode_request;
/// let bytes = encode_request(&["GET", "name"]);
/// assert_eq!(bytes, b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
/// ```
pub fn encode_request<A: AsRef<[u8]>>(args: &[A]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(prefix::ARRAY);
    buf.extend_from_slice(args.len().to_string().as_bytes());
    buf.extend_from_slice(CRLF);
    for arg in args {
        write_bulk(&mut buf, arg.as_ref());
    }
    buf
}

fn write_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    buf.push(prefix::BULK_STRING);
    buf.extend_from_slice(data.len().to_string().as_bytes());
    buf.extend_from_slice(CRLF);
    buf.extend_from_slice(data);
    buf.extend_from_slice(CRLF);
}
