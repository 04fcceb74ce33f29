//! RESP Wire Codec
//!
//! This module implements the subset of the Redis Serialization Protocol (RESP)
//! that ttlkv speaks: requests are arrays of bulk strings, responses are simple
//! strings, errors, bulk strings and the null bulk string.
//!
//! ## Modules
//!
//! - `types`: Defines the `Outcome` enum and the encoders
//! - `parser`: Incremental decoder for incoming requests
//!
//! ## Example
//!
//! ```
//! use ttlkv::protocol::{encode_request, FrameDecoder, Outcome};
//!
//! // Decoding incoming data
//! let mut decoder = FrameDecoder::new();
//! let decoded = decoder.decode(&encode_request(&["GET", "name"]));
//! assert_eq!(decoded.frames.len(), 1);
//!
//! // Encoding responses
//! let bytes = Outcome::value("Alice").encode();
//! assert_eq!(bytes, b"$5\r\nAlice\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{DecodeError, DecodeResult, Decoded, FrameDecoder, Frames};
pub use types::{encode_request, Outcome, Tokens};
