//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! # AT Modem Codec
//!
//! Wire level building blocks for talking to GSM/GPRS modems over a line
//! oriented AT command channel. Nothing in this crate performs I/O on its own;
//! the pieces plug into `tokio_util::codec::Framed` and the protocol engine in
//! `atmodem-client`.
//!
//! ## Core Components
//!
//! ### [`LineCodec`]
//!
//! Implements [`Decoder`] and [`Encoder`] from `tokio_util::codec`. Incoming
//! bytes are split at CR and/or LF into trimmed, non-empty text lines. The
//! device's unterminated data prompt `"> "` is yielded as a line of its own.
//! Outgoing text is written verbatim.
//!
//! ### [`Command`] and the formatter
//!
//! [`format_command`] renders `AT<name>=<args>\r\n`. Strings are quoted,
//! integers are decimal and the `?` literal selects the query form.
//!
//! ### [`Packet`] and the parser
//!
//! [`parse_packet`] classifies a terminal status, reply header and body into a
//! typed [`Packet`]. Each known header has a fixed argument schema; a mismatch
//! is reported as [`AtCodecError::Schema`] rather than guessed around.
//!
//! ### [`charset`]
//!
//! The GSM 03.38 default alphabet (with its escape table and septet packing)
//! and UCS2 hex text.
//!
//! ## Usage Example
//!
//! ```rust
//! use atmodem_codec::{Command, LineCodec, Packet, parse_packet};
//! use bytes::BytesMut;
//! use tokio_util::codec::Decoder;
//!
//! let line = Command::new("+CMGR").arg(3).to_line().unwrap();
//! assert_eq!(line, "AT+CMGR=3\r\n");
//!
//! let mut codec = LineCodec::new();
//! let mut input = BytesMut::from(&b"\r\n+CMTI: \"SM\",3\r\n"[..]);
//! let header = codec.decode(&mut input).unwrap().unwrap();
//!
//! let packet = parse_packet("OK", &header, "").unwrap();
//! assert_eq!(
//!     packet,
//!     Some(Packet::MessageNotification { storage: "SM".into(), index: 3 })
//! );
//! ```
//!
//! [`Decoder`]: tokio_util::codec::Decoder
//! [`Encoder`]: tokio_util::codec::Encoder

#![warn(missing_docs, future_incompatible, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod charset;
mod codec;
pub mod command;
pub mod packet;
mod result;
mod value;

pub use self::charset::Encoding;
pub use self::codec::{DATA_PROMPT, DEFAULT_MAX_LINE_LENGTH, LineCodec};
pub use self::command::{BODY_TERMINATOR, Command, format_command, quote, quotes, reply_prefix};
pub use self::packet::{
    Message, MessageFilter, Packet, StorageAreas, StorageInfo, is_error_status, is_final_status,
    parse_packet, parse_time, unquotes,
};
pub use self::result::{AtCodecError, AtCodecResult, SchemaErrorKind};
pub use self::value::Value;
