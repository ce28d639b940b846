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

//! # AT Modem Client
//!
//! Asynchronous driver for GSM/GPRS modems speaking the AT command set over a
//! serial line.
//!
//! ## Features
//!
//! - **Request/Response Correlation** - Echo, reply headers, bodies and
//!   terminal status lines are bounded into one reply per command
//! - **Unsolicited Notifications** - `+CMTI` and other device reports are
//!   delivered on a separate bounded channel
//! - **SMS Operations** - Read, list, delete and send messages in text or PDU
//!   mode, in the GSM or UCS2 character set
//! - **Deadlines** - Every command round trip is bounded by a timeout
//!
//! ## Quick Start
//!
//! ```no_run
//! use atmodem_client::{MessageFilter, Modem, ModemConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Any AsyncRead + AsyncWrite stream, e.g. a serial port.
//!     let (port, _device) = tokio::io::duplex(4096);
//!
//!     let mut modem = Modem::open(port, ModemConfig::default()).await?;
//!     let mut notifications = modem.take_notifications().expect("taken once");
//!
//!     for message in modem.list_messages(MessageFilter::Unread).await? {
//!         println!("{}: {}", message.telephone, message.body);
//!     }
//!     modem.send_message("+15551234", "Hello").await?;
//!
//!     if let Some(notification) = notifications.recv().await {
//!         println!("{:?}", notification);
//!     }
//!     modem.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! A background task owns the transport and the line decoder. It classifies
//! each incoming line, writes outgoing commands and message bodies, and routes
//! replies back to the [`Modem`] handle. The handle holds the session state
//! (active character set and service center addresses).

#![warn(missing_docs, future_incompatible, rust_2018_idioms)]

mod config;
mod engine;
mod error;
mod modem;
mod transport;

pub use config::ModemConfig;
pub use error::{ModemError, Result};
pub use modem::{Modem, Session};
pub use transport::{LoggingStream, Transport};

// Re-export commonly used codec types
pub use atmodem_codec::{
    AtCodecError, Command, Encoding, Message, MessageFilter, Packet, StorageAreas, StorageInfo,
    Value,
};
