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

//! Modem handle
//!
//! [`Modem`] formats commands, hands them to the engine task and interprets
//! the replies. Every method takes `&mut self`, so at most one command is in
//! flight per handle.

use crate::engine::{Engine, EngineRequest, Frame, Reply};
use crate::{LoggingStream, ModemConfig, ModemError, Result, Transport};
use atmodem_codec::{
    Command, Encoding, LineCodec, Message, MessageFilter, Packet, StorageAreas, StorageInfo, Value,
    is_error_status,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, warn};

/// Per-handle protocol session
///
/// Tracks the character set currently selected on the device and the service
/// center address as last reported in each character set. The address is
/// reported in the active character set, so each form is kept separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    encoding: Encoding,
    service_centers: HashMap<Encoding, String>,
}

impl Session {
    /// Character set currently selected on the device
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Service center address as last reported while `encoding` was active
    pub fn service_center(&self, encoding: Encoding) -> Option<&str> {
        self.service_centers.get(&encoding).map(String::as_str)
    }
}

/// Handle to a modem driven by a background engine task
pub struct Modem {
    requests: mpsc::Sender<EngineRequest>,
    replies: mpsc::UnboundedReceiver<Reply>,
    notifications: Option<mpsc::Receiver<Packet>>,
    engine: JoinHandle<()>,
    config: ModemConfig,
    session: Session,
    next_id: u64,
}

impl Modem {
    /// Start the engine over `transport` and, if configured, initialize the
    /// device.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open<T>(transport: T, mut config: ModemConfig) -> Result<Modem>
    where
        T: Transport,
    {
        // Fields are public; a zero capacity would panic in `mpsc::channel`.
        config.request_capacity = config.request_capacity.max(1);
        config.notification_capacity = config.notification_capacity.max(1);
        let (request_tx, request_rx) = mpsc::channel(config.request_capacity);
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::channel(config.notification_capacity);
        let codec = LineCodec::with_max_line_length(config.max_line_length);

        let engine = if config.trace_io {
            let transport = LoggingStream::new(transport, "modem");
            tokio::spawn(Engine::new(transport, codec, request_rx, reply_tx, notify_tx).run())
        } else {
            tokio::spawn(Engine::new(transport, codec, request_rx, reply_tx, notify_tx).run())
        };

        let mut modem = Modem {
            requests: request_tx,
            replies: reply_rx,
            notifications: Some(notify_rx),
            engine,
            session: Session {
                encoding: config.encoding,
                service_centers: HashMap::new(),
            },
            config,
            next_id: 0,
        };

        if modem.config.initialize {
            modem.initialize().await?;
        }
        Ok(modem)
    }

    /// Bring the device into a known state.
    ///
    /// Resets the device, selects the configured character set (recording the
    /// service center address in both character sets along the way), selects
    /// text mode and configures new message routing. Failures to select text
    /// mode or routing are logged and ignored, many devices reject them
    /// harmlessly.
    #[instrument(level = "debug", skip(self))]
    pub async fn initialize(&mut self) -> Result<()> {
        self.execute(&Command::new("")).await?;
        self.execute(&Command::new("Z")).await?;
        debug!("device reset");

        match self.config.encoding {
            Encoding::Ucs2 => {
                self.refresh_service_center(Encoding::Gsm).await?;
                self.set_encoding(Encoding::Ucs2).await?;
            }
            Encoding::Gsm => {
                self.set_encoding(Encoding::Ucs2).await?;
                self.set_encoding(Encoding::Gsm).await?;
            }
        }

        if let Err(e) = self.execute(&Command::new("+CMGF").arg(1)).await {
            warn!(error = %e, "failed to select text mode");
        }

        let routing = self.config.notification_routing;
        if let Err(e) = self.execute(&Command::new("+CNMI").args(routing)).await {
            warn!(error = %e, "failed to configure message routing");
        }
        Ok(())
    }

    /// Current session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Configuration the handle was opened with
    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Take the receiver for unsolicited notifications.
    ///
    /// Returns `None` once taken. Notifications arriving while the receiver is
    /// full, or before it is taken and the buffer is full, are dropped.
    pub fn take_notifications(&mut self) -> Option<mpsc::Receiver<Packet>> {
        self.notifications.take()
    }

    /// Send one command and return its reply.
    ///
    /// Listing entries are collected into [`Packet::MessageList`]. An error
    /// status becomes [`ModemError::Device`].
    #[instrument(level = "debug", skip(self), fields(command = %command.name()))]
    pub async fn execute(&mut self, command: &Command) -> Result<Packet> {
        let line = command.to_line()?;
        let frames = self.round_trip(line, None).await?;
        interpret(frames)
    }

    /// Read the message stored at `index` in text mode.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_message(&mut self, index: i64) -> Result<Message> {
        let packet = self.execute(&Command::new("+CMGR").arg(index)).await?;
        expect_message(packet)
    }

    /// Read the message stored at `index` in PDU mode.
    ///
    /// Text mode is restored afterwards, also when the read fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_message_pdu(&mut self, index: i64) -> Result<Message> {
        self.execute(&Command::new("+CMGF").arg(0)).await?;
        let message = match self.execute(&Command::new("+CMGR").arg(index)).await {
            Ok(packet) => expect_message(packet),
            Err(e) => Err(e),
        };
        let restored = self.execute(&Command::new("+CMGF").arg(1)).await;
        let message = message?;
        restored?;
        Ok(message)
    }

    /// List stored messages matching `filter`, in storage order.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_messages(&mut self, filter: MessageFilter) -> Result<Vec<Message>> {
        match self.execute(&Command::new("+CMGL").arg(filter)).await? {
            Packet::Ok => Ok(Vec::new()),
            Packet::Message(message) => Ok(vec![message]),
            Packet::MessageList(messages) => Ok(messages),
            other => Err(unexpected("message list", &other)),
        }
    }

    /// Delete the message stored at `index`.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_message(&mut self, index: i64) -> Result<()> {
        self.execute(&Command::new("+CMGD").arg(index)).await?;
        Ok(())
    }

    /// Send a text message.
    ///
    /// In UCS2 mode both `telephone` and `body` are sent as UCS2 hex text.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn send_message(&mut self, telephone: &str, body: &str) -> Result<()> {
        let encoding = self.session.encoding;
        let line = Command::new("+CMGS")
            .arg(encoding.encode_text(telephone))
            .to_line()?;
        let frames = self
            .round_trip(line, Some(encoding.encode_text(body)))
            .await?;
        interpret(frames)?;
        Ok(())
    }

    /// Send a message given as a hex PDU of `length` octets (excluding the
    /// service center part).
    ///
    /// Text mode is restored afterwards, also when sending fails.
    #[instrument(level = "debug", skip(self, pdu))]
    pub async fn send_message_pdu(&mut self, length: usize, pdu: &str) -> Result<()> {
        self.execute(&Command::new("+CMGF").arg(0)).await?;
        let sent = match Command::new("+CMGS").arg(length as i64).to_line() {
            Ok(line) => match self.round_trip(line, Some(pdu.to_string())).await {
                Ok(frames) => interpret(frames).map(|_| ()),
                Err(e) => Err(e),
            },
            Err(e) => Err(e.into()),
        };
        let restored = self.execute(&Command::new("+CMGF").arg(1)).await;
        sent?;
        restored?;
        Ok(())
    }

    /// Query the storage areas the device supports.
    #[instrument(level = "debug", skip(self))]
    pub async fn supported_storage_areas(&mut self) -> Result<StorageAreas> {
        match self.execute(&Command::query("+CPMS")).await? {
            Packet::StorageAreas(areas) => Ok(areas),
            other => Err(unexpected("storage areas", &other)),
        }
    }

    /// Select the storage areas used for reading, writing and receiving.
    #[instrument(level = "debug", skip(self))]
    pub async fn select_storage_areas(
        &mut self,
        read: &str,
        write: &str,
        receive: &str,
    ) -> Result<StorageInfo> {
        let command = Command::new("+CPMS").args([read, write, receive]);
        match self.execute(&command).await? {
            Packet::StorageInfo(info) => Ok(info),
            other => Err(unexpected("storage info", &other)),
        }
    }

    /// Query the service center address as the device reports it.
    #[instrument(level = "debug", skip(self))]
    pub async fn service_center_address(&mut self) -> Result<Vec<Value>> {
        match self.execute(&Command::new("+CSCA?")).await? {
            Packet::SmscAddress(args) => Ok(args),
            other => Err(unexpected("service center address", &other)),
        }
    }

    /// Select the character set for message text.
    ///
    /// Also sets the matching data coding scheme and refreshes the service
    /// center address, whose text form depends on the character set.
    #[instrument(level = "debug", skip(self))]
    pub async fn set_encoding(&mut self, encoding: Encoding) -> Result<()> {
        self.execute(&Command::new("+CSCS").arg(encoding.as_str()))
            .await?;
        self.session.encoding = encoding;
        debug!(%encoding, "character set selected");

        let dcs = encoding.data_coding_scheme();
        self.execute(&Command::new("+CSMP").args([49, 167, 0, dcs]))
            .await?;
        self.refresh_service_center(encoding).await
    }

    /// Stop the engine, shut the transport down and release the channels.
    #[instrument(level = "debug", skip(self))]
    pub async fn close(self) -> Result<()> {
        let Modem {
            requests,
            replies,
            notifications,
            engine,
            ..
        } = self;

        // The engine may already be gone; joining below still applies.
        let _ = requests.send(EngineRequest::Close).await;
        let joined = engine.await;
        drop(requests);
        drop(replies);
        drop(notifications);
        joined.map_err(|e| ModemError::Protocol(format!("engine task failed: {}", e)))
    }

    async fn refresh_service_center(&mut self, encoding: Encoding) -> Result<()> {
        let args = self.service_center_address().await?;
        let Some(address) = args.first() else {
            return Err(ModemError::Protocol(
                "empty service center address".to_string(),
            ));
        };
        self.session
            .service_centers
            .insert(encoding, address.to_string());
        debug!(%encoding, %address, "service center recorded");
        self.execute(&Command::new("+CSCA").args(args)).await?;
        Ok(())
    }

    async fn round_trip(&mut self, line: String, body: Option<String>) -> Result<Vec<Frame>> {
        self.next_id += 1;
        let id = self.next_id;
        let deadline = Instant::now() + self.config.response_timeout;

        self.requests
            .send(EngineRequest::Transmit { id, line, body })
            .await
            .map_err(|_| ModemError::Closed)?;

        let mut frames = Vec::new();
        loop {
            let reply = match timeout_at(deadline, self.replies.recv()).await {
                Ok(Some(reply)) => reply,
                Ok(None) => return Err(ModemError::Closed),
                Err(_) => return Err(ModemError::Timeout(self.config.response_timeout)),
            };
            if reply.id != id {
                debug!(stale = reply.id, expected = id, "discarding stale reply");
                continue;
            }
            let frame = reply.outcome?;
            let terminal = frame.is_terminal();
            frames.push(frame);
            if terminal {
                return Ok(frames);
            }
        }
    }
}

impl std::fmt::Debug for Modem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modem")
            .field("session", &self.session)
            .field("next_id", &self.next_id)
            .field("engine_finished", &self.engine.is_finished())
            .finish()
    }
}

fn unexpected(expected: &str, packet: &Packet) -> ModemError {
    ModemError::Protocol(format!("expected {}, got {:?}", expected, packet))
}

fn expect_message(packet: Packet) -> Result<Message> {
    match packet {
        Packet::Message(message) => Ok(message),
        other => Err(unexpected("message", &other)),
    }
}

/// Turns the frames of one round trip into a single packet.
fn interpret(mut frames: Vec<Frame>) -> Result<Packet> {
    let Some(last) = frames.pop() else {
        return Err(ModemError::Protocol("reply without status".to_string()));
    };
    if is_error_status(&last.status) {
        return Err(ModemError::Device(last.status));
    }
    if frames.is_empty() {
        return Ok(last.packet);
    }

    let mut messages = Vec::with_capacity(frames.len() + 1);
    for frame in frames.into_iter().chain(std::iter::once(last)) {
        match frame.packet {
            Packet::Message(message) => messages.push(message),
            Packet::Ok if frame.is_terminal() => {}
            other => return Err(unexpected("listing entry", &other)),
        }
    }
    Ok(Packet::MessageList(messages))
}
