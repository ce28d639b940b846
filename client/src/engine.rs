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

//! Protocol engine
//!
//! The engine is the only owner of the transport. It runs as a background
//! task and serializes two event sources:
//! - lines decoded from the device
//! - requests from the [`Modem`](crate::Modem) handle
//!
//! Each incoming line is classified as command echo, reply header, terminal
//! status, reply body, data prompt or unsolicited notification. Replies go to
//! the handle tagged with the request id they answer; notifications go to a
//! bounded channel and are dropped when nobody drains it.

use crate::{ModemError, Result};
use atmodem_codec::{
    BODY_TERMINATOR, DATA_PROMPT, LineCodec, Packet, is_final_status, parse_packet, reply_prefix,
};
use futures::{SinkExt, StreamExt};
use metrics::counter;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::codec::Framed;
use tracing::{debug, error, trace, warn};

/// Requests accepted by the engine
#[derive(Debug)]
pub(crate) enum EngineRequest {
    /// Write a command line. `body` is written after the data prompt.
    Transmit {
        id: u64,
        line: String,
        body: Option<String>,
    },
    /// Shut the transport down and stop
    Close,
}

/// One bounded reply entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Terminal status line, empty for a listing entry flushed by the next one
    pub status: String,
    pub packet: Packet,
}

impl Frame {
    pub fn is_terminal(&self) -> bool {
        !self.status.is_empty()
    }
}

/// A reply addressed to the request with the same id
#[derive(Debug)]
pub(crate) struct Reply {
    pub id: u64,
    pub outcome: Result<Frame>,
}

/// What the engine must do after a line was classified
#[derive(Debug)]
pub(crate) enum Action {
    Deliver(Reply),
    Notify(Packet),
    Write(String),
}

/// Line classification state, free of I/O.
#[derive(Debug, Default)]
pub(crate) struct ProtocolState {
    /// Lines of the last transmitted text still expected back as echo
    echo: Vec<String>,
    /// `+XXXX` prefix replies to the in-flight command start with
    expected_prefix: String,
    header: Option<String>,
    body: Vec<String>,
    in_flight: Option<u64>,
    /// Body waiting for the data prompt
    pending_body: Option<String>,
}

impl ProtocolState {
    /// Records an outgoing command line.
    pub fn transmit(&mut self, id: u64, line: &str, body: Option<String>) {
        if self.header.is_some() || !self.body.is_empty() {
            warn!(
                header = ?self.header,
                "discarding partial reply before transmitting"
            );
        }
        self.header = None;
        self.body.clear();
        self.expected_prefix = reply_prefix(line).unwrap_or_default().to_string();
        self.echo = echo_lines(line);
        self.in_flight = Some(id);
        self.pending_body = body;
    }

    /// Id of the command awaiting its terminal status.
    #[cfg(test)]
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Forgets the in-flight command, returning its id.
    pub fn abandon(&mut self) -> Option<u64> {
        self.pending_body = None;
        self.in_flight.take()
    }

    /// Consumes `line` if it echoes transmitted text, along with any earlier
    /// echo lines the device skipped.
    fn take_echo(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches(BODY_TERMINATOR).trim();
        match self.echo.iter().position(|expected| expected == line) {
            Some(pos) => {
                self.echo.drain(..=pos);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, status: &str) -> Result<Frame> {
        let header = self.header.take().unwrap_or_default();
        let body = self.body.join("\n");
        self.body.clear();
        match parse_packet(status, &header, &body) {
            Ok(Some(packet)) => Ok(Frame {
                status: status.to_string(),
                packet,
            }),
            Ok(None) => Ok(Frame {
                status: status.to_string(),
                packet: Packet::from_status(status),
            }),
            Err(e) => Err(ModemError::from(e)),
        }
    }

    fn reply(&self, outcome: Result<Frame>) -> Option<Action> {
        match self.in_flight {
            Some(id) => Some(Action::Deliver(Reply { id, outcome })),
            None => {
                debug!(?outcome, "dropping reply without a pending command");
                None
            }
        }
    }

    /// Classifies one incoming line.
    pub fn on_line(&mut self, line: &str) -> Option<Action> {
        if self.take_echo(line) {
            trace!("echo {:?}", line);
            return None;
        }

        if !self.expected_prefix.is_empty() && line.starts_with(&self.expected_prefix) {
            let flushed = if self.header.is_some() {
                let outcome = self.finish("");
                self.reply(outcome)
            } else {
                None
            };
            self.body.clear();
            self.header = Some(line.to_string());
            return flushed;
        }

        if is_final_status(line) {
            let outcome = self.finish(line);
            let action = self.reply(outcome);
            self.expected_prefix.clear();
            self.pending_body = None;
            self.in_flight = None;
            return action;
        }

        if self.header.is_some() {
            self.body.push(line.to_string());
            return None;
        }

        if line == DATA_PROMPT {
            return match self.pending_body.take() {
                Some(body) => {
                    self.echo = echo_lines(&body);
                    Some(Action::Write(format!("{}{}", body, BODY_TERMINATOR)))
                }
                None => {
                    debug!("ignoring data prompt without a pending body");
                    None
                }
            };
        }

        match parse_packet("OK", line, "") {
            Ok(Some(packet)) => Some(Action::Notify(packet)),
            Ok(None) => None,
            Err(e) => {
                warn!(line, error = %e, "ignoring malformed notification");
                None
            }
        }
    }
}

/// Splits transmitted text into the non-empty lines a device may echo.
fn echo_lines(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(|line| line.trim_end_matches(BODY_TERMINATOR).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Background task owning the transport
pub(crate) struct Engine<T> {
    framed: Framed<T, LineCodec>,
    requests: mpsc::Receiver<EngineRequest>,
    replies: mpsc::UnboundedSender<Reply>,
    notifications: mpsc::Sender<Packet>,
    state: ProtocolState,
}

impl<T> Engine<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        transport: T,
        codec: LineCodec,
        requests: mpsc::Receiver<EngineRequest>,
        replies: mpsc::UnboundedSender<Reply>,
        notifications: mpsc::Sender<Packet>,
    ) -> Self {
        Engine {
            framed: Framed::new(transport, codec),
            requests,
            replies,
            notifications,
            state: ProtocolState::default(),
        }
    }

    /// Run the engine event loop until closed or the transport fails.
    pub async fn run(mut self) {
        debug!("engine started");

        if let Err(e) = self.event_loop().await {
            error!(error = %e, "engine stopped on transport failure");
            if let Some(id) = self.state.abandon() {
                let _ = self.replies.send(Reply { id, outcome: Err(e) });
            }
        }

        if let Err(e) = self.framed.close().await {
            debug!(error = %e, "transport shutdown failed");
        }
        debug!("engine stopped");
    }

    async fn event_loop(&mut self) -> Result<()> {
        loop {
            select! {
                line = self.framed.next() => {
                    match line {
                        Some(Ok(line)) => {
                            trace!("received {:?}", line);
                            counter!("atmodem.lines.received").increment(1);
                            if let Some(action) = self.state.on_line(&line) {
                                self.perform(action).await?;
                            }
                        }
                        Some(Err(e)) => {
                            return Err(ModemError::from(e));
                        }
                        None => {
                            debug!("transport reached end of stream");
                            if let Some(id) = self.state.abandon() {
                                let _ = self.replies.send(Reply { id, outcome: Err(ModemError::Closed) });
                            }
                            return Ok(());
                        }
                    }
                }

                request = self.requests.recv() => {
                    match request {
                        Some(EngineRequest::Transmit { id, line, body }) => {
                            debug!(id, "transmit {:?}", line.trim_end());
                            self.state.transmit(id, &line, body);
                            self.framed.send(line).await.map_err(ModemError::from)?;
                            counter!("atmodem.commands.sent").increment(1);
                        }
                        Some(EngineRequest::Close) | None => {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn perform(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Deliver(reply) => {
                debug!(id = reply.id, outcome = ?reply.outcome, "deliver reply");
                counter!("atmodem.replies.delivered").increment(1);
                if self.replies.send(reply).is_err() {
                    debug!("reply receiver dropped");
                }
            }
            Action::Notify(packet) => match self.notifications.try_send(packet) {
                Ok(()) => {
                    counter!("atmodem.notifications.delivered").increment(1);
                }
                Err(TrySendError::Full(packet)) => {
                    counter!("atmodem.notifications.dropped").increment(1);
                    warn!(?packet, "notification channel full, dropping notification");
                }
                Err(TrySendError::Closed(packet)) => {
                    counter!("atmodem.notifications.dropped").increment(1);
                    trace!(?packet, "no notification receiver");
                }
            },
            Action::Write(body) => {
                debug!("write message body ({} bytes)", body.len());
                self.framed.send(body).await.map_err(ModemError::from)?;
            }
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .finish()
    }
}
