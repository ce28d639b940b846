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

use crate::{AtCodecError, AtCodecResult};
use metrics::counter;
use tokio_util::bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

/// Data prompt sent by the device, without a terminator, when it is ready to
/// accept a message body.
pub const DATA_PROMPT: &str = "> ";

/// Default upper bound on the length of a single line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

fn is_terminator(byte: &u8) -> bool {
    *byte == b'\r' || *byte == b'\n'
}

fn to_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

///
/// Line oriented AT codec.
///
/// Decoding splits the incoming byte stream at CR and/or LF, strips the
/// terminators and surrounding whitespace, and suppresses lines that end up
/// empty. The unterminated data prompt `"> "` is yielded as a line of its own.
/// A line longer than the configured limit is dropped up to its terminator
/// and the stream carries on with the next line.
///
/// Encoding writes text verbatim. Command lines already carry their CR LF and
/// message bodies their `0x1A` terminator.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineCodec {
    max_line_length: usize,
    /// Inside an overlong line, dropping input up to the next terminator
    discarding: bool,
}

impl LineCodec {
    /// Creates a codec with the default line length limit.
    pub fn new() -> LineCodec {
        LineCodec::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Creates a codec that drops lines longer than `limit` bytes.
    pub fn with_max_line_length(limit: usize) -> LineCodec {
        LineCodec {
            max_line_length: limit,
            discarding: false,
        }
    }

    /// Configured line length limit.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn discard(&self, length: usize) {
        warn!(limit = self.max_line_length, length, "discarding overlong line");
        counter!("atmodem.lines.discarded").increment(1);
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        LineCodec::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = AtCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> AtCodecResult<Option<String>> {
        loop {
            if self.discarding {
                match src.iter().position(is_terminator) {
                    Some(end) => {
                        src.advance(end);
                        self.discarding = false;
                    }
                    None => {
                        src.clear();
                        return Ok(None);
                    }
                }
            }

            let leading = src.iter().take_while(|b| is_terminator(b)).count();
            src.advance(leading);
            if src.is_empty() {
                return Ok(None);
            }

            match src.iter().position(is_terminator) {
                Some(end) if end > self.max_line_length => {
                    src.advance(end);
                    self.discard(end);
                }
                Some(end) => {
                    let raw = src.split_to(end);
                    let line = to_line(&raw);
                    if line.is_empty() {
                        continue;
                    }
                    trace!("decoded line {:?}", line);
                    return Ok(Some(line));
                }
                None if &src[..] == DATA_PROMPT.as_bytes() => {
                    src.clear();
                    trace!("decoded data prompt");
                    return Ok(Some(DATA_PROMPT.to_string()));
                }
                None if src.len() > self.max_line_length => {
                    let length = src.len();
                    src.clear();
                    self.discarding = true;
                    self.discard(length);
                    return Ok(None);
                }
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> AtCodecResult<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if self.discarding {
            src.clear();
            self.discarding = false;
        }
        if src.is_empty() {
            return Ok(None);
        }
        let raw = src.split();
        let line = to_line(&raw);
        if line.is_empty() {
            Ok(None)
        } else {
            trace!("decoded trailing line {:?}", line);
            Ok(Some(line))
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = AtCodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> AtCodecResult<()> {
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}
