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

//! Reply classification.
//!
//! A bounded reply consists of a terminal status line, an optional header line
//! of the form `+NAME: arg,arg,...` and optional body text. [`parse_packet`]
//! turns those three pieces into a typed [`Packet`].

use crate::{AtCodecError, AtCodecResult, SchemaErrorKind, Value};
use chrono::NaiveDateTime;

/// Format of device timestamps once the zone suffix is removed.
pub const TIME_FORMAT: &str = "%y/%m/%d,%H:%M:%S";

/// Returns `true` if `line` ends a command reply.
pub fn is_final_status(line: &str) -> bool {
    line == "OK" || is_error_status(line)
}

/// Returns `true` if `line` is an error terminal status.
pub fn is_error_status(line: &str) -> bool {
    line == "ERROR" || line.contains("+CMS ERROR") || line.contains("+CME ERROR")
}

/// A classified device reply or notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    /// Bare `OK`.
    Ok,
    /// Bare `ERROR`, `+CMS ERROR` or `+CME ERROR`.
    Error,
    /// A single stored message (`+CMGR`, or one `+CMGL` entry).
    Message(Message),
    /// All entries of a `+CMGL` listing.
    MessageList(Vec<Message>),
    /// New message stored (`+CMTI`).
    MessageNotification {
        /// Storage area the message was written to
        storage: String,
        /// Index of the message within the storage area
        index: i64,
    },
    /// Service status report (`+ZPASR`).
    ServiceStatus(String),
    /// Network status report (`+ZDONR`).
    NetworkStatus(String),
    /// Service center address (`+CSCA`), as reported.
    SmscAddress(Vec<Value>),
    /// Supported storage areas (`+CPMS=?`).
    StorageAreas(StorageAreas),
    /// Storage usage after selecting areas (`+CPMS=...`).
    StorageInfo(StorageInfo),
    /// Any header without a dedicated rule.
    Unknown {
        /// Header name, or the whole line when it has no colon
        name: String,
        /// Parsed arguments
        args: Vec<Value>,
    },
}

impl Packet {
    /// Bare status packet for a terminal status line.
    pub fn from_status(status: &str) -> Packet {
        if is_error_status(status) {
            Packet::Error
        } else {
            Packet::Ok
        }
    }

    /// Returns `true` for [`Packet::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Packet::Error)
    }
}

/// An SMS message as reported by `+CMGR` or `+CMGL`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Storage index. Only reported by listings.
    pub index: Option<i64>,
    /// Storage status such as `REC UNREAD` or `STO SENT`.
    pub status: String,
    /// Originator or destination address.
    pub telephone: String,
    /// Service center timestamp, if present and well formed.
    pub timestamp: Option<NaiveDateTime>,
    /// Message text. Multi-line bodies are joined with `\n`.
    pub body: String,
    /// Set on the final entry of a listing.
    pub last: bool,
}

/// Storage areas a device supports, per purpose.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageAreas {
    /// Areas usable for reading and deleting
    pub read: Vec<String>,
    /// Areas usable for writing and sending
    pub write: Vec<String>,
    /// Areas usable for received messages
    pub receive: Vec<String>,
}

/// Usage of the selected storage areas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageInfo {
    /// Messages stored in the read area
    pub read_used: i64,
    /// Capacity of the read area
    pub read_total: i64,
    /// Messages stored in the write area
    pub write_used: i64,
    /// Capacity of the write area
    pub write_total: i64,
    /// Messages stored in the receive area
    pub receive_used: i64,
    /// Capacity of the receive area
    pub receive_total: i64,
}

/// Message status filter for `+CMGL`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MessageFilter {
    /// Received, not yet read
    Unread,
    /// Received and read
    Read,
    /// Stored, not yet sent
    Unsent,
    /// Stored and sent
    Sent,
    /// Every message
    #[default]
    All,
}

impl MessageFilter {
    /// Wire name of the filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFilter::Unread => "REC UNREAD",
            MessageFilter::Read => "REC READ",
            MessageFilter::Unsent => "STO UNSENT",
            MessageFilter::Sent => "STO SENT",
            MessageFilter::All => "ALL",
        }
    }
}

impl std::fmt::Display for MessageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MessageFilter> for Value {
    fn from(filter: MessageFilter) -> Self {
        Value::from(filter.as_str())
    }
}

/// Parses a device timestamp such as `21/03/15,10:20:30+32`.
///
/// The 3 character zone suffix is discarded. Malformed input yields `None`.
pub fn parse_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    text.len()
        .checked_sub(3)
        .and_then(|end| text.get(..end))
        .and_then(|local| NaiveDateTime::parse_from_str(local, TIME_FORMAT).ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, TIME_FORMAT).ok())
}

fn split_arguments(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                tokens.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&text[start..]);
    tokens
}

fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn unquote(token: &str) -> Value {
    let token = token.trim();
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return Value::Str(token[1..token.len() - 1].to_string());
    }
    if token.len() >= 2 && token.starts_with('(') && token.ends_with(')') {
        return Value::List(unquotes(&token[1..token.len() - 1]));
    }
    if is_integer(token) {
        if let Ok(value) = token.parse::<i64>() {
            return Value::Int(value);
        }
    }
    Value::Str(token.to_string())
}

/// Tokenizes reply argument text.
///
/// Splits on commas outside double quotes and parentheses. Quoted tokens
/// become strings, parenthesized tokens become groups and integer tokens
/// become integers. Empty text has no arguments.
pub fn unquotes(text: &str) -> Vec<Value> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    split_arguments(text).into_iter().map(unquote).collect()
}

fn argument<'a>(name: &str, args: &'a [Value], index: usize) -> AtCodecResult<&'a Value> {
    args.get(index)
        .ok_or_else(|| AtCodecError::schema(name, SchemaErrorKind::MissingArgument { index }))
}

fn unexpected(name: &str, index: usize, expected: &'static str, found: &Value) -> AtCodecError {
    AtCodecError::schema(
        name,
        SchemaErrorKind::UnexpectedType {
            index,
            expected,
            found: format!("{:?}", found),
        },
    )
}

fn string_argument(name: &str, args: &[Value], index: usize) -> AtCodecResult<String> {
    match argument(name, args, index)? {
        Value::Str(s) => Ok(s.clone()),
        other => Err(unexpected(name, index, "string", other)),
    }
}

fn integer_argument(name: &str, args: &[Value], index: usize) -> AtCodecResult<i64> {
    match argument(name, args, index)? {
        Value::Int(i) => Ok(*i),
        other => Err(unexpected(name, index, "integer", other)),
    }
}

/// Accepts strings and integers, rendering integers in decimal.
fn address_argument(name: &str, args: &[Value], index: usize) -> AtCodecResult<String> {
    match argument(name, args, index)? {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(unexpected(name, index, "string or integer", other)),
    }
}

fn optional_time(name: &str, args: &[Value], index: usize) -> AtCodecResult<Option<NaiveDateTime>> {
    match args.get(index) {
        None => Ok(None),
        Some(Value::Str(s)) => Ok(parse_time(s)),
        Some(other) => Err(unexpected(name, index, "string", other)),
    }
}

fn parse_read(name: &str, args: &[Value], body: &str) -> AtCodecResult<Packet> {
    if argument(name, args, 1)?.is_empty_str() {
        return Ok(Packet::Message(Message {
            body: body.to_string(),
            ..Message::default()
        }));
    }
    Ok(Packet::Message(Message {
        index: None,
        status: string_argument(name, args, 0)?,
        telephone: address_argument(name, args, 1)?,
        timestamp: optional_time(name, args, 3)?,
        body: body.to_string(),
        last: false,
    }))
}

fn parse_list_entry(status: &str, name: &str, args: &[Value], body: &str) -> AtCodecResult<Packet> {
    Ok(Packet::Message(Message {
        index: Some(integer_argument(name, args, 0)?),
        status: string_argument(name, args, 1)?,
        telephone: address_argument(name, args, 2)?,
        timestamp: optional_time(name, args, 4)?,
        body: body.to_string(),
        last: !status.is_empty(),
    }))
}

fn group_strings(group: &Value) -> Vec<String> {
    match group {
        Value::List(values) => values.iter().map(|value| value.to_string()).collect(),
        other => vec![other.to_string()],
    }
}

fn parse_storage(name: &str, text: &str, args: Vec<Value>) -> AtCodecResult<Packet> {
    if text.starts_with('(') {
        let groups = args
            .iter()
            .filter(|value| matches!(value, Value::List(_)))
            .count();
        if groups != 3 || args.len() != 3 {
            return Err(AtCodecError::schema(
                name,
                SchemaErrorKind::MalformedGroups {
                    expected: 3,
                    found: groups,
                },
            ));
        }
        return Ok(Packet::StorageAreas(StorageAreas {
            read: group_strings(&args[0]),
            write: group_strings(&args[1]),
            receive: group_strings(&args[2]),
        }));
    }

    let mut counts: Vec<i64> = args.iter().filter_map(Value::as_int).collect();
    match counts.len() {
        4 => counts.extend([0, 0]),
        6 => {}
        _ => {
            return Ok(Packet::Unknown {
                name: name.to_string(),
                args,
            });
        }
    }
    Ok(Packet::StorageInfo(StorageInfo {
        read_used: counts[0],
        read_total: counts[1],
        write_used: counts[2],
        write_total: counts[3],
        receive_used: counts[4],
        receive_total: counts[5],
    }))
}

/// Classifies one reply.
///
/// `status` is the terminal status line that ended the reply, or the empty
/// string for a listing entry flushed by the next entry's header. Returns
/// `Ok(None)` for headers that are recognized but deliberately suppressed.
pub fn parse_packet(status: &str, header: &str, body: &str) -> AtCodecResult<Option<Packet>> {
    let header = header.trim();
    if header.is_empty() {
        return Ok(Some(Packet::from_status(status)));
    }

    let Some((name, text)) = header.split_once(':') else {
        return Ok(Some(Packet::Unknown {
            name: header.to_string(),
            args: Vec::new(),
        }));
    };
    let name = name.trim();
    let text = text.trim();
    if name.is_empty() {
        return Ok(Some(Packet::from_status(status)));
    }

    let args = unquotes(text);
    let packet = match name {
        "+ZUSIMR" => return Ok(None),
        "+ZPASR" => Packet::ServiceStatus(string_argument(name, &args, 0)?),
        "+ZDONR" => Packet::NetworkStatus(string_argument(name, &args, 0)?),
        "+CMTI" => Packet::MessageNotification {
            storage: string_argument(name, &args, 0)?,
            index: integer_argument(name, &args, 1)?,
        },
        "+CSCA" => Packet::SmscAddress(args),
        "+CMGR" => parse_read(name, &args, body)?,
        "+CMGL" => parse_list_entry(status, name, &args, body)?,
        "+CPMS" => parse_storage(name, text, args)?,
        _ => Packet::Unknown {
            name: name.to_string(),
            args,
        },
    };
    Ok(Some(packet))
}
