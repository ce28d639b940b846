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

//! Command line formatting.
//!
//! An AT command line is `AT` + mnemonic, followed by `=` and the comma joined
//! arguments when there are any, terminated by CR LF:
//!
//! ```text
//! AT+CMGS="+15551234"\r\n
//! AT+CPMS=?\r\n
//! AT+CSMP=49,167,0,8\r\n
//! ```

use crate::{AtCodecError, AtCodecResult, Value};
use regex::Regex;
use std::sync::LazyLock;

/// Line terminator appended to every transmitted command.
pub const COMMAND_TERMINATOR: &str = "\r\n";

/// Literal that selects the test/query form of a command. Never quoted.
pub const QUERY_MARKER: &str = "?";

/// Ctrl-Z, ends a message body written after the data prompt.
pub const BODY_TERMINATOR: char = '\u{1A}';

/// Renders a single argument.
///
/// Strings are double quoted, except the `?` query marker which passes through
/// verbatim. Integers render in decimal. Groups have no wire form and are
/// rejected with [`AtCodecError::UnsupportedArgument`].
pub fn quote(value: &Value) -> AtCodecResult<String> {
    match value {
        Value::Str(s) if s == QUERY_MARKER => Ok(s.clone()),
        Value::Str(s) => Ok(format!("\"{}\"", s)),
        Value::Int(i) => Ok(i.to_string()),
        Value::List(_) => Err(AtCodecError::UnsupportedArgument {
            value: format!("{:?}", value),
        }),
    }
}

/// Renders an argument list as the comma joined quoted arguments.
pub fn quotes(values: &[Value]) -> AtCodecResult<String> {
    let quoted = values.iter().map(quote).collect::<AtCodecResult<Vec<_>>>()?;
    Ok(quoted.join(","))
}

/// Renders the complete wire line for `name` and `args`, including CR LF.
pub fn format_command(name: &str, args: &[Value]) -> AtCodecResult<String> {
    let mut line = String::with_capacity(name.len() + 16);
    line.push_str("AT");
    line.push_str(name);
    if !args.is_empty() {
        line.push('=');
        line.push_str(&quotes(args)?);
    }
    line.push_str(COMMAND_TERMINATOR);
    Ok(line)
}

static REPLY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AT(\+[A-Z]+)").expect("reply prefix pattern is valid"));

/// Returns the `+XXXX` reply prefix a command line will be answered with.
///
/// This is the first capture of `AT(\+[A-Z]+)` in `line`.
pub fn reply_prefix(line: &str) -> Option<&str> {
    REPLY_PREFIX
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|prefix| prefix.as_str())
}

/// An AT command: mnemonic plus ordered, typed arguments.
///
/// The mnemonic is everything after `AT`, e.g. `+CMGR`, `Z`, `+CSCA?` or the
/// empty string for the bare `AT` attention command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Value>,
}

impl Command {
    /// Creates a command without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Command {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates the query form `AT<name>=?`.
    pub fn query(name: impl Into<String>) -> Self {
        Command::new(name).arg(QUERY_MARKER)
    }

    /// Appends an argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// The mnemonic.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The arguments in order.
    pub fn arguments(&self) -> &[Value] {
        &self.args
    }

    /// Renders the wire line, including the CR LF terminator.
    pub fn to_line(&self) -> AtCodecResult<String> {
        format_command(&self.name, &self.args)
    }
}
