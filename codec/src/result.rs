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

/// Result Type for AT Codec Operations
pub type AtCodecResult<T> = Result<T, AtCodecError>;

/// Represents possible errors raised while framing, formatting, parsing or
/// transcoding AT command traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtCodecError {
    /// An I/O error occurred while reading from or writing to the underlying stream.
    ///
    /// Contains the error kind and a description of what operation failed.
    IOError {
        /// The kind of I/O error that occurred
        kind: std::io::ErrorKind,
        /// Description of the operation that failed
        operation: String,
    },

    /// A command argument has no AT wire representation.
    ///
    /// Only strings and integers can be rendered; grouped values are
    /// reply-only.
    UnsupportedArgument {
        /// Debug rendering of the rejected value
        value: String,
    },

    /// A reply header did not match the typed schema expected for its name.
    Schema {
        /// The reply header name, e.g. `+CMGL`
        header: String,
        /// Specific reason for the mismatch
        reason: SchemaErrorKind,
    },

    /// Text could not be decoded from its wire character set.
    Decoding {
        /// Description of the malformed input
        reason: String,
    },
}

/// Specific kinds of schema mismatches with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// A required argument was absent.
    MissingArgument {
        /// Zero-based argument position
        index: usize,
    },

    /// An argument had the wrong type.
    UnexpectedType {
        /// Zero-based argument position
        index: usize,
        /// Expected argument type
        expected: &'static str,
        /// Debug rendering of the argument actually received
        found: String,
    },

    /// The parenthesized group list of a range reply was malformed.
    MalformedGroups {
        /// Number of groups expected
        expected: usize,
        /// Number of groups found
        found: usize,
    },
}

impl AtCodecError {
    /// Shorthand for a [`AtCodecError::Schema`] error.
    pub fn schema(header: impl Into<String>, reason: SchemaErrorKind) -> Self {
        AtCodecError::Schema {
            header: header.into(),
            reason,
        }
    }
}

impl std::error::Error for AtCodecError {}

impl std::fmt::Display for AtCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtCodecError::IOError { kind, operation } => {
                write!(f, "I/O error during {}: {:?}", operation, kind)
            }
            AtCodecError::UnsupportedArgument { value } => {
                write!(f, "unsupported argument: {}", value)
            }
            AtCodecError::Schema { header, reason } => {
                write!(f, "unexpected {} reply: {}", header, reason)
            }
            AtCodecError::Decoding { reason } => {
                write!(f, "decoding failed: {}", reason)
            }
        }
    }
}

impl std::fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaErrorKind::MissingArgument { index } => {
                write!(f, "missing argument {}", index)
            }
            SchemaErrorKind::UnexpectedType {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "argument {} should be {} (found {})",
                    index, expected, found
                )
            }
            SchemaErrorKind::MalformedGroups { expected, found } => {
                write!(f, "expected {} groups, found {}", expected, found)
            }
        }
    }
}

impl From<std::io::Error> for AtCodecError {
    fn from(err: std::io::Error) -> Self {
        AtCodecError::IOError {
            kind: err.kind(),
            operation: err.to_string(),
        }
    }
}
