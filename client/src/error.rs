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

//! Modem error types

use atmodem_codec::AtCodecError;
use std::time::Duration;
use thiserror::Error;

/// Result type for modem operations
pub type Result<T> = std::result::Result<T, ModemError>;

/// Modem error types
#[derive(Debug, Error)]
pub enum ModemError {
    /// The transport failed while reading or writing.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The device answered with an error status. Carries the raw status line.
    #[error("Device error: {0}")]
    Device(String),

    /// The device answered with something the caller cannot use.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A command argument has no AT representation.
    #[error("Unsupported argument: {0}")]
    UnsupportedArgument(String),

    /// No terminal reply arrived within the deadline.
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    /// The engine has stopped.
    #[error("Modem closed")]
    Closed,
}

impl ModemError {
    /// Check if the device rejected the command
    pub fn is_device_error(&self) -> bool {
        matches!(self, ModemError::Device(_))
    }

    /// Check if the error came from the transport or a stopped engine
    pub fn is_transport_error(&self) -> bool {
        matches!(self, ModemError::Transport(_) | ModemError::Closed)
    }

    /// Check if the error is recoverable
    ///
    /// Recoverable errors leave the engine running, so the next command may
    /// succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ModemError::Device(_)
                | ModemError::Protocol(_)
                | ModemError::UnsupportedArgument(_)
                | ModemError::Timeout(_)
        )
    }
}

impl From<AtCodecError> for ModemError {
    fn from(error: AtCodecError) -> Self {
        match error {
            AtCodecError::UnsupportedArgument { value } => ModemError::UnsupportedArgument(value),
            AtCodecError::IOError { kind, operation } => {
                ModemError::Transport(std::io::Error::new(kind, operation))
            }
            other => ModemError::Protocol(other.to_string()),
        }
    }
}
