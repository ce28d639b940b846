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

//! Modem configuration

use atmodem_codec::{DEFAULT_MAX_LINE_LENGTH, Encoding};
use std::time::Duration;

/// Modem configuration
#[derive(Debug, Clone)]
pub struct ModemConfig {
    /// Deadline for each command round trip
    pub response_timeout: Duration,

    /// Unsolicited notifications buffered before new ones are dropped
    pub notification_capacity: usize,

    /// Queued requests to the engine
    pub request_capacity: usize,

    /// Longest line accepted from the device; longer lines are dropped
    pub max_line_length: usize,

    /// Log every transport read, write, flush and shutdown
    pub trace_io: bool,

    /// Run the initialization sequence on open
    pub initialize: bool,

    /// Character set selected during initialization
    pub encoding: Encoding,

    /// `+CNMI` parameters: mode, mt, bm, ds, bfr
    pub notification_routing: [u8; 5],
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
            notification_capacity: 16,
            request_capacity: 8,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            trace_io: false,
            initialize: true,
            encoding: Encoding::Gsm,
            notification_routing: [2, 2, 0, 1, 0],
        }
    }
}

impl ModemConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the round trip deadline
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the notification buffer size
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity.max(1);
        self
    }

    /// Set the request queue size
    pub fn with_request_capacity(mut self, capacity: usize) -> Self {
        self.request_capacity = capacity.max(1);
        self
    }

    /// Set the maximum line length
    pub fn with_max_line_length(mut self, limit: usize) -> Self {
        self.max_line_length = limit;
        self
    }

    /// Enable transport tracing
    pub fn with_trace_io(mut self, enabled: bool) -> Self {
        self.trace_io = enabled;
        self
    }

    /// Enable or skip the initialization sequence
    pub fn with_initialize(mut self, enabled: bool) -> Self {
        self.initialize = enabled;
        self
    }

    /// Set the initial character set
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the `+CNMI` parameters
    pub fn with_notification_routing(mut self, routing: [u8; 5]) -> Self {
        self.notification_routing = routing;
        self
    }
}
